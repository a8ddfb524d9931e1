//! # Adaptive Arithmetic Coding
//!
//! *Entropy coding at the Shannon limit with models that learn as they go.*
//!
//! ## Intuition First
//!
//! Imagine narrowing in on a number between 0 and 1. Every symbol you
//! code slices the current interval into sub-intervals, one per
//! possible symbol, each sized by that symbol's probability. Coding a
//! symbol means keeping its slice and discarding the rest. Likely
//! symbols barely shrink the interval (cheap, a fraction of a bit);
//! rare ones shrink it a lot (expensive, many bits). The final interval
//! identifies the whole message.
//!
//! Fixed-point hardware can't hold an ever-narrowing real number, so
//! the coder keeps only a 16-bit window onto it: bits that both ends of
//! the interval agree on are emitted and shifted out, and intervals
//! that straddle the midpoint defer their bit until the tie breaks (the
//! *underflow* mechanism).
//!
//! ## The Problem
//!
//! A coder is only as good as its probability estimates. This crate
//! pairs the one coding engine with models of increasing ambition:
//!
//! - **Order-0**: one frequency table for the whole stream, either
//!   frozen from a first pass or adapted on the fly.
//! - **Order-1**: a table per preceding byte.
//! - **Order-N (PPM)**: a trie of contexts up to N bytes deep, with an
//!   *escape* symbol that retreats to shorter contexts for bytes the
//!   long context has never seen.
//!
//! ## Historical Context
//!
//! ```text
//! 1948  Shannon         Entropy as the fundamental limit
//! 1976  Pasco/Rissanen  Arithmetic coding made practical
//! 1979  Rubin           Carry control in finite registers
//! 1984  Cleary/Witten   PPM: prediction by partial matching
//! 1987  Witten/Neal/Cleary  The CACM coder this engine descends from
//! 1990  Moffat          PPMC and the escape-estimation question
//! ```
//!
//! ## Mathematical Formulation
//!
//! Coding symbol $s$ with cumulative range $[\mathrm{lo}_s,
//! \mathrm{hi}_s)$ out of a total $T$ maps the register interval
//! $[L, H]$ to
//!
//! ```text
//! H' = L + range * hi_s / T - 1
//! L' = L + range * lo_s / T        where range = H - L + 1
//! ```
//!
//! with truncating division, costing $-\log_2((\mathrm{hi}_s -
//! \mathrm{lo}_s)/T)$ bits. Totals are capped at $2^{14} - 1$ so the
//! 16-bit register products fit in 32 bits.
//!
//! ## Complexity Analysis
//!
//! - **Time**: $O(k)$ per symbol where $k$ is the active table size
//!   (escape cascades visit at most `order + 2` tables).
//! - **Space**: order-0/1 are fixed tables; the PPM trie grows with the
//!   number of distinct contexts observed, bounded by rescaling, never
//!   freed within a session.
//!
//! ## Failure Modes
//!
//! 1. **Silent desynchronization**: one flipped bit in the stream and
//!    every later byte decodes to garbage; the format carries no
//!    redundancy to detect it.
//! 2. **Model mismatch**: compressor and expander must agree on the
//!    variant and order; there is no header to catch a mismatch.
//!
//! ## Implementation Notes
//!
//! Each variant couples the shared [`coder`] engine with its model and
//! exposes slice-in, bytes-out `compress`/`expand` drivers. The PPM
//! model additionally codes FLUSH/DONE control symbols in-band: DONE
//! terminates (no length field anywhere), FLUSH halves the whole model
//! when a periodic ratio check shows it has gone stale.
//!
//! ## References
//!
//! - Witten, I., Neal, R., Cleary, J. (1987). "Arithmetic Coding for
//!   Data Compression." CACM 30(6).
//! - Cleary, J., Witten, I. (1984). "Data Compression Using Adaptive
//!   Coding and Partial String Matching." IEEE Trans. Comm. 32(4).
//! - Moffat, A. (1990). "Implementing the PPM Data Compression
//!   Scheme." IEEE Trans. Comm. 38(11).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bitio;
pub mod coder;
pub mod error;
pub mod order0;
pub mod order1;
pub mod ppm;

pub use bitio::{BitReader, BitWriter};
pub use coder::{ArithmeticDecoder, ArithmeticEncoder, Interval, MAX_SCALE};
pub use error::Error;
pub use order0::Strategy;
pub use ppm::ContextTrie;
