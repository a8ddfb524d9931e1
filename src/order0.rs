//! Order-0 models: adaptive one-pass and static two-pass.
//!
//! Both strategies drive the same coding loop through one cumulative
//! table contract, so the arithmetic coder never knows which model is
//! behind it. The alphabet is the 256 byte values plus an
//! `END_OF_STREAM` symbol; no length field is ever written.

use std::io::{Read, Write};

use crate::bitio::{BitReader, BitWriter};
use crate::coder::{ArithmeticDecoder, ArithmeticEncoder, Interval, MAX_SCALE};
use crate::error::Result;

/// Index of the end-of-stream symbol.
const END_OF_STREAM: usize = 256;
/// Alphabet size plus the cumulative-table sentinel slots.
const TABLE_SIZE: usize = END_OF_STREAM + 2;

/// Which order-0 model backs the stream.
///
/// Chosen at stream-open time; compressor and expander must agree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// One-pass model: every symbol starts at count 1 and adapts as the
    /// stream is coded. No table header is written.
    Adaptive,
    /// Two-pass model: scan the input to build a scaled count table,
    /// serialize it as a stream header, code with frozen counts.
    Static,
}

/// Adaptive order-0 cumulative count table.
///
/// `totals[c]` is the cumulative count below symbol `c`; the scale
/// lives in the last slot. Counts start at 1 (Laplace smoothing) so
/// every symbol, including `END_OF_STREAM`, is always codable.
#[derive(Clone, Debug)]
pub struct AdaptiveModel {
    totals: [u16; TABLE_SIZE],
}

impl AdaptiveModel {
    /// Create a table with every symbol at count 1.
    pub fn new() -> Self {
        let mut totals = [0u16; TABLE_SIZE];
        for (i, t) in totals.iter_mut().enumerate() {
            *t = i as u16;
        }
        Self { totals }
    }

    /// The interval assigned to `symbol`.
    pub fn interval(&self, symbol: usize) -> Interval {
        Interval {
            low_count: self.totals[symbol],
            high_count: self.totals[symbol + 1],
            scale: self.totals[END_OF_STREAM + 1],
        }
    }

    /// Current cumulative total.
    pub fn scale(&self) -> u16 {
        self.totals[END_OF_STREAM + 1]
    }

    /// Find the symbol whose interval contains `count`.
    pub fn decode_symbol(&self, count: u16) -> usize {
        let mut c = 0;
        while count >= self.totals[c + 1] {
            c += 1;
        }
        c
    }

    /// Bump `symbol`'s count, halving the whole table once the total
    /// reaches the coder's 14-bit bound. Halving floors at 1 so no
    /// symbol ever becomes uncodable.
    pub fn update(&mut self, symbol: usize) {
        for i in symbol + 1..TABLE_SIZE {
            self.totals[i] += 1;
        }
        if self.totals[END_OF_STREAM + 1] < MAX_SCALE {
            return;
        }
        for i in 1..TABLE_SIZE {
            self.totals[i] /= 2;
            if self.totals[i] <= self.totals[i - 1] {
                self.totals[i] = self.totals[i - 1] + 1;
            }
        }
    }
}

impl Default for AdaptiveModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Static order-0 table built from a whole-input scan.
#[derive(Clone, Debug)]
pub struct StaticModel {
    scaled: [u8; 256],
    totals: [u16; TABLE_SIZE],
}

impl StaticModel {
    /// Count every byte of `input` and scale the counts into the
    /// serializable one-byte-per-symbol form.
    pub fn build(input: &[u8]) -> Self {
        let mut counts = [0u64; 256];
        for &b in input {
            counts[b as usize] += 1;
        }
        let scaled = scale_counts(&counts);
        Self {
            scaled,
            totals: build_totals(&scaled),
        }
    }

    /// Serialize the scaled table as `(first, last, value...)` runs,
    /// terminated by a zero `first` byte. Runs of up to three zero
    /// counts are cheaper to carry inline than to break and restart.
    pub fn write_table<W: Write>(&self, out: &mut BitWriter<W>) -> Result<()> {
        let mut first = 0usize;
        while first < 255 && self.scaled[first] == 0 {
            first += 1;
        }
        while first < 256 {
            let mut last = first + 1;
            let next = loop {
                while last < 256 && self.scaled[last] != 0 {
                    last += 1;
                }
                last -= 1;
                let mut next = last + 1;
                while next < 256 && self.scaled[next] == 0 {
                    next += 1;
                }
                if next > 255 || next - last > 3 {
                    break next;
                }
                last = next;
            };
            out.output_bits(first as u32, 8)?;
            out.output_bits(last as u32, 8)?;
            for i in first..=last {
                out.output_bits(u32::from(self.scaled[i]), 8)?;
            }
            first = next;
        }
        out.output_bits(0, 8)
    }

    /// Rebuild a table from a serialized header.
    pub fn read_table<R: Read>(input: &mut BitReader<R>) -> Result<Self> {
        let mut scaled = [0u8; 256];
        let mut first = input.input_bits(8)? as usize;
        let mut last = input.input_bits(8)? as usize;
        loop {
            for slot in scaled.iter_mut().take(last + 1).skip(first) {
                *slot = input.input_bits(8)? as u8;
            }
            first = input.input_bits(8)? as usize;
            if first == 0 {
                break;
            }
            last = input.input_bits(8)? as usize;
        }
        Ok(Self {
            scaled,
            totals: build_totals(&scaled),
        })
    }

    /// The interval assigned to `symbol`.
    pub fn interval(&self, symbol: usize) -> Interval {
        Interval {
            low_count: self.totals[symbol],
            high_count: self.totals[symbol + 1],
            scale: self.totals[END_OF_STREAM + 1],
        }
    }

    /// Cumulative total of the frozen table.
    pub fn scale(&self) -> u16 {
        self.totals[END_OF_STREAM + 1]
    }

    /// Find the symbol whose interval contains `count`.
    pub fn decode_symbol(&self, count: u16) -> usize {
        let mut c = END_OF_STREAM;
        while count < self.totals[c] {
            c -= 1;
        }
        c
    }
}

/// Scale raw counts into one byte each via `ceil(max / 256)`, clamping
/// surviving symbols up to 1, then halve or quarter everything if the
/// total still exceeds the representable bound.
///
/// The second pass can round a rare symbol back down to zero; the
/// serialized format keeps that approximation, so such a byte is no
/// longer codable by the frozen table.
fn scale_counts(counts: &[u64; 256]) -> [u8; 256] {
    let max = counts.iter().copied().max().unwrap_or(0);
    let divisor = max.div_ceil(256).max(1);

    let mut scaled = [0u8; 256];
    for (s, &c) in scaled.iter_mut().zip(counts.iter()) {
        *s = (c / divisor) as u8;
        if *s == 0 && c != 0 {
            *s = 1;
        }
    }

    let total: u32 = 1 + scaled.iter().map(|&s| u32::from(s)).sum::<u32>();
    let shrink = if total > 32767 - 256 {
        4
    } else if total > u32::from(MAX_SCALE) {
        2
    } else {
        return scaled;
    };
    for s in &mut scaled {
        *s /= shrink;
    }
    scaled
}

fn build_totals(scaled: &[u8; 256]) -> [u16; TABLE_SIZE] {
    let mut totals = [0u16; TABLE_SIZE];
    for i in 0..END_OF_STREAM {
        totals[i + 1] = totals[i] + u16::from(scaled[i]);
    }
    totals[END_OF_STREAM + 1] = totals[END_OF_STREAM] + 1;
    totals
}

enum Model {
    Adaptive(AdaptiveModel),
    Static(StaticModel),
}

impl Model {
    fn interval(&self, symbol: usize) -> Interval {
        match self {
            Model::Adaptive(m) => m.interval(symbol),
            Model::Static(m) => m.interval(symbol),
        }
    }

    fn scale(&self) -> u16 {
        match self {
            Model::Adaptive(m) => m.scale(),
            Model::Static(m) => m.scale(),
        }
    }

    fn decode_symbol(&self, count: u16) -> usize {
        match self {
            Model::Adaptive(m) => m.decode_symbol(count),
            Model::Static(m) => m.decode_symbol(count),
        }
    }

    fn update(&mut self, symbol: usize) {
        if let Model::Adaptive(m) = self {
            m.update(symbol);
        }
    }
}

/// Compress `input` with an order-0 model.
pub fn compress(input: &[u8], strategy: Strategy) -> Result<Vec<u8>> {
    let mut writer = BitWriter::new(Vec::new());
    let mut model = match strategy {
        Strategy::Adaptive => Model::Adaptive(AdaptiveModel::new()),
        Strategy::Static => {
            let m = StaticModel::build(input);
            m.write_table(&mut writer)?;
            Model::Static(m)
        }
    };

    let mut encoder = ArithmeticEncoder::new();
    for &b in input {
        let c = b as usize;
        encoder.encode(model.interval(c), &mut writer)?;
        model.update(c);
    }
    encoder.encode(model.interval(END_OF_STREAM), &mut writer)?;
    encoder.flush(&mut writer)?;
    writer.finish()
}

/// Expand an order-0 compressed stream.
pub fn expand(data: &[u8], strategy: Strategy) -> Result<Vec<u8>> {
    let mut reader = BitReader::new(data);
    let mut model = match strategy {
        Strategy::Adaptive => Model::Adaptive(AdaptiveModel::new()),
        Strategy::Static => Model::Static(StaticModel::read_table(&mut reader)?),
    };

    let mut decoder = ArithmeticDecoder::new(&mut reader)?;
    let mut out = Vec::new();
    loop {
        let count = decoder.current_count(model.scale());
        let c = model.decode_symbol(count);
        decoder.remove(model.interval(c), &mut reader)?;
        if c == END_OF_STREAM {
            break;
        }
        out.push(c as u8);
        model.update(c);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // Both globs export a `Strategy`; the explicit import resolves the
    // enum over proptest's trait.
    use super::Strategy;

    #[test]
    fn test_empty_input_roundtrip() {
        for strategy in [Strategy::Adaptive, Strategy::Static] {
            let data = compress(&[], strategy).unwrap();
            assert_eq!(expand(&data, strategy).unwrap(), Vec::<u8>::new());
        }
    }

    #[test]
    fn test_all_byte_values_roundtrip() {
        let input: Vec<u8> = (0..=255).collect();
        for strategy in [Strategy::Adaptive, Strategy::Static] {
            let data = compress(&input, strategy).unwrap();
            assert_eq!(expand(&data, strategy).unwrap(), input);
        }
    }

    #[test]
    fn test_static_table_survives_serialization() {
        let input = b"the quick brown fox jumps over the lazy dog";
        let model = StaticModel::build(input);

        let mut writer = BitWriter::new(Vec::new());
        model.write_table(&mut writer).unwrap();
        let bytes = writer.finish().unwrap();

        let mut reader = BitReader::new(bytes.as_slice());
        let rebuilt = StaticModel::read_table(&mut reader).unwrap();
        assert_eq!(rebuilt.scaled, model.scaled);
        assert_eq!(rebuilt.totals, model.totals);
    }

    #[test]
    fn test_adaptive_rescale_keeps_floor_of_one() {
        let mut model = AdaptiveModel::new();
        for _ in 0..20_000 {
            model.update(b'a' as usize);
        }
        for c in 0..=END_OF_STREAM {
            let iv = model.interval(c);
            assert!(iv.low_count < iv.high_count, "symbol {c} lost its slot");
        }
        assert!(model.scale() <= MAX_SCALE);
    }

    #[test]
    fn test_truncated_stream_reports_eof() {
        let data = compress(b"hello hello hello", Strategy::Adaptive).unwrap();
        assert!(matches!(
            expand(&data[..1], Strategy::Adaptive),
            Err(crate::error::Error::UnexpectedEof)
        ));
    }

    proptest! {
        #[test]
        fn prop_order0_roundtrip(input in prop::collection::vec(any::<u8>(), 0..2048)) {
            for strategy in [Strategy::Adaptive, Strategy::Static] {
                let data = compress(&input, strategy).unwrap();
                prop_assert_eq!(&expand(&data, strategy).unwrap(), &input);
            }
        }
    }
}
