//! The 16-bit arithmetic (range) coding engine.
//!
//! Encoding narrows a fixed-point interval `[low, high]` once per
//! symbol and emits bits as the top bits of the two registers settle.
//! When the interval straddles the midpoint without settling, bit
//! emission is deferred and the pending count is tracked in
//! `underflow_bits`. Decoding mirrors the exact same register
//! trajectory, feeding a `code` register one bit per renormalization
//! step.
//!
//! The coder itself has no error states: callers must keep every
//! [`Interval`] within the [`MAX_SCALE`] bound so the 16-bit register
//! arithmetic cannot overflow.

use std::io::{Read, Write};

use crate::bitio::{BitReader, BitWriter};
use crate::error::Result;

/// Maximum allowed cumulative frequency (14-bit bound).
pub const MAX_SCALE: u16 = 16383;

/// A symbol's probability range out of a cumulative total.
///
/// Invariant: `low_count < high_count <= scale <= MAX_SCALE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    /// Cumulative count below this symbol.
    pub low_count: u16,
    /// Cumulative count including this symbol.
    pub high_count: u16,
    /// Cumulative total for the whole table.
    pub scale: u16,
}

/// Arithmetic encoder state.
pub struct ArithmeticEncoder {
    low: u16,
    high: u16,
    underflow_bits: u64,
}

impl ArithmeticEncoder {
    /// Create an encoder with a full-width starting interval.
    pub fn new() -> Self {
        Self {
            low: 0,
            high: 0xFFFF,
            underflow_bits: 0,
        }
    }

    /// Narrow the interval by one symbol and emit any settled bits.
    pub fn encode<W: Write>(&mut self, interval: Interval, out: &mut BitWriter<W>) -> Result<()> {
        let range = u32::from(self.high - self.low) + 1;
        self.high = self
            .low
            .wrapping_add((range * u32::from(interval.high_count) / u32::from(interval.scale) - 1) as u16);
        self.low = self
            .low
            .wrapping_add((range * u32::from(interval.low_count) / u32::from(interval.scale)) as u16);

        loop {
            if (self.high ^ self.low) & 0x8000 == 0 {
                out.output_bit(self.high & 0x8000 != 0)?;
                while self.underflow_bits > 0 {
                    out.output_bit(self.high & 0x8000 == 0)?;
                    self.underflow_bits -= 1;
                }
            } else if self.low & 0x4000 != 0 && self.high & 0x4000 == 0 {
                // Interval straddles the midpoint; defer the bit.
                self.underflow_bits += 1;
                self.low &= 0x3FFF;
                self.high |= 0x4000;
            } else {
                return Ok(());
            }
            self.low <<= 1;
            self.high = (self.high << 1) | 1;
        }
    }

    /// Terminate the stream.
    ///
    /// Emits `low`'s bit 14, then `underflow_bits + 1` complemented
    /// copies, pinning the code value inside the final interval. The 16
    /// trailing zero bits keep the decoder's preloaded register fed
    /// through its last renormalizations.
    pub fn flush<W: Write>(mut self, out: &mut BitWriter<W>) -> Result<()> {
        out.output_bit(self.low & 0x4000 != 0)?;
        self.underflow_bits += 1;
        while self.underflow_bits > 0 {
            out.output_bit(self.low & 0x4000 == 0)?;
            self.underflow_bits -= 1;
        }
        out.output_bits(0, 16)
    }
}

impl Default for ArithmeticEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Arithmetic decoder state.
pub struct ArithmeticDecoder {
    code: u16,
    low: u16,
    high: u16,
}

impl ArithmeticDecoder {
    /// Create a decoder, preloading 16 bits into the code register.
    pub fn new<R: Read>(input: &mut BitReader<R>) -> Result<Self> {
        let code = input.input_bits(16)? as u16;
        Ok(Self {
            code,
            low: 0,
            high: 0xFFFF,
        })
    }

    /// Map the code register back to a cumulative count under `scale`.
    ///
    /// The caller locates the symbol whose interval contains the count,
    /// then calls [`remove`](Self::remove) with that interval.
    pub fn current_count(&self, scale: u16) -> u16 {
        let range = u32::from(self.high - self.low) + 1;
        (((u32::from(self.code - self.low) + 1) * u32::from(scale) - 1) / range) as u16
    }

    /// Narrow the interval by the decoded symbol, mirroring the
    /// encoder's renormalization bit for bit.
    pub fn remove<R: Read>(&mut self, interval: Interval, input: &mut BitReader<R>) -> Result<()> {
        let range = u32::from(self.high - self.low) + 1;
        self.high = self
            .low
            .wrapping_add((range * u32::from(interval.high_count) / u32::from(interval.scale) - 1) as u16);
        self.low = self
            .low
            .wrapping_add((range * u32::from(interval.low_count) / u32::from(interval.scale)) as u16);

        loop {
            if (self.high ^ self.low) & 0x8000 == 0 {
                // Settled bits shift out below; nothing else to do.
            } else if self.low & 0x4000 != 0 && self.high & 0x4000 == 0 {
                self.code ^= 0x4000;
                self.low &= 0x3FFF;
                self.high |= 0x4000;
            } else {
                return Ok(());
            }
            self.low <<= 1;
            self.high = (self.high << 1) | 1;
            self.code = (self.code << 1) | u16::from(input.input_bit()?);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Fixed three-symbol model: counts 2, 1, 1 out of 4.
    const MODEL: [Interval; 3] = [
        Interval { low_count: 0, high_count: 2, scale: 4 },
        Interval { low_count: 2, high_count: 3, scale: 4 },
        Interval { low_count: 3, high_count: 4, scale: 4 },
    ];

    fn decode_with_fixed_model(data: &[u8], n: usize) -> Vec<usize> {
        let mut reader = BitReader::new(data);
        let mut decoder = ArithmeticDecoder::new(&mut reader).unwrap();
        let mut out = Vec::new();
        for _ in 0..n {
            let count = decoder.current_count(4);
            let idx = MODEL.iter().position(|m| count < m.high_count).unwrap();
            out.push(idx);
            decoder.remove(MODEL[idx], &mut reader).unwrap();
        }
        out
    }

    #[test]
    fn test_fixed_model_roundtrip() {
        let input = [0usize, 1, 2, 0, 0, 2, 1, 0, 1, 1, 2, 0];
        let mut writer = BitWriter::new(Vec::new());
        let mut encoder = ArithmeticEncoder::new();
        for &idx in &input {
            encoder.encode(MODEL[idx], &mut writer).unwrap();
        }
        encoder.flush(&mut writer).unwrap();
        let data = writer.finish().unwrap();

        assert_eq!(decode_with_fixed_model(&data, input.len()), input);
    }

    #[test]
    fn test_skewed_model_forces_underflow() {
        // A near-half split keeps the interval straddling the midpoint,
        // exercising the deferred-bit path.
        let skewed = [
            Interval { low_count: 0, high_count: 8191, scale: 16383 },
            Interval { low_count: 8191, high_count: 16383, scale: 16383 },
        ];
        let input: Vec<usize> = (0..64).map(|i| i % 2).collect();

        let mut writer = BitWriter::new(Vec::new());
        let mut encoder = ArithmeticEncoder::new();
        for &idx in &input {
            encoder.encode(skewed[idx], &mut writer).unwrap();
        }
        encoder.flush(&mut writer).unwrap();
        let data = writer.finish().unwrap();

        let mut reader = BitReader::new(data.as_slice());
        let mut decoder = ArithmeticDecoder::new(&mut reader).unwrap();
        for &expected in &input {
            let count = decoder.current_count(16383);
            let idx = usize::from(count >= 8191);
            assert_eq!(idx, expected);
            decoder.remove(skewed[idx], &mut reader).unwrap();
        }
    }
}
