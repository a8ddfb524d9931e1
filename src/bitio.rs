//! MSB-first bit-level I/O over byte streams.
//!
//! The arithmetic coder produces and consumes individual bits; this
//! module packs them into bytes, most significant bit first, on top of
//! any [`std::io::Write`] / [`std::io::Read`] pair.

use std::io::{Read, Write};

use crate::error::{Error, Result};

/// Accumulates bits MSB-first and writes completed bytes to the inner
/// writer.
pub struct BitWriter<W: Write> {
    inner: W,
    rack: u8,
    mask: u8,
    bytes_written: u64,
}

impl<W: Write> BitWriter<W> {
    /// Create a writer that packs bits into `inner`.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            rack: 0,
            mask: 0x80,
            bytes_written: 0,
        }
    }

    /// Append a single bit.
    pub fn output_bit(&mut self, bit: bool) -> Result<()> {
        if bit {
            self.rack |= self.mask;
        }
        self.mask >>= 1;
        if self.mask == 0 {
            self.inner.write_all(&[self.rack])?;
            self.bytes_written += 1;
            self.rack = 0;
            self.mask = 0x80;
        }
        Ok(())
    }

    /// Append the low `count` bits of `code`, most significant first.
    /// A zero `count` appends nothing.
    pub fn output_bits(&mut self, code: u32, count: u32) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let mut probe = 1u32 << (count - 1);
        while probe != 0 {
            self.output_bit(code & probe != 0)?;
            probe >>= 1;
        }
        Ok(())
    }

    /// Number of whole bytes flushed to the inner writer so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Pad the trailing partial byte with zero bits, flush, and return
    /// the inner writer.
    pub fn finish(mut self) -> Result<W> {
        if self.mask != 0x80 {
            self.inner.write_all(&[self.rack])?;
        }
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Unpacks bits MSB-first from the inner reader.
///
/// Running out of bytes mid-read is fatal: a truncated stream cannot be
/// decoded.
pub struct BitReader<R: Read> {
    inner: R,
    rack: u8,
    mask: u8,
}

impl<R: Read> BitReader<R> {
    /// Create a reader that unpacks bits from `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            rack: 0,
            mask: 0x80,
        }
    }

    fn next_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        match self.inner.read_exact(&mut buf) {
            Ok(()) => Ok(buf[0]),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(Error::UnexpectedEof),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Read a single bit.
    pub fn input_bit(&mut self) -> Result<bool> {
        if self.mask == 0x80 {
            self.rack = self.next_byte()?;
        }
        let bit = self.rack & self.mask != 0;
        self.mask >>= 1;
        if self.mask == 0 {
            self.mask = 0x80;
        }
        Ok(bit)
    }

    /// Read `count` bits, most significant first. A zero `count` reads
    /// nothing and returns 0.
    pub fn input_bits(&mut self, count: u32) -> Result<u32> {
        if count == 0 {
            return Ok(0);
        }
        let mut probe = 1u32 << (count - 1);
        let mut value = 0u32;
        while probe != 0 {
            if self.input_bit()? {
                value |= probe;
            }
            probe >>= 1;
        }
        Ok(value)
    }
}
