//! Order-1 contextual model.
//!
//! 256 independent adaptive order-0 tables, one per possible preceding
//! byte. The previously coded symbol selects the active table; update
//! and conversion logic is otherwise identical to the order-0 case.

use crate::bitio::{BitReader, BitWriter};
use crate::coder::{ArithmeticDecoder, ArithmeticEncoder};
use crate::error::Result;
use crate::order0::AdaptiveModel;

/// Index of the end-of-stream symbol.
const END_OF_STREAM: usize = 256;

/// One adaptive table per preceding byte value.
pub struct Order1Model {
    contexts: Vec<AdaptiveModel>,
}

impl Order1Model {
    /// Create 256 fresh tables; the starting context is byte 0.
    pub fn new() -> Self {
        Self {
            contexts: vec![AdaptiveModel::new(); 256],
        }
    }

    /// The table selected by the previous symbol.
    pub fn context(&self, prev: usize) -> &AdaptiveModel {
        &self.contexts[prev]
    }

    /// Mutable access to the table selected by the previous symbol.
    pub fn context_mut(&mut self, prev: usize) -> &mut AdaptiveModel {
        &mut self.contexts[prev]
    }
}

impl Default for Order1Model {
    fn default() -> Self {
        Self::new()
    }
}

/// Compress `input` with the order-1 model.
pub fn compress(input: &[u8]) -> Result<Vec<u8>> {
    let mut model = Order1Model::new();
    let mut writer = BitWriter::new(Vec::new());
    let mut encoder = ArithmeticEncoder::new();

    let mut context = 0usize;
    for &b in input {
        let c = b as usize;
        encoder.encode(model.context(context).interval(c), &mut writer)?;
        model.context_mut(context).update(c);
        context = c;
    }
    encoder.encode(model.context(context).interval(END_OF_STREAM), &mut writer)?;
    encoder.flush(&mut writer)?;
    writer.finish()
}

/// Expand an order-1 compressed stream.
pub fn expand(data: &[u8]) -> Result<Vec<u8>> {
    let mut model = Order1Model::new();
    let mut reader = BitReader::new(data);
    let mut decoder = ArithmeticDecoder::new(&mut reader)?;

    let mut out = Vec::new();
    let mut context = 0usize;
    loop {
        let count = decoder.current_count(model.context(context).scale());
        let c = model.context(context).decode_symbol(count);
        decoder.remove(model.context(context).interval(c), &mut reader)?;
        if c == END_OF_STREAM {
            break;
        }
        out.push(c as u8);
        model.context_mut(context).update(c);
        context = c;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_input_roundtrip() {
        let data = compress(&[]).unwrap();
        assert_eq!(expand(&data).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_all_byte_values_roundtrip() {
        let input: Vec<u8> = (0..=255).collect();
        let data = compress(&input).unwrap();
        assert_eq!(expand(&data).unwrap(), input);
    }

    #[test]
    fn test_correlated_text_beats_order0() {
        let input: Vec<u8> = b"abcabcabcabc".iter().copied().cycle().take(3000).collect();
        let order1 = compress(&input).unwrap();
        let order0 = crate::order0::compress(&input, crate::order0::Strategy::Adaptive).unwrap();
        assert!(order1.len() < order0.len());
    }

    proptest! {
        #[test]
        fn prop_order1_roundtrip(input in prop::collection::vec(any::<u8>(), 0..2048)) {
            let data = compress(&input).unwrap();
            prop_assert_eq!(&expand(&data).unwrap(), &input);
        }
    }
}
