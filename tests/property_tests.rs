use arith::order0::{self, Strategy};
use arith::{order1, ppm};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_every_variant_roundtrips(input in prop::collection::vec(any::<u8>(), 0..2048)) {
        for strategy in [Strategy::Adaptive, Strategy::Static] {
            let data = order0::compress(&input, strategy).unwrap();
            prop_assert_eq!(&order0::expand(&data, strategy).unwrap(), &input);
        }

        let data = order1::compress(&input).unwrap();
        prop_assert_eq!(&order1::expand(&data).unwrap(), &input);

        for order in 0..=3 {
            let data = ppm::compress(&input, order).unwrap();
            prop_assert_eq!(&ppm::expand(&data, order).unwrap(), &input);
        }
    }

    #[test]
    fn prop_ascii_text_roundtrips_and_shrinks(
        input in "[a-z ]{512,2048}",
    ) {
        let bytes = input.as_bytes();
        for order in 1..=3 {
            let data = ppm::compress(bytes, order).unwrap();
            prop_assert_eq!(&ppm::expand(&data, order).unwrap(), &bytes.to_vec());
            // 27-symbol text always fits under 8 bits per byte.
            prop_assert!(data.len() < bytes.len());
        }
    }
}
