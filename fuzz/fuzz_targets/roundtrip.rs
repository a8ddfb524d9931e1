#![no_main]
use arith::order0::{self, Strategy};
use arith::{order1, ppm};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (Vec<u8>, u8)| {
    let (input, order) = data;
    let order = usize::from(order) % (ppm::MAX_ORDER + 1);

    for strategy in [Strategy::Adaptive, Strategy::Static] {
        let packed = order0::compress(&input, strategy).unwrap();
        assert_eq!(order0::expand(&packed, strategy).unwrap(), input);
    }

    let packed = order1::compress(&input).unwrap();
    assert_eq!(order1::expand(&packed).unwrap(), input);

    let packed = ppm::compress(&input, order).unwrap();
    assert_eq!(ppm::expand(&packed, order).unwrap(), input);
});
