use arith::order0::{self, Strategy};
use arith::{order1, ppm};
use criterion::{criterion_group, criterion_main, Criterion};

fn sample_text(len: usize) -> Vec<u8> {
    b"it was the best of times, it was the worst of times, "
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

fn bench_order0(c: &mut Criterion) {
    let mut group = c.benchmark_group("order0");
    let input = sample_text(16 * 1024);

    for strategy in [Strategy::Adaptive, Strategy::Static] {
        group.bench_function(format!("compress_{strategy:?}"), |b| {
            b.iter(|| order0::compress(&input, strategy).unwrap())
        });
        let data = order0::compress(&input, strategy).unwrap();
        group.bench_function(format!("expand_{strategy:?}"), |b| {
            b.iter(|| order0::expand(&data, strategy).unwrap())
        });
    }
}

fn bench_order1(c: &mut Criterion) {
    let mut group = c.benchmark_group("order1");
    let input = sample_text(16 * 1024);

    group.bench_function("compress", |b| {
        b.iter(|| order1::compress(&input).unwrap())
    });
    let data = order1::compress(&input).unwrap();
    group.bench_function("expand", |b| {
        b.iter(|| order1::expand(&data).unwrap())
    });
}

fn bench_ppm(c: &mut Criterion) {
    let mut group = c.benchmark_group("ppm");
    let input = sample_text(16 * 1024);

    for order in [1usize, 3] {
        group.bench_function(format!("compress_order{order}"), |b| {
            b.iter(|| ppm::compress(&input, order).unwrap())
        });
        let data = ppm::compress(&input, order).unwrap();
        group.bench_function(format!("expand_order{order}"), |b| {
            b.iter(|| ppm::expand(&data, order).unwrap())
        });
    }
}

criterion_group!(benches, bench_order0, bench_order1, bench_ppm);
criterion_main!(benches);
