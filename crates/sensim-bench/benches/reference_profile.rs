//! Criterion benchmarks for full measurement evaluation.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use sensim_bench::{reference_profile, stress_profile};

fn bench_measure_100(c: &mut Criterion) {
    let mut array = reference_profile(42).unwrap();

    // Warm up: sample the truth once so only the chains are timed
    array.get_truth().unwrap();

    c.bench_function("calc_measurements_100", |b| {
        b.iter(|| {
            let meas = array.calc_measurements().unwrap();
            black_box(meas);
        });
    });
}

fn bench_measure_1000(c: &mut Criterion) {
    let mut array = stress_profile(42).unwrap();
    array.get_truth().unwrap();

    c.bench_function("calc_measurements_1000", |b| {
        b.iter(|| {
            let meas = array.calc_measurements().unwrap();
            black_box(meas);
        });
    });
}

fn bench_cold_start_100(c: &mut Criterion) {
    c.bench_function("cold_start_100", |b| {
        b.iter(|| {
            let mut array = reference_profile(42).unwrap();
            black_box(array.get_measurements().unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_measure_100,
    bench_measure_1000,
    bench_cold_start_100
);
criterion_main!(benches);
