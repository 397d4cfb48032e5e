use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::{
    parallel::prelude::{IntoParallelRefIterator, ParallelIterator},
    Array, Array1, Axis,
};
use ndarray_rebin::{rebin_1d, shrink_1d, VectorExtensions};

use rand_extensions::RandArray;


fn grid(size: usize, seed: u64) -> (Array1<f64>, Array1<f64>) {
    let bins = Array::from_rand_ordered(size + 1, (0.0, 1000.0), seed);
    let data = Array::from_rand(bins.len() - 1, (0.0, 1.0), seed + 1);
    (bins, data)
}

fn bench_rebin1d(c: &mut Criterion) {
    let (bins, data) = grid(10_000, 42);
    let last = bins.len() - 1;
    let coarse = Array::linspace(bins[0], bins[last], 101);
    let fine = Array::linspace(bins[0], bins[last], 100_001);

    c.bench_function("1D density to coarse bins", |b| {
        b.iter(|| rebin_1d(&data, &bins, black_box(&coarse), Axis(0), false, false).unwrap())
    });

    c.bench_function("1D grouped to coarse bins", |b| {
        b.iter(|| rebin_1d(&data, &bins, black_box(&coarse), Axis(0), true, false).unwrap())
    });

    c.bench_function("1D density to fine bins", |b| {
        b.iter(|| rebin_1d(&data, &bins, black_box(&fine), Axis(0), false, false).unwrap())
    });

    c.bench_function("1D density to fine bins `assume_sorted`", |b| {
        b.iter(|| rebin_1d(&data, &bins, black_box(&fine), Axis(0), false, true).unwrap())
    });
}

fn bench_rebin1d_multithread(c: &mut Criterion) {
    let rows: Vec<_> = (0..64).map(|seed| grid(2_000, seed)).collect();
    let targets: Vec<_> = rows
        .iter()
        .map(|(bins, _)| Array::linspace(bins[0], bins[bins.len() - 1], 51))
        .collect();
    let work: Vec<_> = rows.iter().zip(&targets).collect();

    c.bench_function("1D MT rebin of independent grids", |b| {
        b.iter(|| {
            work.par_iter().for_each(|((bins, data), new_bins)| {
                rebin_1d(data, bins, *new_bins, Axis(0), false, false).unwrap();
            });
        })
    });
}

fn bench_helpers(c: &mut Criterion) {
    let (bins, data) = grid(10_000, 7);
    let query = Array::from_rand(10_000, (0.0, 1000.0), 123);

    c.bench_function("digitize", |b| {
        b.iter(|| {
            for &x in &query {
                black_box(bins.digitize(x));
            }
        })
    });

    c.bench_function("shrink 1D", |b| {
        b.iter(|| {
            for pair in query.windows(2) {
                let (low, high) = (pair[0].min(pair[1]), pair[0].max(pair[1]));
                let _ = black_box(shrink_1d(&data, &bins, Some(low), Some(high), Axis(0), true));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_rebin1d,
    bench_rebin1d_multithread,
    bench_helpers
);
criterion_main!(benches);
