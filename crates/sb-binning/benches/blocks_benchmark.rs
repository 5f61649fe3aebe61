use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sb_binning::{partition_weighted, DEFAULT_PRIOR_P};
use std::hint::black_box;

fn make_sample(n: usize) -> (Vec<f64>, Vec<f64>) {
    // Two well-separated clusters with deterministic jitter so the DP
    // has real structure to find.
    let mut values = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);
    for i in 0..n {
        let base = if i % 2 == 0 { 0.0 } else { 50.0 };
        values.push(base + i as f64 * 1e-3);
        weights.push(1.0 + (i % 7) as f64 * 0.1);
    }
    (values, weights)
}

fn bench_blocks(c: &mut Criterion) {
    let mut group = c.benchmark_group("bayesian_blocks");
    for n in [64usize, 256, 1024] {
        let (values, weights) = make_sample(n);
        group.bench_with_input(BenchmarkId::new("partition_weighted", n), &n, |b, _| {
            b.iter(|| {
                let p = partition_weighted(&values, &weights, DEFAULT_PRIOR_P).unwrap();
                black_box(p)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_blocks);
criterion_main!(benches);
