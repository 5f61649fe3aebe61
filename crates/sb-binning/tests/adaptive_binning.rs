//! Property checks on randomized weighted samples.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use sb_binning::{partition_2d, partition_weighted, QuadConfig, DEFAULT_PRIOR_P};
use sb_core::{MemorySource, Partition};

#[test]
fn test_blocks_edges_span_random_weighted_sample() {
    let mut rng = StdRng::seed_from_u64(7);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let values: Vec<f64> = (0..500).map(|_| normal.sample(&mut rng)).collect();
    let weights: Vec<f64> = (0..500).map(|i| 0.5 + (i % 10) as f64 * 0.1).collect();

    let p = partition_weighted(&values, &weights, DEFAULT_PRIOR_P).unwrap();
    let edges = p.edges();
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(edges[0], min);
    assert_eq!(edges[edges.len() - 1], max);
    for pair in edges.windows(2) {
        assert!(pair[0] < pair[1]);
    }
}

#[test]
fn test_quad_refines_a_dense_gaussian_core() {
    let mut rng = StdRng::seed_from_u64(11);
    let core = Normal::new(0.0, 0.3).unwrap();
    let n = 4000;
    let xs: Vec<f64> = (0..n).map(|_| core.sample(&mut rng)).collect();
    let ys: Vec<f64> = (0..n).map(|_| core.sample(&mut rng)).collect();
    let src = MemorySource::new()
        .with_column("x", xs)
        .unwrap()
        .with_column("y", ys)
        .unwrap();

    let domain = Partition::new(vec![-2.0, 2.0]).unwrap();
    let config = QuadConfig { min_effective_n: 100.0, ..QuadConfig::default() };
    let (px, py) = partition_2d(&[&src], "x", "y", &domain, &domain, &config).unwrap();

    // Dense data must split beyond the bare domain, and every edge
    // stays inside it.
    assert!(px.bin_count() > 1);
    assert!(py.bin_count() > 1);
    for p in [&px, &py] {
        assert_eq!(p.low(), -2.0);
        assert_eq!(p.high(), 2.0);
        for pair in p.edges().windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    // Re-running is bit-for-bit deterministic.
    let (qx, qy) = partition_2d(&[&src], "x", "y", &domain, &domain, &config).unwrap();
    assert_eq!(px.edges(), qx.edges());
    assert_eq!(py.edges(), qy.edges());
}
