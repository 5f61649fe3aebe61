//! Bayesian Blocks changepoint partitioning of 1D weighted samples.
//!
//! Finds the partition maximizing a piecewise-constant-rate fitness
//! over all 2^N possible changepoint placements via an O(N²) dynamic
//! program (Scargle et al. 2013, "events" fitness with weighted
//! counts).

use sb_core::{Error, Partition, Result};

/// Default false-positive prior probability for a spurious changepoint.
pub const DEFAULT_PRIOR_P: f64 = 0.01;

/// Optimal changepoint partition of distinct weighted values.
///
/// `values` and `weights` are parallel slices; weights must be
/// positive and values distinct (pre-aggregate duplicates by summing
/// their weights, or use [`partition_unweighted`]). Returns bin edges
/// starting at the minimum value and ending at the maximum value,
/// with interior edges at midpoints between neighboring values.
pub fn partition_weighted(values: &[f64], weights: &[f64], prior_p: f64) -> Result<Partition> {
    if values.is_empty() {
        return Err(Error::InvalidInput(
            "changepoint partition requires a non-empty sample".into(),
        ));
    }
    if values.len() != weights.len() {
        return Err(Error::InvalidInput(format!(
            "changepoint partition: {} values vs {} weights",
            values.len(),
            weights.len()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidInput("changepoint values must be finite".into()));
    }
    if weights.iter().any(|&w| !w.is_finite() || w <= 0.0) {
        return Err(Error::DegenerateInput("changepoint weights must be positive".into()));
    }

    let mut pairs: Vec<(f64, f64)> = values.iter().copied().zip(weights.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    for pair in pairs.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(Error::DegenerateInput(format!(
                "duplicate value {} in changepoint input; pre-aggregate by summing weights",
                pair[0].0
            )));
        }
    }
    let n = pairs.len();
    if n < 2 {
        return Err(Error::DegenerateInput(
            "changepoint partition requires at least 2 distinct values".into(),
        ));
    }

    // N+1 cell edges: data extrema at the ends, midpoints between
    // neighboring values in between.
    let mut edges = Vec::with_capacity(n + 1);
    edges.push(pairs[0].0);
    for i in 1..n {
        edges.push(0.5 * (pairs[i - 1].0 + pairs[i].0));
    }
    edges.push(pairs[n - 1].0);

    // Empirical per-changepoint penalty (Scargle eq. 21).
    let ncp_prior = (73.53 * prior_p * (n as f64).powf(-0.478)).ln() - 4.0;

    // Prefix weight sums give O(1) block content lookups.
    let mut cum_w = vec![0.0; n + 1];
    for (i, pair) in pairs.iter().enumerate() {
        cum_w[i + 1] = cum_w[i] + pair.1;
    }

    // best[k]: maximal total fitness of any partition of cells 0..=k.
    // last[k]: left edge index of the final block in that partition.
    let mut best = vec![0.0_f64; n];
    let mut last = vec![0_usize; n];
    for k in 0..n {
        let mut best_fitness = f64::NEG_INFINITY;
        let mut best_r = 0;
        for r in 0..=k {
            let block_weight = cum_w[k + 1] - cum_w[r];
            let block_width = edges[k + 1] - edges[r];
            let fitness = block_weight * (block_weight / block_width).ln()
                + ncp_prior
                + if r > 0 { best[r - 1] } else { 0.0 };
            // Strict comparison: ties favor the earliest r.
            if fitness > best_fitness {
                best_fitness = fitness;
                best_r = r;
            }
        }
        best[k] = best_fitness;
        last[k] = best_r;
    }

    // Backtrack from the final cell to recover changepoint indices.
    let mut change_points = Vec::new();
    let mut idx = n;
    loop {
        change_points.push(idx);
        if idx == 0 {
            break;
        }
        idx = last[idx - 1];
    }
    change_points.reverse();

    Partition::new(change_points.into_iter().map(|i| edges[i]).collect())
}

/// Unweighted overload: aggregates duplicate values into
/// (value, count) pairs, then delegates to [`partition_weighted`].
pub fn partition_unweighted(values: &[f64], prior_p: f64) -> Result<Partition> {
    if values.is_empty() {
        return Err(Error::InvalidInput(
            "changepoint partition requires a non-empty sample".into(),
        ));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut uniques: Vec<f64> = Vec::new();
    let mut counts: Vec<f64> = Vec::new();
    for &v in &sorted {
        match (uniques.last(), counts.last_mut()) {
            (Some(&u), Some(c)) if u == v => *c += 1.0,
            _ => {
                uniques.push(v);
                counts.push(1.0);
            }
        }
    }
    partition_weighted(&uniques, &counts, prior_p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_two_cluster_scenario() {
        // 50 points at 0.0..4.9 and 50 points at 10.0..14.9, unit
        // weights: the optimum is three blocks with the sparse gap as
        // its own block.
        let mut values = Vec::new();
        for i in 0..50 {
            values.push(i as f64 * 0.1);
        }
        for i in 0..50 {
            values.push(10.0 + i as f64 * 0.1);
        }
        let weights = vec![1.0; values.len()];
        let p = partition_weighted(&values, &weights, DEFAULT_PRIOR_P).unwrap();
        let edges = p.edges();
        assert_eq!(edges.len(), 4);
        assert_abs_diff_eq!(edges[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(edges[1], 4.85, epsilon = 1e-9);
        assert_abs_diff_eq!(edges[2], 10.05, epsilon = 1e-9);
        assert_abs_diff_eq!(edges[3], 14.9, epsilon = 1e-9);
    }

    #[test]
    fn test_edges_strictly_increasing_and_span_data() {
        let values = [3.0, 1.0, 4.0, 1.5, 9.0, 2.6, 5.3, 5.8, 9.7, 0.2];
        let weights = [1.0, 2.0, 0.5, 1.0, 3.0, 1.0, 2.0, 0.1, 1.0, 1.0];
        let p = partition_weighted(&values, &weights, DEFAULT_PRIOR_P).unwrap();
        let edges = p.edges();
        assert!(edges.len() >= 2);
        assert_eq!(edges[0], 0.2);
        assert_eq!(edges[edges.len() - 1], 9.7);
        for pair in edges.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_unweighted_matches_aggregated_weighted() {
        let values = [1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 7.0, 8.0, 8.0, 9.0];
        let uniques = [1.0, 2.0, 3.0, 7.0, 8.0, 9.0];
        let counts = [1.0, 3.0, 2.0, 1.0, 2.0, 1.0];
        let a = partition_unweighted(&values, DEFAULT_PRIOR_P).unwrap();
        let b = partition_weighted(&uniques, &counts, DEFAULT_PRIOR_P).unwrap();
        assert_eq!(a.edges(), b.edges());
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            partition_weighted(&[], &[], DEFAULT_PRIOR_P),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            partition_weighted(&[1.0, 2.0], &[1.0], DEFAULT_PRIOR_P),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            partition_unweighted(&[], DEFAULT_PRIOR_P),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_degenerate_inputs() {
        // Duplicate values must be pre-aggregated by the caller.
        assert!(matches!(
            partition_weighted(&[1.0, 1.0, 2.0], &[1.0, 1.0, 1.0], DEFAULT_PRIOR_P),
            Err(Error::DegenerateInput(_))
        ));
        assert!(matches!(
            partition_weighted(&[1.0, 2.0], &[1.0, 0.0], DEFAULT_PRIOR_P),
            Err(Error::DegenerateInput(_))
        ));
        assert!(matches!(
            partition_weighted(&[1.0, 2.0], &[1.0, -3.0], DEFAULT_PRIOR_P),
            Err(Error::DegenerateInput(_))
        ));
        // A single distinct value has no usable block width.
        assert!(matches!(
            partition_weighted(&[1.0], &[1.0], DEFAULT_PRIOR_P),
            Err(Error::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_uniform_data_stays_one_block() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let weights = vec![1.0; 100];
        let p = partition_weighted(&values, &weights, DEFAULT_PRIOR_P).unwrap();
        assert_eq!(p.edges().len(), 2);
        assert_eq!(p.low(), 0.0);
        assert_eq!(p.high(), 99.0);
    }
}
