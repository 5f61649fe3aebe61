//! # sb-cutflow
//!
//! Stage-wise selection efficiency summaries over staged weighted
//! counts: cumulative and incremental survival fractions,
//! Clopper–Pearson confidence intervals on the effective-count scale,
//! and two-sided finite-difference gradients with respect to a
//! cut-parameter perturbation.
//!
//! The engine consumes [`StageCount`] sequences produced by the
//! external selection pipeline and never errors on sparse category
//! coverage: missing schemes, missing keys, and zero denominators all
//! read as 0.0.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use statrs::distribution::{Beta, ContinuousCDF};

use sb_core::{Error, Result, StageCount};

/// Cumulative survival fractions per requested category key.
///
/// Each key maps to one fraction per stage, aligned with `counts`:
/// the key's accumulated weight at that stage divided by its weight
/// at stage 0. Zero denominators yield 0.0, never NaN or infinity.
pub fn efficiencies(
    counts: &[StageCount],
    scheme: &str,
    keys: &[i64],
) -> BTreeMap<i64, Vec<f64>> {
    let mut out = BTreeMap::new();
    for &key in keys {
        let denominator = counts
            .first()
            .map(|stage| stage.total(scheme, key).sum_w)
            .unwrap_or(0.0);
        let fractions = counts
            .iter()
            .map(|stage| safe_ratio(stage.total(scheme, key).sum_w, denominator))
            .collect();
        out.insert(key, fractions);
    }
    out
}

/// Incremental survival fractions: each stage relative to the one
/// before it (stage 0 relative to itself).
pub fn incremental_efficiencies(
    counts: &[StageCount],
    scheme: &str,
    keys: &[i64],
) -> BTreeMap<i64, Vec<f64>> {
    let mut out = BTreeMap::new();
    for &key in keys {
        let mut fractions = Vec::with_capacity(counts.len());
        let mut previous = counts
            .first()
            .map(|stage| stage.total(scheme, key).sum_w)
            .unwrap_or(0.0);
        for stage in counts {
            let current = stage.total(scheme, key).sum_w;
            fractions.push(safe_ratio(current, previous));
            previous = current;
        }
        out.insert(key, fractions);
    }
    out
}

fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Per-stage finite-difference sensitivity of survival efficiency to
/// a cut-parameter perturbation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutFlowGradient {
    /// Gradient of the signal key's efficiency, one entry per stage.
    pub signal: Vec<f64>,
    /// Gradients of each requested background key's efficiency.
    pub backgrounds: BTreeMap<i64, Vec<f64>>,
}

/// Central finite difference of efficiencies between staged counts
/// evaluated at the cut parameter nudged up (`plus`) and down
/// (`minus`): `(eff_plus − eff_minus) / 2` per stage.
///
/// The step size is implicit in how `plus`/`minus` were generated;
/// this engine is agnostic to it.
pub fn gradient(
    plus: &[StageCount],
    minus: &[StageCount],
    scheme: &str,
    signal_key: i64,
    background_keys: &[i64],
) -> Result<CutFlowGradient> {
    if plus.len() != minus.len() {
        return Err(Error::InvalidInput(format!(
            "cut-flow gradient: {} plus stages vs {} minus stages",
            plus.len(),
            minus.len()
        )));
    }
    let mut keys = vec![signal_key];
    keys.extend_from_slice(background_keys);
    let eff_plus = efficiencies(plus, scheme, &keys);
    let eff_minus = efficiencies(minus, scheme, &keys);

    let diff = |key: i64| -> Vec<f64> {
        match (eff_plus.get(&key), eff_minus.get(&key)) {
            (Some(p), Some(m)) => p.iter().zip(m).map(|(a, b)| (a - b) / 2.0).collect(),
            _ => Vec::new(),
        }
    };

    Ok(CutFlowGradient {
        signal: diff(signal_key),
        backgrounds: background_keys.iter().map(|&k| (k, diff(k))).collect(),
    })
}

/// One stage's efficiency with its confidence interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyInterval {
    /// Point estimate (cumulative survival fraction).
    pub efficiency: f64,
    /// Lower interval bound.
    pub low: f64,
    /// Upper interval bound.
    pub high: f64,
}

/// Clopper–Pearson intervals for one key's cumulative efficiencies.
///
/// Weighted counts are mapped to the effective-count scale:
/// `n_eff = (Σw)²/Σw²` at stage 0 and `k_eff = ε · n_eff` per stage.
/// Stages with a zero effective denominator get the trivial `[0, 1]`
/// interval.
pub fn efficiency_intervals(
    counts: &[StageCount],
    scheme: &str,
    key: i64,
    confidence_level: f64,
) -> Result<Vec<EfficiencyInterval>> {
    if !(0.0 < confidence_level && confidence_level < 1.0) {
        return Err(Error::InvalidInput(format!(
            "confidence level must be in (0, 1), got {}",
            confidence_level
        )));
    }
    let denominator = counts.first().map(|stage| stage.total(scheme, key)).unwrap_or_default();
    let n_eff = denominator.effective_n();

    let mut intervals = Vec::with_capacity(counts.len());
    for stage in counts {
        let efficiency = safe_ratio(stage.total(scheme, key).sum_w, denominator.sum_w);
        let (low, high) = if n_eff > 0.0 {
            clopper_pearson((efficiency * n_eff).clamp(0.0, n_eff), n_eff, confidence_level)?
        } else {
            (0.0, 1.0)
        };
        intervals.push(EfficiencyInterval { efficiency, low, high });
    }
    Ok(intervals)
}

/// Clopper–Pearson binomial interval on (possibly fractional)
/// effective counts via the Beta inverse CDF.
fn clopper_pearson(k: f64, n: f64, confidence_level: f64) -> Result<(f64, f64)> {
    let alpha = 1.0 - confidence_level;
    let low = if k <= 0.0 {
        0.0
    } else {
        beta_inv_cdf(k, n - k + 1.0, alpha / 2.0)?
    };
    let high = if k >= n {
        1.0
    } else {
        beta_inv_cdf(k + 1.0, n - k, 1.0 - alpha / 2.0)?
    };
    Ok((low, high))
}

fn beta_inv_cdf(shape_a: f64, shape_b: f64, p: f64) -> Result<f64> {
    let beta = Beta::new(shape_a, shape_b)
        .map_err(|e| Error::Computation(format!("Beta({}, {}): {}", shape_a, shape_b, e)))?;
    Ok(beta.inverse_cdf(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn stage(entries: &[(&str, i64, f64)]) -> StageCount {
        let mut sc = StageCount::new();
        for &(scheme, key, weight) in entries {
            sc.record(scheme, key, weight);
        }
        sc
    }

    #[test]
    fn test_stage0_efficiency_is_exactly_one() {
        let counts = vec![
            stage(&[("topology", 1, 100.0)]),
            stage(&[("topology", 1, 40.0)]),
        ];
        let effs = efficiencies(&counts, "topology", &[1]);
        assert_eq!(effs[&1][0], 1.0);
        assert_abs_diff_eq!(effs[&1][1], 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_scheme_and_key_read_zero() {
        let counts = vec![
            stage(&[("topology", 1, 100.0)]),
            stage(&[("topology", 1, 40.0)]),
        ];
        let effs = efficiencies(&counts, "interaction", &[1]);
        assert_eq!(effs[&1], vec![0.0, 0.0]);
        let effs = efficiencies(&counts, "topology", &[7]);
        assert_eq!(effs[&7], vec![0.0, 0.0]);
    }

    #[test]
    fn test_zero_denominator_yields_zero_not_nan() {
        let counts = vec![stage(&[]), stage(&[("topology", 1, 5.0)])];
        let effs = efficiencies(&counts, "topology", &[1]);
        assert_eq!(effs[&1], vec![0.0, 0.0]);
    }

    #[test]
    fn test_incremental_efficiencies() {
        let counts = vec![
            stage(&[("topology", 1, 100.0)]),
            stage(&[("topology", 1, 50.0)]),
            stage(&[("topology", 1, 25.0)]),
        ];
        let incr = incremental_efficiencies(&counts, "topology", &[1]);
        assert_eq!(incr[&1], vec![1.0, 0.5, 0.5]);
    }

    #[test]
    fn test_gradient_concrete_scenario() {
        // Stage 0: signal 100, background 200. Stage 1 plus: 61 / 30;
        // minus: 59 / 50.
        let plus = vec![
            stage(&[("topology", 1, 100.0), ("topology", 2, 200.0)]),
            stage(&[("topology", 1, 61.0), ("topology", 2, 30.0)]),
        ];
        let minus = vec![
            stage(&[("topology", 1, 100.0), ("topology", 2, 200.0)]),
            stage(&[("topology", 1, 59.0), ("topology", 2, 50.0)]),
        ];
        let grad = gradient(&plus, &minus, "topology", 1, &[2]).unwrap();
        assert_eq!(grad.signal.len(), 2);
        assert_abs_diff_eq!(grad.signal[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(grad.signal[1], 0.01, epsilon = 1e-12);
        assert_abs_diff_eq!(grad.backgrounds[&2][1], -0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_gradient_stage_mismatch() {
        let plus = vec![stage(&[("topology", 1, 1.0)])];
        let minus: Vec<StageCount> = Vec::new();
        assert!(gradient(&plus, &minus, "topology", 1, &[]).is_err());
    }

    #[test]
    fn test_intervals_bracket_the_estimate() {
        let mut stage0 = StageCount::new();
        let mut stage1 = StageCount::new();
        for _ in 0..100 {
            stage0.record("topology", 1, 1.0);
        }
        for _ in 0..60 {
            stage1.record("topology", 1, 1.0);
        }
        let counts = vec![stage0, stage1];
        let intervals = efficiency_intervals(&counts, "topology", 1, 0.68).unwrap();
        // Stage 0: k == n, upper bound is exactly 1.
        assert_eq!(intervals[0].efficiency, 1.0);
        assert_eq!(intervals[0].high, 1.0);
        assert!(intervals[0].low < 1.0);
        // Stage 1: interval brackets 0.6 and is within [0, 1].
        let i1 = &intervals[1];
        assert_abs_diff_eq!(i1.efficiency, 0.6, epsilon = 1e-12);
        assert!(i1.low < 0.6 && 0.6 < i1.high);
        assert!(i1.low > 0.0 && i1.high < 1.0);
    }

    #[test]
    fn test_interval_at_zero_efficiency() {
        let counts = vec![stage(&[("topology", 1, 50.0)]), stage(&[])];
        let intervals = efficiency_intervals(&counts, "topology", 1, 0.95).unwrap();
        assert_eq!(intervals[1].efficiency, 0.0);
        assert_eq!(intervals[1].low, 0.0);
        assert!(intervals[1].high > 0.0);
    }

    #[test]
    fn test_interval_without_denominator_is_trivial() {
        let counts = vec![stage(&[]), stage(&[])];
        let intervals = efficiency_intervals(&counts, "topology", 1, 0.95).unwrap();
        assert_eq!(intervals[0].low, 0.0);
        assert_eq!(intervals[0].high, 1.0);
    }

    #[test]
    fn test_invalid_confidence_level() {
        let counts = vec![stage(&[("topology", 1, 1.0)])];
        assert!(efficiency_intervals(&counts, "topology", 1, 0.0).is_err());
        assert!(efficiency_intervals(&counts, "topology", 1, 1.0).is_err());
    }

    #[test]
    fn test_gradient_serde_round_trip() {
        let grad = CutFlowGradient {
            signal: vec![0.0, 0.01],
            backgrounds: [(2, vec![0.0, -0.05])].into_iter().collect(),
        };
        let json = serde_json::to_string(&grad).unwrap();
        let back: CutFlowGradient = serde_json::from_str(&json).unwrap();
        assert_eq!(grad, back);
    }
}
