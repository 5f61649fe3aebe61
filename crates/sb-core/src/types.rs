//! Common data types for statband.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An ordered set of bin edges defining a 1D binning.
///
/// Invariants: at least two edges, strictly increasing, all finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    edges: Vec<f64>,
}

impl Partition {
    /// Create a partition from bin edges, validating the invariants.
    pub fn new(edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::InvalidInput(format!(
                "partition requires at least 2 edges, got {}",
                edges.len()
            )));
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(Error::InvalidInput("partition edges must be finite".into()));
        }
        for pair in edges.windows(2) {
            if pair[0] >= pair[1] {
                return Err(Error::InvalidInput(format!(
                    "partition edges must be strictly increasing, got {} then {}",
                    pair[0], pair[1]
                )));
            }
        }
        Ok(Self { edges })
    }

    /// Bin edges, length `bin_count() + 1`.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Number of bins.
    pub fn bin_count(&self) -> usize {
        self.edges.len() - 1
    }

    /// Lowest edge.
    pub fn low(&self) -> f64 {
        self.edges[0]
    }

    /// Highest edge.
    pub fn high(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    /// Bin index for a value, or `None` if it falls outside the range.
    ///
    /// Bins are half-open `[e_i, e_{i+1})`; the last bin includes its
    /// upper edge so the domain maximum is not lost to overflow.
    pub fn bin_index(&self, x: f64) -> Option<usize> {
        if !x.is_finite() || x < self.low() || x > self.high() {
            return None;
        }
        if x == self.high() {
            return Some(self.bin_count() - 1);
        }
        // partition_point returns the count of edges <= x; the first edge
        // always satisfies the predicate here, so the result is >= 1.
        let idx = self.edges.partition_point(|&e| e <= x);
        Some(idx - 1)
    }
}

/// A symmetric covariance matrix over the bins of a fixed [`Partition`].
///
/// Stored dense row-major. Symmetry is a construction-time property:
/// the constructors in this crate and the strategy reductions only build
/// symmetric matrices, and element-wise addition preserves symmetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovarianceMatrix {
    dim: usize,
    data: Vec<f64>,
}

impl CovarianceMatrix {
    /// All-zero matrix of dimension `dim`.
    pub fn zeros(dim: usize) -> Self {
        Self { dim, data: vec![0.0; dim * dim] }
    }

    /// Build from row-major data; `data.len()` must equal `dim * dim`.
    pub fn from_data(dim: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != dim * dim {
            return Err(Error::InvalidInput(format!(
                "covariance data length {} does not match dimension {}",
                data.len(),
                dim
            )));
        }
        Ok(Self { dim, data })
    }

    /// Diagonal matrix from per-bin variances (the statistical covariance
    /// of an uncorrelated binned histogram).
    pub fn from_diagonal(variances: &[f64]) -> Self {
        let dim = variances.len();
        let mut m = Self::zeros(dim);
        for (i, &v) in variances.iter().enumerate() {
            m.data[i * dim + i] = v;
        }
        m
    }

    /// Rank-one outer product `C_ij = d_i * d_j`, symmetric by construction.
    pub fn from_outer(d: &[f64]) -> Self {
        let dim = d.len();
        let mut data = Vec::with_capacity(dim * dim);
        for &di in d {
            for &dj in d {
                data.push(di * dj);
            }
        }
        Self { dim, data }
    }

    /// Matrix dimension (number of bins).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element at `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.dim + j]
    }

    /// Set element at `(i, j)`. Does not touch `(j, i)`.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.dim + j] = value;
    }

    /// Row-major view of the elements.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable row-major view of the elements.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Diagonal (per-bin variances).
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.dim).map(|i| self.data[i * self.dim + i]).collect()
    }

    /// Replace every NaN or infinite element with 0.0.
    ///
    /// Idempotent, and cell-independent so the pass runs in parallel.
    pub fn sanitize(&mut self) {
        self.data.par_iter_mut().for_each(|v| {
            if !v.is_finite() {
                *v = 0.0;
            }
        });
    }
}

/// Accumulated weight and squared weight for one category at one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightTotal {
    /// Sum of event weights.
    pub sum_w: f64,
    /// Sum of squared event weights.
    pub sum_w2: f64,
}

impl WeightTotal {
    /// Accumulate one weighted entry.
    pub fn add(&mut self, weight: f64) {
        self.sum_w += weight;
        self.sum_w2 += weight * weight;
    }

    /// Effective sample size `(Σw)² / Σw²`, or 0.0 for an empty total.
    pub fn effective_n(&self) -> f64 {
        if self.sum_w2 > 0.0 {
            self.sum_w * self.sum_w / self.sum_w2
        } else {
            0.0
        }
    }
}

/// Per-stage accumulated weights, keyed by category scheme and key.
///
/// Produced by the external selection/counting pipeline; the cut-flow
/// engine reads it without modification. Missing schemes or keys read
/// as zero totals — sparse category coverage is expected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageCount {
    schemes: BTreeMap<String, BTreeMap<i64, WeightTotal>>,
}

impl StageCount {
    /// Empty stage count.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate one weighted entry for `(scheme, key)`.
    pub fn record(&mut self, scheme: &str, key: i64, weight: f64) {
        self.schemes
            .entry(scheme.to_string())
            .or_default()
            .entry(key)
            .or_default()
            .add(weight);
    }

    /// Total for `(scheme, key)`; zero if the scheme or key is absent.
    pub fn total(&self, scheme: &str, key: i64) -> WeightTotal {
        self.schemes
            .get(scheme)
            .and_then(|m| m.get(&key))
            .copied()
            .unwrap_or_default()
    }

    /// Category keys present under a scheme, in ascending order.
    pub fn keys(&self, scheme: &str) -> Vec<i64> {
        self.schemes
            .get(scheme)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }
}
