//! Weighted binned histogram with single-pass filling.

use crate::error::{Error, Result};
use crate::types::Partition;

/// A filled weighted histogram over a fixed binning.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedHistogram {
    edges: Vec<f64>,
    /// Sum of weights per bin.
    pub sumw: Vec<f64>,
    /// Sum of squared weights per bin.
    pub sumw2: Vec<f64>,
    /// Sum of weights below the first edge.
    pub underflow: f64,
    /// Sum of weights above the last edge.
    pub overflow: f64,
    /// Number of entries filled (including under/overflow).
    pub entries: u64,
}

impl BinnedHistogram {
    /// Empty histogram over `binning`.
    pub fn empty(binning: &Partition) -> Self {
        let n = binning.bin_count();
        Self {
            edges: binning.edges().to_vec(),
            sumw: vec![0.0; n],
            sumw2: vec![0.0; n],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
        }
    }

    /// Fill a histogram from parallel value/weight slices in one pass.
    ///
    /// Entries outside the binning range accumulate into the
    /// under/overflow totals; non-finite values are counted as entries
    /// but contribute nowhere.
    pub fn fill(binning: &Partition, values: &[f64], weights: &[f64]) -> Result<Self> {
        if values.len() != weights.len() {
            return Err(Error::InvalidInput(format!(
                "histogram fill: {} values vs {} weights",
                values.len(),
                weights.len()
            )));
        }
        let mut hist = Self::empty(binning);
        for (&x, &w) in values.iter().zip(weights) {
            hist.entries += 1;
            match binning.bin_index(x) {
                Some(bin) => {
                    hist.sumw[bin] += w;
                    hist.sumw2[bin] += w * w;
                }
                None if x < binning.low() => hist.underflow += w,
                None if x > binning.high() => hist.overflow += w,
                None => {}
            }
        }
        Ok(hist)
    }

    /// Bin edges.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Number of bins.
    pub fn bin_count(&self) -> usize {
        self.sumw.len()
    }

    /// Total weight inside the binning range.
    pub fn total_weight(&self) -> f64 {
        self.sumw.iter().sum()
    }

    /// Add another histogram over the same binning into this one.
    pub fn add(&mut self, other: &Self) -> Result<()> {
        if other.bin_count() != self.bin_count() {
            return Err(Error::InvalidInput(format!(
                "histogram add: {} bins vs {} bins",
                other.bin_count(),
                self.bin_count()
            )));
        }
        for (a, b) in self.sumw.iter_mut().zip(&other.sumw) {
            *a += *b;
        }
        for (a, b) in self.sumw2.iter_mut().zip(&other.sumw2) {
            *a += *b;
        }
        self.underflow += other.underflow;
        self.overflow += other.overflow;
        self.entries += other.entries;
        Ok(())
    }
}
