//! Multi-universe systematic: N independently re-weighted "universe"
//! histograms per sample; the contribution is the sample covariance
//! of the universes around the nominal.

use std::sync::{Arc, Mutex};

use sb_core::{
    BinnedHistogram, CovarianceMatrix, Error, EventSource, Partition, Result,
};

use crate::booking::{BookingContext, DeferredFill};
use crate::strategy::{force_and_sum_by_label, VariationStrategy};

/// Systematic from a family of universe weight columns
/// `"{prefix}_{u}"`, `u = 0..n_universes`.
///
/// Contribution: `C_ij = (1/M) Σ_u (h_u,i − nom_i)(h_u,j − nom_j)`.
/// A sample missing a universe column falls back to its nominal
/// weight for that universe (sparse universe coverage must not abort
/// a run).
pub struct MultiUniverseVariation {
    name: String,
    variable: String,
    weight_prefix: String,
    n_universes: usize,
    nominal_weight: String,
    store_universes: bool,
    retained: Mutex<Option<Vec<BinnedHistogram>>>,
}

impl MultiUniverseVariation {
    /// New multi-universe source named `name` over `variable`.
    pub fn new(
        name: impl Into<String>,
        variable: impl Into<String>,
        weight_prefix: impl Into<String>,
        n_universes: usize,
    ) -> Self {
        Self {
            name: name.into(),
            variable: variable.into(),
            weight_prefix: weight_prefix.into(),
            n_universes,
            nominal_weight: "nominal_event_weight".into(),
            store_universes: false,
            retained: Mutex::new(None),
        }
    }

    /// Override the nominal weight column used as fallback.
    pub fn with_nominal_weight(mut self, column: impl Into<String>) -> Self {
        self.nominal_weight = column.into();
        self
    }

    /// Retain the summed per-universe histograms across `reduce`.
    pub fn store_universes(mut self, store: bool) -> Self {
        self.store_universes = store;
        self
    }

    /// Per-universe totals from the last `reduce`, if retention was
    /// enabled.
    pub fn universe_totals(&self) -> Option<Vec<BinnedHistogram>> {
        self.retained.lock().ok().and_then(|guard| guard.clone())
    }
}

impl VariationStrategy for MultiUniverseVariation {
    fn name(&self) -> &str {
        &self.name
    }

    fn book(
        &self,
        sample_id: &str,
        source: Arc<dyn EventSource>,
        binning: &Partition,
        ctx: &mut BookingContext,
    ) -> Result<()> {
        for u in 0..self.n_universes {
            let column = format!("{}_{}", self.weight_prefix, u);
            if !source.has_column(&column) {
                log::warn!(
                    "sample '{}' has no universe column '{}'; using nominal weight",
                    sample_id,
                    column
                );
            }
            let src = Arc::clone(&source);
            let variable = self.variable.clone();
            let nominal_weight = self.nominal_weight.clone();
            let fill_binning = binning.clone();
            ctx.book(
                &self.name,
                sample_id,
                DeferredFill::new(format!("universe_{}", u), move || {
                    let values = src.column(&variable)?;
                    let weights = if src.has_column(&column) {
                        src.column(&column)?
                    } else {
                        src.column_or(&nominal_weight, 1.0)?
                    };
                    BinnedHistogram::fill(&fill_binning, &values, &weights)
                }),
            );
        }
        Ok(())
    }

    fn reduce(
        &self,
        nominal: &BinnedHistogram,
        ctx: &mut BookingContext,
    ) -> Result<CovarianceMatrix> {
        if self.n_universes == 0 {
            return Err(Error::InvalidInput(format!(
                "multi-universe source '{}' has no universes",
                self.name
            )));
        }
        let binning = Partition::new(nominal.edges().to_vec())?;
        let fills: Vec<(String, _)> = ctx
            .take(&self.name)
            .into_iter()
            .flat_map(|(sample, fills)| fills.into_iter().map(move |f| (sample.clone(), f)))
            .collect();
        if fills.is_empty() {
            return Err(Error::InvalidInput(format!(
                "no fills booked for multi-universe source '{}'",
                self.name
            )));
        }
        let totals = force_and_sum_by_label(fills, &binning)?;

        let n_bins = nominal.bin_count();
        let mut cov = CovarianceMatrix::zeros(n_bins);
        let mut universes = Vec::with_capacity(self.n_universes);
        for u in 0..self.n_universes {
            let label = format!("universe_{}", u);
            let hist = totals.get(&label).ok_or_else(|| {
                Error::Computation(format!("source '{}' missing {}", self.name, label))
            })?;
            let delta: Vec<f64> =
                hist.sumw.iter().zip(&nominal.sumw).map(|(h, n)| h - n).collect();
            let data = cov.as_mut_slice();
            for i in 0..n_bins {
                for j in 0..n_bins {
                    data[i * n_bins + j] += delta[i] * delta[j];
                }
            }
            universes.push(hist.clone());
        }
        let scale = 1.0 / self.n_universes as f64;
        for v in cov.as_mut_slice() {
            *v *= scale;
        }
        cov.sanitize();

        if self.store_universes {
            if let Ok(mut guard) = self.retained.lock() {
                *guard = Some(universes);
            }
        }
        Ok(cov)
    }
}
