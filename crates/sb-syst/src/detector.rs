//! Detector-variation systematic: one alternate, independently
//! produced event sample per detector source, compared bin-by-bin
//! against the nominal.

use std::sync::Arc;

use sb_core::{
    BinnedHistogram, CovarianceMatrix, Error, EventSource, Partition, Result,
};

use crate::booking::BookingContext;
use crate::strategy::{deferred_fill, force_and_sum_by_label, VariationStrategy};

/// Systematic from an alternate detector-variation sample.
///
/// `book` is called with the *alternate* sample's source (the caller
/// pairs variation samples with their nominal counterparts).
/// Contribution: `C_ij = d_i · d_j` with `d = h_alt − h_nominal`.
#[derive(Debug, Clone)]
pub struct DetectorVariation {
    name: String,
    variable: String,
    weight_column: String,
}

impl DetectorVariation {
    /// New detector source named `name` over `variable`, weighted by
    /// the standard nominal weight column.
    pub fn new(name: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variable: variable.into(),
            weight_column: "nominal_event_weight".into(),
        }
    }

    /// Override the weight column of the alternate sample.
    pub fn with_weight_column(mut self, column: impl Into<String>) -> Self {
        self.weight_column = column.into();
        self
    }
}

impl VariationStrategy for DetectorVariation {
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
        ctx.book(
            &self.name,
            sample_id,
            deferred_fill(
                "variation",
                source,
                self.variable.clone(),
                self.weight_column.clone(),
                binning.clone(),
            ),
        );
        Ok(())
    }

    fn reduce(
        &self,
        nominal: &BinnedHistogram,
        ctx: &mut BookingContext,
    ) -> Result<CovarianceMatrix> {
        let binning = Partition::new(nominal.edges().to_vec())?;
        let fills: Vec<(String, _)> = ctx
            .take(&self.name)
            .into_iter()
            .flat_map(|(sample, fills)| fills.into_iter().map(move |f| (sample.clone(), f)))
            .collect();
        if fills.is_empty() {
            return Err(Error::InvalidInput(format!(
                "no fills booked for detector variation '{}'",
                self.name
            )));
        }
        let totals = force_and_sum_by_label(fills, &binning)?;
        let alt = totals.get("variation").ok_or_else(|| {
            Error::Computation(format!("detector variation '{}' missing fills", self.name))
        })?;

        let diff: Vec<f64> = alt.sumw.iter().zip(&nominal.sumw).map(|(a, n)| a - n).collect();
        let mut cov = CovarianceMatrix::from_outer(&diff);
        cov.sanitize();
        Ok(cov)
    }
}
