//! Weight-knob systematic: one pair of alternate per-event weight
//! columns ("up"/"down") re-weighting the nominal sample.

use std::sync::Arc;

use sb_core::{
    BinnedHistogram, CovarianceMatrix, Error, EventSource, Partition, Result,
};

use crate::booking::BookingContext;
use crate::strategy::{deferred_fill, force_and_sum_by_label, VariationStrategy};

/// Systematic from an up/down pair of alternate weight columns.
///
/// The contribution is the rank-one outer product of the symmetric
/// half-difference between the up- and down-reweighted totals:
/// `d_i = (up_i − down_i) / 2`, `C_ij = d_i · d_j`.
#[derive(Debug, Clone)]
pub struct WeightKnobVariation {
    name: String,
    variable: String,
    weight_up: String,
    weight_down: String,
}

impl WeightKnobVariation {
    /// New knob named `name` over `variable` with the given up/down
    /// weight columns.
    pub fn new(
        name: impl Into<String>,
        variable: impl Into<String>,
        weight_up: impl Into<String>,
        weight_down: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            variable: variable.into(),
            weight_up: weight_up.into(),
            weight_down: weight_down.into(),
        }
    }
}

impl VariationStrategy for WeightKnobVariation {
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
                "up",
                Arc::clone(&source),
                self.variable.clone(),
                self.weight_up.clone(),
                binning.clone(),
            ),
        );
        ctx.book(
            &self.name,
            sample_id,
            deferred_fill(
                "down",
                source,
                self.variable.clone(),
                self.weight_down.clone(),
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
                "no fills booked for weight knob '{}'",
                self.name
            )));
        }
        let totals = force_and_sum_by_label(fills, &binning)?;
        let up = totals
            .get("up")
            .ok_or_else(|| Error::Computation(format!("knob '{}' missing up fills", self.name)))?;
        let down = totals.get("down").ok_or_else(|| {
            Error::Computation(format!("knob '{}' missing down fills", self.name))
        })?;

        let diff: Vec<f64> =
            up.sumw.iter().zip(&down.sumw).map(|(u, d)| 0.5 * (u - d)).collect();
        let mut cov = CovarianceMatrix::from_outer(&diff);
        cov.sanitize();
        Ok(cov)
    }
}
