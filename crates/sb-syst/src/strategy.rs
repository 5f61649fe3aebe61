//! The variation-strategy trait and name-based selection.

use std::sync::Arc;

use sb_core::{BinnedHistogram, CovarianceMatrix, EventSource, Partition, Result};

use crate::booking::{BookingContext, DeferredFill};

/// One named source of correlated bin-to-bin uncertainty.
///
/// Strategies book deferred per-sample histogram fills during the
/// booking phase and later reduce their own fills to a single
/// covariance contribution. `reduce` is called at most once per
/// variable, after all booking for that variable has completed.
pub trait VariationStrategy: Send + Sync {
    /// Stable identifier; the contribution's key in the aggregation map.
    fn name(&self) -> &str;

    /// Register this strategy's deferred fills for one sample.
    ///
    /// Must not force any evaluation.
    fn book(
        &self,
        sample_id: &str,
        source: Arc<dyn EventSource>,
        binning: &Partition,
        ctx: &mut BookingContext,
    ) -> Result<()>;

    /// Force this strategy's booked fills and reduce them to one
    /// covariance contribution.
    fn reduce(
        &self,
        nominal: &BinnedHistogram,
        ctx: &mut BookingContext,
    ) -> Result<CovarianceMatrix>;
}

/// Filter strategies by enabled names; an empty enabled-set means all.
pub fn select_strategies<'a>(
    all: &'a [Box<dyn VariationStrategy>],
    enabled: &[String],
) -> Vec<&'a dyn VariationStrategy> {
    all.iter()
        .filter(|s| enabled.is_empty() || enabled.iter().any(|name| name == s.name()))
        .map(|s| s.as_ref())
        .collect()
}

/// Book one deferred fill of `variable` weighted by `weight_column`
/// (unit weights when the column is absent).
pub(crate) fn deferred_fill(
    label: impl Into<String>,
    source: Arc<dyn EventSource>,
    variable: String,
    weight_column: String,
    binning: Partition,
) -> DeferredFill {
    DeferredFill::new(label, move || {
        let values = source.column(&variable)?;
        let weights = source.column_or(&weight_column, 1.0)?;
        BinnedHistogram::fill(&binning, &values, &weights)
    })
}

/// Force a set of fills in parallel and sum them per label into
/// per-label totals over `binning`.
pub(crate) fn force_and_sum_by_label(
    fills: Vec<(String, DeferredFill)>,
    binning: &Partition,
) -> Result<std::collections::BTreeMap<String, BinnedHistogram>> {
    use rayon::prelude::*;

    let forced: Vec<(String, BinnedHistogram)> = fills
        .into_par_iter()
        .map(|(sample, fill)| {
            let label = fill.label().to_string();
            let hist = fill.force()?;
            log::debug!("forced fill {}/{}", sample, label);
            Ok((label, hist))
        })
        .collect::<Result<_>>()?;

    let mut totals: std::collections::BTreeMap<String, BinnedHistogram> =
        std::collections::BTreeMap::new();
    for (label, hist) in forced {
        totals
            .entry(label)
            .or_insert_with(|| BinnedHistogram::empty(binning))
            .add(&hist)?;
    }
    Ok(totals)
}
