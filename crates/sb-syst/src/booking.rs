//! Deferred-fill booking context shared between strategies.
//!
//! The context is append-only during booking and drained exactly once
//! per strategy at reduction time; [`BookingContext::clear`] resets it
//! between variables. It is explicit state passed by reference, never
//! ambient.

use std::collections::BTreeMap;

use sb_core::{BinnedHistogram, Result};

/// A labeled, not-yet-evaluated histogram fill.
///
/// The closure owns everything it needs (typically an `Arc` of the
/// event source), so constructing one never touches the data.
pub struct DeferredFill {
    label: String,
    task: Box<dyn FnOnce() -> Result<BinnedHistogram> + Send>,
}

impl DeferredFill {
    /// Wrap a fill closure under a label (e.g. `"up"`, `"universe_3"`).
    pub fn new(
        label: impl Into<String>,
        task: impl FnOnce() -> Result<BinnedHistogram> + Send + 'static,
    ) -> Self {
        Self { label: label.into(), task: Box::new(task) }
    }

    /// The label given at booking time.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Run the fill.
    pub fn force(self) -> Result<BinnedHistogram> {
        (self.task)()
    }
}

impl std::fmt::Debug for DeferredFill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredFill").field("label", &self.label).finish()
    }
}

/// Pending deferred fills for one variable's booking cycle, keyed by
/// strategy name and sample id.
#[derive(Debug, Default)]
pub struct BookingContext {
    pending: BTreeMap<String, BTreeMap<String, Vec<DeferredFill>>>,
}

impl BookingContext {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a deferred fill for `(strategy, sample)`.
    pub fn book(&mut self, strategy: &str, sample: &str, fill: DeferredFill) {
        self.pending
            .entry(strategy.to_string())
            .or_default()
            .entry(sample.to_string())
            .or_default()
            .push(fill);
    }

    /// Drain all fills booked by one strategy, keyed by sample id.
    ///
    /// A second take for the same strategy returns an empty map:
    /// reduction happens at most once per booking cycle.
    pub fn take(&mut self, strategy: &str) -> BTreeMap<String, Vec<DeferredFill>> {
        self.pending.remove(strategy).unwrap_or_default()
    }

    /// Number of fills currently booked by one strategy.
    pub fn booked(&self, strategy: &str) -> usize {
        self.pending
            .get(strategy)
            .map(|samples| samples.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Drop everything; call between variables.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
