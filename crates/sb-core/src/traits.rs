//! Seam traits towards the event-source collaborator.
//!
//! The core never opens files: the orchestration layer hands it
//! already-open columnar views through [`EventSource`]. Keeping the
//! seam a trait lets the binning and systematics crates stay
//! independent of any concrete I/O stack.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Lazy columnar view over one event sample.
pub trait EventSource: Send + Sync {
    /// Whether a column with this name exists.
    fn has_column(&self, name: &str) -> bool;

    /// All values of a column as `f64`.
    fn column(&self, name: &str) -> Result<Vec<f64>>;

    /// Number of events in the sample.
    fn n_events(&self) -> usize;

    /// A column if present, otherwise a constant `default` per event.
    ///
    /// Weight columns are routinely absent for unweighted samples.
    fn column_or(&self, name: &str, default: f64) -> Result<Vec<f64>> {
        if self.has_column(name) {
            self.column(name)
        } else {
            Ok(vec![default; self.n_events()])
        }
    }
}

/// In-memory [`EventSource`] backed by a column map.
///
/// Used in tests and wherever the caller already has materialized
/// columns.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    columns: BTreeMap<String, Vec<f64>>,
    n_events: usize,
}

impl MemorySource {
    /// Empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column; all columns must share one length.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        if self.columns.is_empty() {
            self.n_events = values.len();
        } else if values.len() != self.n_events {
            return Err(Error::InvalidInput(format!(
                "column length {} does not match existing length {}",
                values.len(),
                self.n_events
            )));
        }
        self.columns.insert(name.into(), values);
        Ok(self)
    }
}

impl EventSource for MemorySource {
    fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    fn column(&self, name: &str) -> Result<Vec<f64>> {
        self.columns
            .get(name)
            .cloned()
            .ok_or_else(|| Error::InvalidInput(format!("no such column: {}", name)))
    }

    fn n_events(&self) -> usize {
        self.n_events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source() {
        let src = MemorySource::new()
            .with_column("x", vec![1.0, 2.0, 3.0])
            .unwrap()
            .with_column("w", vec![0.5, 0.5, 0.5])
            .unwrap();
        assert!(src.has_column("x"));
        assert!(!src.has_column("y"));
        assert_eq!(src.n_events(), 3);
        assert_eq!(src.column("w").unwrap(), vec![0.5, 0.5, 0.5]);
        assert!(src.column("y").is_err());
    }

    #[test]
    fn test_column_or_fallback() {
        let src = MemorySource::new().with_column("x", vec![1.0, 2.0]).unwrap();
        assert_eq!(src.column_or("x", 1.0).unwrap(), vec![1.0, 2.0]);
        assert_eq!(src.column_or("weight", 1.0).unwrap(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_column_length_mismatch() {
        let res = MemorySource::new()
            .with_column("x", vec![1.0, 2.0])
            .unwrap()
            .with_column("y", vec![1.0]);
        assert!(res.is_err());
    }
}
