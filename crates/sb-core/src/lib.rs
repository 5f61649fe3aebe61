//! # sb-core
//!
//! Shared data model for the statband statistical core.
//!
//! This crate defines the value types exchanged between the binning,
//! systematics, and cut-flow crates (`Partition`, `CovarianceMatrix`,
//! `BinnedHistogram`, `StageCount`) together with the `EventSource`
//! seam trait through which the orchestration layer hands us lazy
//! columnar event data.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Error taxonomy and `Result` alias.
pub mod error;
/// Weighted binned histogram and single-pass filling.
pub mod histogram;
/// Seam traits towards the event-source collaborator.
pub mod traits;
/// Partitions, covariance matrices, staged selection counts.
pub mod types;

pub use error::{Error, Result};
pub use histogram::BinnedHistogram;
pub use traits::{EventSource, MemorySource};
pub use types::{CovarianceMatrix, Partition, StageCount, WeightTotal};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
