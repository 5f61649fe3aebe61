//! Error types for statband.

use thiserror::Error;

/// statband error type.
///
/// Dimension mismatches between covariance contributions are deliberately
/// not represented here: they are non-fatal and handled by skipping the
/// offending contribution with a warning.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed call: size mismatches, empty required sequences.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Input that is structurally valid but statistically unusable
    /// (non-positive weights, duplicate values without pre-aggregation).
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// Numerical computation error.
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
