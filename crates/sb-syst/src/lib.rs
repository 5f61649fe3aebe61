//! # sb-syst
//!
//! Systematic-uncertainty machinery: pluggable variation strategies
//! that book deferred per-sample histogram fills against a binning,
//! reduce them to per-source covariance contributions, and an
//! aggregator that combines the statistical covariance with all
//! contributions into one sanitized total.
//!
//! The booking/reduction cycle for one variable is:
//!
//! 1. every enabled strategy books its fills for every sample into a
//!    shared [`BookingContext`] (no evaluation happens here),
//! 2. each strategy's `reduce` forces exactly its own entries and
//!    returns one covariance contribution,
//! 3. [`combine`] adds the contributions onto the statistical
//!    covariance, then the context is cleared for the next variable.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Covariance aggregation.
pub mod aggregate;
/// Deferred-fill booking context.
pub mod booking;
/// Detector-variation strategy (alternate event samples).
pub mod detector;
/// Strategy trait and selection.
pub mod strategy;
/// Multi-universe resampling strategy.
pub mod universes;
/// Weight-knob up/down strategy.
pub mod weight_knob;

pub use aggregate::combine;
pub use booking::{BookingContext, DeferredFill};
pub use detector::DetectorVariation;
pub use strategy::{select_strategies, VariationStrategy};
pub use universes::MultiUniverseVariation;
pub use weight_knob::WeightKnobVariation;
