//! # sb-binning
//!
//! Data-driven, non-uniform bin-edge computation for one- and
//! two-dimensional observables:
//!
//! - [`blocks`]: Bayesian Blocks, an O(N²) dynamic program finding the
//!   optimal piecewise-constant-rate partition of 1D weighted samples.
//! - [`quad`]: recursive effective-sample-size-bounded splitting of a
//!   weighted 2D point cloud into a rectilinear grid.
//!
//! Both produce [`sb_core::Partition`] edge lists consumed by the
//! histogram-construction layer.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Bayesian Blocks changepoint partitioning.
pub mod blocks;
/// Adaptive 2D binning of weighted point clouds.
pub mod quad;

pub use blocks::{partition_unweighted, partition_weighted, DEFAULT_PRIOR_P};
pub use quad::{partition_2d, QuadConfig};
