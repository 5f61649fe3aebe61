//! Adaptive 2D binning of weighted point clouds.
//!
//! Recursively splits the domain rectangle into quadrants until each
//! cell's effective sample size `(Σw)²/Σw²` drops to the configured
//! minimum. Split coordinates are projected onto the global axes: the
//! final grid is the Cartesian product of all recorded x- and y-split
//! coordinates, not a hierarchical quad-tree. Downstream consumers
//! depend on this rectilinear grid shape.

use sb_core::{Error, EventSource, Partition, Result};

/// Configuration for [`partition_2d`].
#[derive(Debug, Clone)]
pub struct QuadConfig {
    /// Per-event weight column; events weigh 1.0 when absent.
    pub weight_column: String,
    /// Stop splitting once a cell's effective sample size is at or
    /// below this.
    pub min_effective_n: f64,
    /// Extend each axis by one extra edge on both sides, half the
    /// width of the outermost interval, creating explicit
    /// under/overflow bins.
    pub include_out_of_bounds: bool,
}

impl Default for QuadConfig {
    fn default() -> Self {
        Self {
            weight_column: "nominal_event_weight".into(),
            min_effective_n: 400.0,
            include_out_of_bounds: false,
        }
    }
}

struct Point {
    x: f64,
    y: f64,
    w: f64,
}

struct Cell {
    x_lo: f64,
    x_hi: f64,
    y_lo: f64,
    y_hi: f64,
    points: Vec<Point>,
}

/// Extreme finite values used by upstream producers to flag missing
/// data; both the f32 and f64 extrema are in circulation.
fn is_sentinel(v: f64) -> bool {
    v == f64::from(f32::MIN) || v == f64::from(f32::MAX) || v == f64::MIN || v == f64::MAX
}

/// Adaptive 2D binning of weighted point clouds.
///
/// Collects (x, y, weight) points from every source, drops malformed
/// and out-of-domain points, then recursively quadrant-splits until
/// each cell's effective sample size is bounded. Returns independent
/// x and y partitions whose domain is taken from the outermost edges
/// of `x_domain`/`y_domain`. An input that is empty after filtering
/// yields degenerate two-edge partitions, not an error.
pub fn partition_2d(
    sources: &[&dyn EventSource],
    x_column: &str,
    y_column: &str,
    x_domain: &Partition,
    y_domain: &Partition,
    config: &QuadConfig,
) -> Result<(Partition, Partition)> {
    let (x_lo, x_hi) = (x_domain.low(), x_domain.high());
    let (y_lo, y_hi) = (y_domain.low(), y_domain.high());

    let mut points = Vec::new();
    for source in sources {
        let xs = source.column(x_column)?;
        let ys = source.column(y_column)?;
        let ws = source.column_or(&config.weight_column, 1.0)?;
        if xs.len() != ys.len() || xs.len() != ws.len() {
            return Err(Error::InvalidInput(format!(
                "point source columns disagree in length: x={} y={} w={}",
                xs.len(),
                ys.len(),
                ws.len()
            )));
        }
        for ((&x, &y), &w) in xs.iter().zip(&ys).zip(&ws) {
            if !x.is_finite() || !y.is_finite() || !w.is_finite() || w <= 0.0 {
                continue;
            }
            if is_sentinel(x) || is_sentinel(y) {
                continue;
            }
            if x < x_lo || x > x_hi || y < y_lo || y > y_hi {
                continue;
            }
            points.push(Point { x, y, w });
        }
    }

    log::debug!("quad partition: {} points retained after filtering", points.len());

    let mut x_splits: Vec<f64> = Vec::new();
    let mut y_splits: Vec<f64> = Vec::new();

    // Explicit work-list instead of recursion: input clouds can be
    // large enough to make stack depth a concern.
    let mut work = vec![Cell { x_lo, x_hi, y_lo, y_hi, points }];
    while let Some(cell) = work.pop() {
        if cell.points.len() <= 1 {
            continue;
        }
        let sum_w: f64 = cell.points.iter().map(|p| p.w).sum();
        let sum_w2: f64 = cell.points.iter().map(|p| p.w * p.w).sum();
        let n_eff = sum_w * sum_w / sum_w2;
        if n_eff <= config.min_effective_n {
            continue;
        }

        let mid_x = 0.5 * (cell.x_lo + cell.x_hi);
        let mid_y = 0.5 * (cell.y_lo + cell.y_hi);
        // A rectangle narrowed to adjacent floats cannot split further.
        if !(cell.x_lo < mid_x && mid_x < cell.x_hi && cell.y_lo < mid_y && mid_y < cell.y_hi) {
            continue;
        }
        x_splits.push(mid_x);
        y_splits.push(mid_y);

        let mut quadrants: [Vec<Point>; 4] = [Vec::new(), Vec::new(), Vec::new(), Vec::new()];
        for p in cell.points {
            let qx = usize::from(p.x >= mid_x);
            let qy = usize::from(p.y >= mid_y);
            quadrants[qx * 2 + qy].push(p);
        }
        let bounds = [
            (cell.x_lo, mid_x, cell.y_lo, mid_y),
            (cell.x_lo, mid_x, mid_y, cell.y_hi),
            (mid_x, cell.x_hi, cell.y_lo, mid_y),
            (mid_x, cell.x_hi, mid_y, cell.y_hi),
        ];
        for (quadrant, (x_lo, x_hi, y_lo, y_hi)) in quadrants.into_iter().zip(bounds) {
            if !quadrant.is_empty() {
                work.push(Cell { x_lo, x_hi, y_lo, y_hi, points: quadrant });
            }
        }
    }

    let x_partition = assemble_axis(x_lo, x_hi, x_splits, config.include_out_of_bounds)?;
    let y_partition = assemble_axis(y_lo, y_hi, y_splits, config.include_out_of_bounds)?;
    Ok((x_partition, y_partition))
}

/// Turn one axis's domain bounds and collected split coordinates into
/// a partition. Duplicate splits from independent quadrant recursions
/// collapse; identical splits come from identical rectangle bounds, so
/// bitwise equality is the right identity.
fn assemble_axis(
    lo: f64,
    hi: f64,
    mut splits: Vec<f64>,
    include_out_of_bounds: bool,
) -> Result<Partition> {
    splits.retain(|&s| lo < s && s < hi);
    splits.sort_by(|a, b| a.total_cmp(b));
    splits.dedup();

    let mut edges = Vec::with_capacity(splits.len() + 4);
    edges.push(lo);
    edges.extend(splits);
    edges.push(hi);

    if include_out_of_bounds {
        let first_width = edges[1] - edges[0];
        let last_width = edges[edges.len() - 1] - edges[edges.len() - 2];
        edges.insert(0, lo - 0.5 * first_width);
        edges.push(hi + 0.5 * last_width);
    }
    Partition::new(edges)
}
