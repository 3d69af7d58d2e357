//! Power-line proximity exposure per terrain cell
//!
//! Each energized line contributes `exp(-d / DECAY) * vegetation_risk`, where
//! `d` is the planar distance in coordinate-degree space; a cell keeps the
//! maximum over all lines. De-energized lines contribute nothing, which is
//! how a shutoff plan changes the risk surface.

use crate::grid::{GridTopology, LineSet, ResolvedLine, TerrainGrid};
use crate::core_types::units::clip01;
use nalgebra::Vector2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Spatial decay constant (degrees)
pub const DECAY: f64 = 0.02;

/// How the cell-to-line distance is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProximityModel {
    /// Distance to the span midpoint (output-compatible default)
    #[default]
    Midpoint,
    /// True point-to-segment distance
    Segment,
}

impl ProximityModel {
    /// Distance from `p` to `line` under this model
    pub fn distance(self, p: Vector2<f64>, line: &ResolvedLine) -> f64 {
        match self {
            ProximityModel::Midpoint => (p - line.midpoint()).norm(),
            ProximityModel::Segment => point_segment_distance(p, line.start, line.end),
        }
    }
}

/// Shortest distance from `p` to the segment `a`-`b`
fn point_segment_distance(p: Vector2<f64>, a: Vector2<f64>, b: Vector2<f64>) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 <= f64::EPSILON {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Proximity exposure for every cell in `grid`, in row-major order
///
/// Lines that are inactive in the base topology or listed in `disabled` are
/// skipped. Values are in [0, 1]; a grid with no energized lines is all zero.
pub fn compute_proximity(
    grid: &TerrainGrid,
    topology: &GridTopology,
    disabled: &LineSet,
    model: ProximityModel,
) -> Vec<f64> {
    let active: Vec<&ResolvedLine> = topology.active_lines(disabled).collect();
    debug!(
        "Computing proximity for {} cells against {} active lines ({:?})",
        grid.len(),
        active.len(),
        model
    );

    grid.cells()
        .par_iter()
        .map(|cell| {
            let p = Vector2::new(cell.lon, cell.lat);
            let exposure = active
                .iter()
                .map(|line| {
                    let d = model.distance(p, line);
                    (-d / DECAY).exp() * line.line.vegetation_risk
                })
                .fold(0.0_f64, f64::max);
            clip01(exposure)
        })
        .collect()
}
