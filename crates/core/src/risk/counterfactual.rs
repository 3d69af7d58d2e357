//! Before/after comparison of two risk passes over the same terrain

use crate::core_types::units::round_to;
use crate::error::ScenarioError;
use crate::risk::engine::{thresholds, RiskGrid};
use serde::{Deserialize, Serialize};

/// Aggregate risk delta attributable to an intervention
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskReduction {
    /// Mean risk before (4 decimals)
    pub mean_risk_before: f64,
    /// Mean risk after (4 decimals)
    pub mean_risk_after: f64,
    /// `before - after` (4 decimals)
    pub risk_reduction_abs: f64,
    /// Reduction as a percentage of `before` (2 decimals), 0 if `before` is 0
    pub risk_reduction_pct: f64,
    /// Cells above the Extreme threshold before
    pub extreme_cells_before: usize,
    /// Cells above the Extreme threshold after
    pub extreme_cells_after: usize,
    /// `before - after`; negative if the intervention made things worse
    pub extreme_cells_eliminated: i64,
    /// Cells above the High threshold before
    pub high_risk_cells_before: usize,
    /// Cells above the High threshold after
    pub high_risk_cells_after: usize,
}

/// Compare two risk grids cell-for-cell
///
/// # Errors
/// Returns [`ScenarioError::GridMismatch`] if the grids differ in size.
pub fn compute_risk_reduction(
    before: &RiskGrid,
    after: &RiskGrid,
) -> Result<RiskReduction, ScenarioError> {
    if before.len() != after.len() {
        return Err(ScenarioError::GridMismatch {
            before: before.len(),
            after: after.len(),
        });
    }

    let mean_before = before.mean_risk();
    let mean_after = after.mean_risk();
    let pct = if mean_before > 0.0 {
        (mean_before - mean_after) / mean_before * 100.0
    } else {
        0.0
    };

    let extreme_before = before.count_above(thresholds::HIGH_MAX);
    let extreme_after = after.count_above(thresholds::HIGH_MAX);

    Ok(RiskReduction {
        mean_risk_before: round_to(mean_before, 4),
        mean_risk_after: round_to(mean_after, 4),
        risk_reduction_abs: round_to(mean_before - mean_after, 4),
        risk_reduction_pct: round_to(pct, 2),
        extreme_cells_before: extreme_before,
        extreme_cells_after: extreme_after,
        extreme_cells_eliminated: extreme_before as i64 - extreme_after as i64,
        high_risk_cells_before: before.count_above(thresholds::MODERATE_MAX),
        high_risk_cells_after: after.count_above(thresholds::MODERATE_MAX),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::WeatherState;
    use crate::grid::{GridTopology, LineSet, TerrainConfig, TerrainGrid, TopologyData};
    use crate::risk::engine::{assess_risk, compute_ignition_risk, RiskConfig};
    use approx::assert_abs_diff_eq;

    fn terrain() -> TerrainGrid {
        TerrainGrid::generate(&TerrainConfig {
            rows: 16,
            cols: 16,
            step_lat: 0.012,
            step_lon: 0.015,
            ..TerrainConfig::default()
        })
    }

    #[test]
    fn test_self_comparison_is_zero() {
        let grid = terrain();
        let topo = GridTopology::new(TopologyData::sonoma_demo()).unwrap();
        let risk = assess_risk(
            &grid,
            &topo,
            &LineSet::new(),
            &WeatherState::red_flag(),
            &RiskConfig::default(),
        )
        .unwrap();
        let r = compute_risk_reduction(&risk, &risk).unwrap();
        assert_eq!(r.risk_reduction_pct, 0.0);
        assert_eq!(r.risk_reduction_abs, 0.0);
        assert_eq!(r.extreme_cells_eliminated, 0);
        assert_eq!(r.mean_risk_before, r.mean_risk_after);
    }

    #[test]
    fn test_shutoff_reduces_risk() {
        let grid = terrain();
        let topo = GridTopology::new(TopologyData::sonoma_demo()).unwrap();
        let wx = WeatherState::red_flag();
        let config = RiskConfig::default();
        let before = assess_risk(&grid, &topo, &LineSet::new(), &wx, &config).unwrap();
        let all: LineSet = topo.lines().iter().map(|l| l.line.id.clone()).collect();
        let after = assess_risk(&grid, &topo, &all, &wx, &config).unwrap();

        let r = compute_risk_reduction(&before, &after).unwrap();
        assert!(r.risk_reduction_abs >= 0.0);
        assert!(r.risk_reduction_pct >= 0.0);
        assert!(r.extreme_cells_eliminated >= 0);
        assert!(r.high_risk_cells_after <= r.high_risk_cells_before);
    }

    #[test]
    fn test_worse_after_is_negative() {
        let grid = terrain();
        let prox = vec![0.0; grid.len()];
        let config = RiskConfig::default();
        let calm = compute_ignition_risk(&grid, &prox, &WeatherState::mild(), &config).unwrap();
        let storm = compute_ignition_risk(&grid, &prox, &WeatherState::red_flag(), &config).unwrap();

        let r = compute_risk_reduction(&calm, &storm).unwrap();
        assert!(r.risk_reduction_abs < 0.0);
        assert!(r.risk_reduction_pct < 0.0);
        assert!(r.extreme_cells_eliminated <= 0);
        assert_abs_diff_eq!(r.risk_reduction_pct, round_to(r.risk_reduction_pct, 2));
    }

    #[test]
    fn test_size_mismatch() {
        let a = terrain();
        let b = TerrainGrid::generate(&TerrainConfig {
            rows: 4,
            cols: 4,
            ..TerrainConfig::default()
        });
        let config = RiskConfig::default();
        let wx = WeatherState::red_flag();
        let ra = compute_ignition_risk(&a, &vec![0.0; a.len()], &wx, &config).unwrap();
        let rb = compute_ignition_risk(&b, &vec![0.0; b.len()], &wx, &config).unwrap();
        assert_eq!(
            compute_risk_reduction(&ra, &rb),
            Err(ScenarioError::GridMismatch {
                before: 256,
                after: 16
            })
        );
    }
}
