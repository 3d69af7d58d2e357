//! Ignition risk engine
//!
//! Combines per-cell terrain attributes, the current weather snapshot and
//! power-line proximity into a single ignition risk index in [0, 1].
//!
//! # Model
//!
//! Six normalized components are blended with fixed weights:
//!
//! ```text
//! wind      = clip(V / 80) × wind_exposure
//! humidity  = clip(1 − RH / 50)
//! fuel      = fuel_density
//! moisture  = clip(1 − fuel_moisture / 0.25)
//! slope     = clip(slope / 40)
//! proximity = line exposure (already [0, 1])
//! ```
//!
//! Two interaction terms model compounding danger: `wind × moisture × 0.5`
//! everywhere, and `0.15 × fuel` where `wind > 0.5`. The sum is clipped to
//! [0, 1] and rounded to 4 decimals.
//!
//! The pass is pure: identical inputs always give an identical grid. The
//! optional [`Perturbation`] is seeded hash noise, so it keeps that property.

use crate::core_types::noise::cell_gaussian;
use crate::core_types::units::{clip01, round_to};
use crate::core_types::WeatherState;
use crate::error::ScenarioError;
use crate::grid::{GridTopology, LineSet, TerrainCell, TerrainGrid};
use crate::risk::proximity::{compute_proximity, ProximityModel};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Risk category thresholds. Each upper bound is inclusive, so a risk of
/// exactly 0.3 is still Low and exactly 0.75 is still High.
pub mod thresholds {
    /// Upper bound of "Low"
    pub const LOW_MAX: f64 = 0.3;
    /// Upper bound of "Moderate"
    pub const MODERATE_MAX: f64 = 0.55;
    /// Upper bound of "High"; anything above is "Extreme"
    pub const HIGH_MAX: f64 = 0.75;
}

/// Categorical binning of the ignition risk index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
    Extreme,
}

impl RiskCategory {
    /// Bin a risk value; a pure function of `risk` alone
    pub fn from_risk(risk: f64) -> Self {
        if risk <= thresholds::LOW_MAX {
            RiskCategory::Low
        } else if risk <= thresholds::MODERATE_MAX {
            RiskCategory::Moderate
        } else if risk <= thresholds::HIGH_MAX {
            RiskCategory::High
        } else {
            RiskCategory::Extreme
        }
    }
}

/// RGBA display color for a risk value
///
/// Color bands use strict lower bounds, so a risk sitting exactly on a
/// category threshold already takes the next band's color.
pub fn risk_color(risk: f64) -> [u8; 4] {
    if risk < thresholds::LOW_MAX {
        [46, 204, 113, 140]
    } else if risk < thresholds::MODERATE_MAX {
        [241, 196, 15, 160]
    } else if risk < thresholds::HIGH_MAX {
        [231, 76, 60, 180]
    } else {
        [192, 57, 43, 220]
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskCategory::Low => "Low",
            RiskCategory::Moderate => "Moderate",
            RiskCategory::High => "High",
            RiskCategory::Extreme => "Extreme",
        };
        f.write_str(s)
    }
}

/// Blend weights for the six risk components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskWeights {
    pub wind: f64,
    pub humidity: f64,
    pub fuel_density: f64,
    pub fuel_moisture: f64,
    pub slope: f64,
    pub proximity: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            wind: 0.30,
            humidity: 0.20,
            fuel_density: 0.20,
            fuel_moisture: 0.10,
            slope: 0.10,
            proximity: 0.10,
        }
    }
}

impl RiskWeights {
    /// Tolerance on the weight sum
    const SUM_TOLERANCE: f64 = 1e-6;

    fn as_array(&self) -> [f64; 6] {
        [
            self.wind,
            self.humidity,
            self.fuel_density,
            self.fuel_moisture,
            self.slope,
            self.proximity,
        ]
    }

    /// Check that weights are finite, non-negative and sum to 1
    ///
    /// # Errors
    /// Returns [`ScenarioError::InvalidWeights`] otherwise.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let weights = self.as_array();
        let sum: f64 = weights.iter().sum();
        let all_valid = weights.iter().all(|w| w.is_finite() && *w >= 0.0);
        if all_valid && (sum - 1.0).abs() <= Self::SUM_TOLERANCE {
            Ok(())
        } else {
            Err(ScenarioError::InvalidWeights(sum.to_string()))
        }
    }
}

/// Seeded per-cell texture added before clipping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Perturbation {
    /// Noise seed
    pub seed: u32,
    /// Standard deviation of the added noise
    pub amplitude: f64,
}

impl Default for Perturbation {
    fn default() -> Self {
        Self {
            seed: 42,
            amplitude: 0.03,
        }
    }
}

/// Settings for a risk pass
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Component weights
    pub weights: RiskWeights,
    /// Cell-to-line distance model
    pub proximity: ProximityModel,
    /// Optional visual texture; `None` keeps the pass noise-free
    pub perturbation: Option<Perturbation>,
}

/// Normalized risk components for one cell, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskComponents {
    pub wind: f64,
    pub humidity: f64,
    pub fuel: f64,
    pub moisture: f64,
    pub slope: f64,
    pub proximity: f64,
}

impl RiskComponents {
    /// Normalize a cell's attributes under `weather`
    pub fn new(cell: &TerrainCell, weather: &WeatherState, proximity: f64) -> Self {
        Self {
            wind: clip01(*weather.wind_speed / 80.0) * clip01(cell.wind_exposure),
            humidity: clip01(1.0 - *weather.humidity / 50.0),
            fuel: clip01(cell.fuel_density),
            moisture: clip01(1.0 - cell.fuel_moisture / 0.25),
            slope: clip01(cell.slope / 40.0),
            proximity: clip01(proximity),
        }
    }

    /// Weighted sum plus interaction terms, unclipped
    pub fn combine(&self, weights: &RiskWeights) -> f64 {
        let base = weights.wind * self.wind
            + weights.humidity * self.humidity
            + weights.fuel_density * self.fuel
            + weights.fuel_moisture * self.moisture
            + weights.slope * self.slope
            + weights.proximity * self.proximity;

        // Wind + dry fuel is worse than the sum of its parts
        let compound_boost = self.wind * self.moisture * 0.5;
        let exposure_boost = if self.wind > 0.5 { 0.15 * self.fuel } else { 0.0 };

        base + compound_boost + exposure_boost
    }
}

/// Ignition risk for one cell, clipped and rounded to 4 decimals
pub fn ignition_risk(
    cell: &TerrainCell,
    weather: &WeatherState,
    proximity: f64,
    config: &RiskConfig,
) -> f64 {
    let mut risk = RiskComponents::new(cell, weather, proximity).combine(&config.weights);
    if let Some(p) = config.perturbation {
        risk += p.amplitude * cell_gaussian(cell.i, cell.j, p.seed);
    }
    round_to(clip01(risk), 4)
}

/// Terrain cell annotated with its ignition risk
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskCell {
    /// Underlying terrain sample
    pub cell: TerrainCell,
    /// Line proximity exposure used for this pass
    pub proximity: f64,
    /// Ignition risk index [0, 1]
    pub ignition_risk: f64,
    /// Category of `ignition_risk`
    pub risk_category: RiskCategory,
    /// Display color (RGBA)
    pub risk_color: [u8; 4],
    /// Column height for 3D display
    pub risk_height: u32,
    /// Exaggerated terrain height for 3D display
    pub terrain_height: u32,
}

impl RiskCell {
    fn new(cell: TerrainCell, proximity: f64, ignition_risk: f64) -> Self {
        let risk_category = RiskCategory::from_risk(ignition_risk);
        Self {
            cell,
            proximity,
            ignition_risk,
            risk_category,
            risk_color: risk_color(ignition_risk),
            risk_height: (ignition_risk * 800.0) as u32,
            terrain_height: (cell.elevation * 2.0).max(0.0) as u32,
        }
    }
}

/// Cell counts per risk category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub low: usize,
    pub moderate: usize,
    pub high: usize,
    pub extreme: usize,
}

/// Derived grid produced by one risk pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskGrid {
    rows: usize,
    cols: usize,
    cells: Vec<RiskCell>,
}

impl RiskGrid {
    /// Annotated cells in row-major order
    pub fn cells(&self) -> &[RiskCell] {
        &self.cells
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the grid has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Mean ignition risk (0 for an empty grid)
    pub fn mean_risk(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.cells.iter().map(|c| c.ignition_risk).sum::<f64>() / self.cells.len() as f64
    }

    /// Highest-risk cell; ties resolve to the first in row-major order
    pub fn max_cell(&self) -> Option<&RiskCell> {
        self.cells.iter().reduce(|best, c| {
            if c.ignition_risk > best.ignition_risk {
                c
            } else {
                best
            }
        })
    }

    /// Number of cells with risk strictly above `threshold`
    pub fn count_above(&self, threshold: f64) -> usize {
        self.cells
            .iter()
            .filter(|c| c.ignition_risk > threshold)
            .count()
    }

    /// Cell counts per category
    pub fn category_counts(&self) -> CategoryCounts {
        self.cells
            .iter()
            .fold(CategoryCounts::default(), |mut acc, c| {
                match c.risk_category {
                    RiskCategory::Low => acc.low += 1,
                    RiskCategory::Moderate => acc.moderate += 1,
                    RiskCategory::High => acc.high += 1,
                    RiskCategory::Extreme => acc.extreme += 1,
                }
                acc
            })
    }
}

/// Score every cell of `grid` given a precomputed proximity array
///
/// # Errors
/// Returns [`ScenarioError::ProximityMismatch`] if `proximity` doesn't have
/// one entry per cell, or [`ScenarioError::InvalidWeights`] if the weights in
/// `config` don't validate.
pub fn compute_ignition_risk(
    grid: &TerrainGrid,
    proximity: &[f64],
    weather: &WeatherState,
    config: &RiskConfig,
) -> Result<RiskGrid, ScenarioError> {
    config.weights.validate()?;
    if proximity.len() != grid.len() {
        return Err(ScenarioError::ProximityMismatch {
            expected: grid.len(),
            got: proximity.len(),
        });
    }

    Ok(score_cells(grid, proximity, weather, config))
}

/// Proximity + risk in one call for a given disabled-line set
///
/// # Errors
/// Returns [`ScenarioError::InvalidWeights`] if the weights in `config` don't
/// validate.
pub fn assess_risk(
    grid: &TerrainGrid,
    topology: &GridTopology,
    disabled: &LineSet,
    weather: &WeatherState,
    config: &RiskConfig,
) -> Result<RiskGrid, ScenarioError> {
    config.weights.validate()?;
    Ok(assess_validated(grid, topology, disabled, weather, config))
}

/// [`assess_risk`] for a config whose weights are already known to validate
pub(crate) fn assess_validated(
    grid: &TerrainGrid,
    topology: &GridTopology,
    disabled: &LineSet,
    weather: &WeatherState,
    config: &RiskConfig,
) -> RiskGrid {
    let proximity = compute_proximity(grid, topology, disabled, config.proximity);
    score_cells(grid, &proximity, weather, config)
}

fn score_cells(
    grid: &TerrainGrid,
    proximity: &[f64],
    weather: &WeatherState,
    config: &RiskConfig,
) -> RiskGrid {
    let cells: Vec<RiskCell> = grid
        .cells()
        .par_iter()
        .zip(proximity.par_iter())
        .map(|(cell, &prox)| {
            let prox = clip01(prox);
            RiskCell::new(*cell, prox, ignition_risk(cell, weather, prox, config))
        })
        .collect();

    let risk = RiskGrid {
        rows: grid.rows(),
        cols: grid.cols(),
        cells,
    };
    debug!(
        "Risk pass: {} cells, mean {:.4}, {} extreme",
        risk.len(),
        risk.mean_risk(),
        risk.count_above(thresholds::HIGH_MAX)
    );
    risk
}
