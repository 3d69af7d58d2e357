//! Terrain grid with static per-cell physical attributes
//!
//! The grid is a row-major sequence of [`TerrainCell`]s indexed by `(i, j)`.
//! It is generated once per session and read-only afterwards; every risk
//! pass derives a fresh grid from it instead of mutating it.

use crate::core_types::noise::gaussian;
use crate::core_types::units::round_to;
use crate::error::TerrainError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// A single terrain sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainCell {
    /// Latitude (degrees)
    pub lat: f64,
    /// Longitude (degrees)
    pub lon: f64,
    /// Elevation (meters)
    pub elevation: f64,
    /// Slope (degrees, 0 = flat)
    pub slope: f64,
    /// Fuel density [0, 1]
    pub fuel_density: f64,
    /// Fuel moisture content [0, 1]
    pub fuel_moisture: f64,
    /// Exposure to prevailing wind [0, 1]
    pub wind_exposure: f64,
    /// Row index
    pub i: usize,
    /// Column index
    pub j: usize,
}

/// Parameters for synthetic terrain generation
///
/// Defaults reproduce the Sonoma County foothills scenario: a 40×40 grid of
/// roughly 550 m cells centered on 38.52°N, 122.82°W.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// Latitude of the grid center
    pub center_lat: f64,
    /// Longitude of the grid center
    pub center_lon: f64,
    /// Number of rows (i)
    pub rows: usize,
    /// Number of columns (j)
    pub cols: usize,
    /// Latitude step between rows (degrees)
    pub step_lat: f64,
    /// Longitude step between columns (degrees)
    pub step_lon: f64,
    /// RNG seed
    pub seed: u64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            center_lat: 38.52,
            center_lon: -122.82,
            rows: 40,
            cols: 40,
            step_lat: 0.005, // ~550 m
            step_lon: 0.006,
            seed: 42,
        }
    }
}

/// Row-major terrain grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainGrid {
    rows: usize,
    cols: usize,
    cells: Vec<TerrainCell>,
}

impl TerrainGrid {
    /// Generate rolling foothill terrain: two ridges, a developed valley
    /// floor, and fuel/wind attributes that follow elevation
    ///
    /// Identical configs always produce identical grids.
    pub fn generate(config: &TerrainConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let rows = config.rows;
        let cols = config.cols;

        // Feature positions and widths are laid out for 40×40 and scale with the grid
        let ri = rows as f64 / 40.0;
        let rj = cols as f64 / 40.0;
        let area = (ri * rj).max(f64::EPSILON);
        let ridge1 = (10.0 * ri, 30.0 * rj, 80.0 * area);
        let ridge2 = (30.0 * ri, 15.0 * rj, 60.0 * area);
        let valley = (20.0 * ri, 20.0 * rj, 120.0 * area);
        let developed_width = 200.0 * area;

        let bump = |i: f64, j: f64, (ci, cj, w): (f64, f64, f64)| {
            (-((i - ci).powi(2) + (j - cj).powi(2)) / w).exp()
        };

        let mut cells = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                let fi = i as f64;
                let fj = j as f64;

                let lat = config.center_lat - (rows as f64 / 2.0 - fi) * config.step_lat;
                let lon = config.center_lon - (cols as f64 / 2.0 - fj) * config.step_lon;

                let ridge_1 = 300.0 * bump(fi, fj, ridge1);
                let ridge_2 = 250.0 * bump(fi, fj, ridge2);
                let valley_dip = -100.0 * bump(fi, fj, valley);
                let elevation =
                    (150.0 + ridge_1 + ridge_2 + valley_dip + gaussian(&mut rng, 0.0, 20.0))
                        .max(30.0);

                let slope =
                    ((ridge_1 + ridge_2) / 15.0 + gaussian(&mut rng, 5.0, 3.0)).clamp(0.0, 45.0);

                // Fuel thins out toward the developed valley floor
                let developed = bump(fi, fj, (valley.0, valley.1, developed_width));
                let fuel_density = (0.3 + 0.5 * (elevation / 500.0) - 0.4 * developed
                    + gaussian(&mut rng, 0.0, 0.1))
                .clamp(0.05, 1.0);

                let fuel_moisture = (0.06 + 0.04 * rng.random::<f64>() + 0.1 * (1.0 - fuel_density))
                    .clamp(0.03, 0.25);

                // Ridges catch more wind
                let wind_exposure = (0.3 + 0.7 * (elevation / 500.0)
                    + gaussian(&mut rng, 0.0, 0.05))
                .clamp(0.1, 1.0);

                cells.push(TerrainCell {
                    lat: round_to(lat, 6),
                    lon: round_to(lon, 6),
                    elevation: round_to(elevation, 1),
                    slope: round_to(slope, 1),
                    fuel_density: round_to(fuel_density, 3),
                    fuel_moisture: round_to(fuel_moisture, 3),
                    wind_exposure: round_to(wind_exposure, 3),
                    i,
                    j,
                });
            }
        }

        TerrainGrid { rows, cols, cells }
    }

    /// Build a grid from caller-supplied cells
    ///
    /// # Errors
    /// Returns [`TerrainError`] if the cell count doesn't match `rows × cols`
    /// or the cells aren't in row-major `(i, j)` order.
    pub fn from_cells(
        rows: usize,
        cols: usize,
        cells: Vec<TerrainCell>,
    ) -> Result<Self, TerrainError> {
        let expected = rows * cols;
        if cells.len() != expected {
            return Err(TerrainError::DimensionMismatch {
                expected,
                got: cells.len(),
            });
        }
        for (index, cell) in cells.iter().enumerate() {
            if cell.i != index / cols || cell.j != index % cols {
                return Err(TerrainError::OutOfOrder {
                    index,
                    i: cell.i,
                    j: cell.j,
                });
            }
        }
        Ok(TerrainGrid { rows, cols, cells })
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// All cells in row-major order
    pub fn cells(&self) -> &[TerrainCell] {
        &self.cells
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the grid has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at `(i, j)`
    pub fn get(&self, i: usize, j: usize) -> Option<&TerrainCell> {
        if i < self.rows && j < self.cols {
            self.cells.get(i * self.cols + j)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(i: usize, j: usize) -> TerrainCell {
        TerrainCell {
            lat: 38.5,
            lon: -122.8,
            elevation: 100.0,
            slope: 5.0,
            fuel_density: 0.5,
            fuel_moisture: 0.1,
            wind_exposure: 0.5,
            i,
            j,
        }
    }

    #[test]
    fn test_generate_default_grid() {
        let grid = TerrainGrid::generate(&TerrainConfig::default());
        assert_eq!(grid.len(), 1600);
        assert_eq!(grid.rows(), 40);
        assert_eq!(grid.cols(), 40);

        for (idx, c) in grid.cells().iter().enumerate() {
            assert_eq!(c.i * 40 + c.j, idx);
            assert!(c.elevation >= 30.0);
            assert!((0.0..=45.0).contains(&c.slope));
            assert!((0.05..=1.0).contains(&c.fuel_density));
            assert!((0.03..=0.25).contains(&c.fuel_moisture));
            assert!((0.1..=1.0).contains(&c.wind_exposure));
        }
    }

    #[test]
    fn test_generate_reproducible() {
        let a = TerrainGrid::generate(&TerrainConfig::default());
        let b = TerrainGrid::generate(&TerrainConfig::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_coordinates_follow_indices() {
        let grid = TerrainGrid::generate(&TerrainConfig::default());
        let first = grid.get(0, 0).unwrap();
        let next_row = grid.get(1, 0).unwrap();
        let next_col = grid.get(0, 1).unwrap();
        assert!(next_row.lat > first.lat);
        assert!(next_col.lon > first.lon);
        assert!((first.lat - (38.52 - 20.0 * 0.005)).abs() < 1e-6);
    }

    #[test]
    fn test_ridge_higher_than_valley() {
        let grid = TerrainGrid::generate(&TerrainConfig::default());
        let ridge = grid.get(10, 30).unwrap().elevation;
        let valley = grid.get(20, 20).unwrap().elevation;
        assert!(ridge > valley + 100.0, "ridge {ridge} valley {valley}");
    }

    #[test]
    fn test_get_out_of_bounds() {
        let grid = TerrainGrid::generate(&TerrainConfig {
            rows: 4,
            cols: 5,
            ..TerrainConfig::default()
        });
        assert_eq!(grid.len(), 20);
        assert!(grid.get(3, 4).is_some());
        assert!(grid.get(4, 0).is_none());
        assert!(grid.get(0, 5).is_none());
    }

    #[test]
    fn test_from_cells_validation() {
        let ok = TerrainGrid::from_cells(1, 2, vec![cell(0, 0), cell(0, 1)]);
        assert!(ok.is_ok());

        let short = TerrainGrid::from_cells(2, 2, vec![cell(0, 0)]);
        assert_eq!(
            short,
            Err(TerrainError::DimensionMismatch {
                expected: 4,
                got: 1
            })
        );

        let swapped = TerrainGrid::from_cells(1, 2, vec![cell(0, 1), cell(0, 0)]);
        assert!(matches!(swapped, Err(TerrainError::OutOfOrder { index: 0, .. })));
    }
}
