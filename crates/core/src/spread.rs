//! Fire spread perimeter projection
//!
//! A wind-driven ellipse around the ignition point, sized by a simplified
//! Rothermel-style rate:
//!
//! ```text
//! rate  = 0.002 °/h × (1 + (V / 20)^1.3) × (1 + (1 − RH / 100) × 0.5)
//! shape = (0.2 + 0.8 × (1 + cos(θ − wind_dir)) / 2)^(1 + min(0.9, V / 60))
//! r(θ)  = rate × hours × shape
//! ```
//!
//! `θ` is a compass bearing: north is +lat, east is +lon, and longitude
//! offsets are stretched by `1 / cos(lat)` so the perimeter keeps its shape
//! on the ground.

use crate::core_types::units::round_to;
use crate::core_types::WeatherState;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::debug;

/// Base spread rate (degrees per hour)
pub const BASE_RATE: f64 = 0.002;

/// Angular samples around the ignition point (first and last coincide)
pub const PERIMETER_SAMPLES: usize = 36;

/// Default projection horizons (hours)
pub const DEFAULT_HORIZONS: [f64; 4] = [3.0, 6.0, 12.0, 24.0];

/// Display colors for the default horizons, by position
const HORIZON_COLORS: [[u8; 4]; 4] = [
    [255, 193, 7, 60],
    [255, 152, 0, 60],
    [244, 67, 54, 60],
    [136, 14, 79, 60],
];

/// Color for any horizon past the fourth
const EXTRA_HORIZON_COLOR: [u8; 4] = [100, 100, 100, 40];

/// Closed ring of `[lon, lat]` vertices
pub type Perimeter = Vec<[f64; 2]>;

/// Ignition location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IgnitionPoint {
    pub lat: f64,
    pub lon: f64,
}

impl IgnitionPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Projected perimeter for one horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadScenario {
    /// Hours since ignition
    pub hours: f64,
    /// Closed perimeter ring
    pub polygon: Perimeter,
    /// Display color (RGBA)
    pub color: [u8; 4],
}

/// Linear spread rate under `weather` (degrees per hour)
pub fn spread_rate(weather: &WeatherState) -> f64 {
    let wind_factor = 1.0 + (*weather.wind_speed / 20.0).powf(1.3);
    let humidity_factor = 1.0 + (1.0 - *weather.humidity / 100.0) * 0.5;
    BASE_RATE * wind_factor * humidity_factor
}

/// Relative spread along `bearing` (radians); 1 straight downwind
fn shape_factor(weather: &WeatherState, bearing: f64) -> f64 {
    let from_wind = bearing - weather.wind_direction.to_radians();
    let eccentricity = (*weather.wind_speed / 60.0).min(0.9);
    (0.2 + 0.8 * (1.0 + from_wind.cos()) / 2.0).powf(1.0 + eccentricity)
}

/// Perimeter distance from the ignition point along `bearing_deg` after
/// `hours` (degrees)
pub fn spread_radius(weather: &WeatherState, hours: f64, bearing_deg: f64) -> f64 {
    spread_rate(weather) * hours.max(0.0) * shape_factor(weather, bearing_deg.to_radians())
}

/// Perimeter after `hours`, as a closed ring of
/// [`PERIMETER_SAMPLES`] + 1 vertices rounded to 6 decimals
///
/// Negative or non-finite `hours` collapse the ring onto the ignition point.
pub fn fire_spread_cone(ignition: IgnitionPoint, weather: &WeatherState, hours: f64) -> Perimeter {
    let rate = spread_rate(weather);
    let hours = if hours.is_finite() { hours.max(0.0) } else { 0.0 };
    let lon_scale = 1.0 / ignition.lat.to_radians().cos().max(1e-6);

    // Endpoint-inclusive sweep, so the last sample repeats the first bearing
    let step = TAU / (PERIMETER_SAMPLES - 1) as f64;
    let mut ring: Perimeter = (0..PERIMETER_SAMPLES)
        .map(|k| {
            let bearing = step * k as f64;
            let distance = rate * hours * shape_factor(weather, bearing);
            [
                round_to(ignition.lon + distance * bearing.sin() * lon_scale, 6),
                round_to(ignition.lat + distance * bearing.cos(), 6),
            ]
        })
        .collect();

    if let Some(&first) = ring.first() {
        ring.push(first);
    }
    ring
}

/// Perimeters for several horizons, each computed independently
pub fn spread_scenarios(
    ignition: IgnitionPoint,
    weather: &WeatherState,
    horizons: &[f64],
) -> Vec<SpreadScenario> {
    debug!(
        "Projecting spread from ({:.4}, {:.4}) for {} horizons",
        ignition.lat,
        ignition.lon,
        horizons.len()
    );
    horizons
        .iter()
        .enumerate()
        .map(|(i, &hours)| SpreadScenario {
            hours,
            polygon: fire_spread_cone(ignition, weather, hours),
            color: HORIZON_COLORS.get(i).copied().unwrap_or(EXTRA_HORIZON_COLOR),
        })
        .collect()
}
