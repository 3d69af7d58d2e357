//! Per-line ignition contribution
//!
//! ```text
//! score = 0.35 × veg × wind + 0.25 × veg + 0.20 × age + 0.10 × wind + 0.10 × voltage
//! ```
//!
//! with `wind = clip(V / 60)`, `age = clip(years / 50)` and
//! `voltage = clip(kV / 230)`. Scores are capped at 1 and rounded to 4
//! decimals before any summation.

use crate::core_types::units::{clip01, round_to};
use crate::core_types::WeatherState;
use crate::grid::{GridTopology, PowerLine};
use std::collections::BTreeMap;

/// Ignition score for a single line under `weather`
pub fn line_risk_score(line: &PowerLine, weather: &WeatherState) -> f64 {
    let veg = clip01(line.vegetation_risk);
    let wind = clip01(*weather.wind_speed / 60.0);
    let age = clip01(line.age_years / 50.0);
    let voltage = clip01(line.voltage_kv / 230.0);

    // Wind-driven contact with vegetation dominates
    let score = 0.35 * veg * wind + 0.25 * veg + 0.20 * age + 0.10 * wind + 0.10 * voltage;
    round_to(score.min(1.0), 4)
}

/// Scores for every line, indexed like [`GridTopology::lines`]
pub(crate) fn line_scores_by_index(topology: &GridTopology, weather: &WeatherState) -> Vec<f64> {
    topology
        .lines()
        .iter()
        .map(|l| line_risk_score(&l.line, weather))
        .collect()
}

/// Scores for every line keyed by line id
pub fn compute_line_risk_scores(
    topology: &GridTopology,
    weather: &WeatherState,
) -> BTreeMap<String, f64> {
    topology
        .lines()
        .iter()
        .map(|l| (l.line.id.clone(), line_risk_score(&l.line, weather)))
        .collect()
}
