//! Weather snapshots and the hourly forecast timeline
//!
//! A [`WeatherState`] is a single immutable snapshot; every risk pass, plan
//! search and spread projection takes one by reference. The
//! [`WeatherTimeline`] is the 72-hour display sequence that a dashboard shows
//! next to the map; scoring never reads it.

use crate::core_types::noise::gaussian;
use crate::core_types::units::{Degrees, Fahrenheit, Fraction, MilesPerHour, Percent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Single weather snapshot driving one computation pass
///
/// All fields are sanitized on construction, so formulas downstream can rely
/// on finite, in-range values.
///
/// # Example
/// ```
/// use shutoff_core::WeatherState;
///
/// let wx = WeatherState::red_flag();
/// assert_eq!(*wx.wind_speed, 45.0);
/// assert_eq!(*wx.humidity, 8.0);
///
/// let calm = wx.with_wind_speed(0.0);
/// assert_eq!(*calm.wind_speed, 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherState {
    /// Sustained wind speed
    pub wind_speed: MilesPerHour,
    /// Peak gust speed
    pub wind_gust: MilesPerHour,
    /// Wind bearing (0° = North)
    pub wind_direction: Degrees,
    /// Air temperature
    pub temperature: Fahrenheit,
    /// Relative humidity
    pub humidity: Percent,
    /// Probability of lightning in the forecast window
    pub lightning_probability: Fraction,
    /// Forecast horizon in hours
    pub forecast_hours: u32,
}

impl WeatherState {
    /// Create a snapshot from raw values, clamping anything out of range
    pub fn new(
        wind_speed: f64,
        wind_gust: f64,
        wind_direction: f64,
        temperature: f64,
        humidity: f64,
        lightning_probability: f64,
    ) -> Self {
        WeatherState {
            wind_speed: MilesPerHour::new(wind_speed),
            wind_gust: MilesPerHour::new(wind_gust),
            wind_direction: Degrees::new(wind_direction),
            temperature: Fahrenheit::new(temperature),
            humidity: Percent::new(humidity),
            lightning_probability: Fraction::new(lightning_probability),
            forecast_hours: 72,
        }
    }

    /// Red Flag Warning preset
    ///
    /// Diablo wind event over the Sonoma foothills: 45 mph sustained from the
    /// NNE, 68 mph gusts, 98°F and 8% relative humidity.
    #[must_use]
    pub fn red_flag() -> Self {
        WeatherState::new(45.0, 68.0, 30.0, 98.0, 8.0, 0.05)
    }

    /// Mild autumn afternoon, useful as a low-risk baseline
    #[must_use]
    pub fn mild() -> Self {
        WeatherState::new(8.0, 12.0, 270.0, 72.0, 45.0, 0.0)
    }

    /// Copy with a different sustained wind speed
    #[must_use]
    pub fn with_wind_speed(self, wind_speed: f64) -> Self {
        WeatherState {
            wind_speed: MilesPerHour::new(wind_speed),
            ..self
        }
    }

    /// Copy with a different relative humidity
    #[must_use]
    pub fn with_humidity(self, humidity: f64) -> Self {
        WeatherState {
            humidity: Percent::new(humidity),
            ..self
        }
    }

    /// Copy with a different wind bearing
    #[must_use]
    pub fn with_wind_direction(self, direction: f64) -> Self {
        WeatherState {
            wind_direction: Degrees::new(direction),
            ..self
        }
    }

    /// Whether conditions meet the Red Flag criteria used in the demo
    /// (sustained wind ≥ 25 mph and humidity ≤ 15%)
    pub fn is_red_flag(&self) -> bool {
        *self.wind_speed >= 25.0 && *self.humidity <= 15.0
    }
}

impl Default for WeatherState {
    fn default() -> Self {
        WeatherState::red_flag()
    }
}

/// One hour of the forecast timeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyWeather {
    /// Hours from now
    pub hour: u32,
    /// Snapshot for that hour
    pub weather: WeatherState,
}

/// Hourly forecast sequence for display
///
/// Models a wind event that ramps up, peaks around hours 18-36 and slowly
/// decays, with humidity dropping as wind rises and a diurnal temperature
/// cycle on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherTimeline {
    hours: Vec<HourlyWeather>,
}

impl WeatherTimeline {
    /// Generate `hours` hourly snapshots around `base` with a seeded RNG
    pub fn generate(base: &WeatherState, hours: u32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let base_wind = *base.wind_speed;
        let base_humidity = *base.humidity;

        let hours = (0..hours)
            .map(|h| {
                let hf = f64::from(h);

                // Wind ramps up, peaks mid-event, then decays
                let phase = if h < 36 {
                    (PI * hf / 36.0).sin()
                } else {
                    (PI * (72.0 - hf) / 72.0).sin().max(0.3)
                };

                let wind = base_wind * (0.4 + 0.6 * phase) + gaussian(&mut rng, 0.0, 3.0);
                let gust = wind * (1.3 + 0.2 * rng.random::<f64>());

                // Humidity drops as the wind rises, never below 3%
                let humidity = (base_humidity * (1.5 - 0.5 * phase) + gaussian(&mut rng, 0.0, 2.0))
                    .max(3.0);

                // Diurnal cycle peaking mid-afternoon
                let hour_of_day = h % 24;
                let cycle = if (6..=18).contains(&hour_of_day) {
                    10.0 * (PI * (f64::from(hour_of_day) - 6.0) / 12.0).sin()
                } else {
                    -5.0
                };
                let temperature = *base.temperature + cycle + gaussian(&mut rng, 0.0, 2.0);

                let lightning = (*base.lightning_probability * phase
                    + gaussian(&mut rng, 0.0, 0.02))
                .clamp(0.0, 0.3);

                let direction = *base.wind_direction + gaussian(&mut rng, 0.0, 8.0);

                HourlyWeather {
                    hour: h,
                    weather: WeatherState {
                        wind_speed: MilesPerHour::new(wind.max(5.0)),
                        wind_gust: MilesPerHour::new(gust.max(8.0)),
                        wind_direction: Degrees::new(direction),
                        temperature: Fahrenheit::new(temperature),
                        humidity: Percent::new(humidity),
                        lightning_probability: Fraction::new(lightning),
                        forecast_hours: base.forecast_hours,
                    },
                }
            })
            .collect();

        WeatherTimeline { hours }
    }

    /// Hourly entries in time order
    pub fn hours(&self) -> &[HourlyWeather] {
        &self.hours
    }

    /// Number of hours in the timeline
    pub fn len(&self) -> usize {
        self.hours.len()
    }

    /// Whether the timeline is empty
    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    /// Hour with the strongest sustained wind (first one on ties)
    pub fn peak(&self) -> Option<&HourlyWeather> {
        self.hours.iter().reduce(|best, h| {
            if h.weather.wind_speed > best.weather.wind_speed {
                h
            } else {
                best
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_red_flag_preset() {
        let wx = WeatherState::red_flag();
        assert_eq!(*wx.wind_speed, 45.0);
        assert_eq!(*wx.wind_gust, 68.0);
        assert_eq!(*wx.wind_direction, 30.0);
        assert_eq!(*wx.temperature, 98.0);
        assert_eq!(*wx.humidity, 8.0);
        assert_eq!(*wx.lightning_probability, 0.05);
        assert_eq!(wx.forecast_hours, 72);
        assert!(wx.is_red_flag());
        assert!(!WeatherState::mild().is_red_flag());
    }

    #[test]
    fn test_degenerate_inputs_clamped() {
        let wx = WeatherState::new(-10.0, f64::NAN, 725.0, 90.0, -4.0, 3.0);
        assert_eq!(*wx.wind_speed, 0.0);
        assert_eq!(*wx.wind_gust, 0.0);
        assert_eq!(*wx.wind_direction, 5.0);
        assert_eq!(*wx.humidity, 0.0);
        assert_eq!(*wx.lightning_probability, 1.0);
    }

    #[test]
    fn test_timeline_shape() {
        let timeline = WeatherTimeline::generate(&WeatherState::red_flag(), 72, 123);
        assert_eq!(timeline.len(), 72);

        for (idx, entry) in timeline.hours().iter().enumerate() {
            assert_eq!(entry.hour as usize, idx);
            assert!(*entry.weather.wind_speed >= 5.0);
            assert!(*entry.weather.wind_gust >= 8.0);
            assert!(*entry.weather.humidity >= 3.0);
            assert!(*entry.weather.lightning_probability <= 0.3);
        }

        // Peak wind lands inside the ramp, not at the calm start
        let peak = timeline.peak().unwrap();
        assert!(peak.hour > 6, "peak at hour {}", peak.hour);
    }

    #[test]
    fn test_timeline_humidity_floor() {
        // A bone-dry base drives the raw draw well below zero at peak wind
        let dry = WeatherState::red_flag().with_humidity(0.5);
        for seed in 0..8 {
            let timeline = WeatherTimeline::generate(&dry, 72, seed);
            let lowest = timeline
                .hours()
                .iter()
                .map(|h| *h.weather.humidity)
                .fold(f64::INFINITY, f64::min);
            assert!(lowest >= 3.0, "seed {seed}: humidity {lowest}");
        }
    }

    #[test]
    fn test_deserialize_clamps_out_of_range() {
        let json = r#"{
            "wind_speed": -10.0,
            "wind_gust": -4.0,
            "wind_direction": 390.0,
            "temperature": 98.0,
            "humidity": 150.0,
            "lightning_probability": 2.5,
            "forecast_hours": 72
        }"#;
        let wx: WeatherState = serde_json::from_str(json).unwrap();
        assert_eq!(*wx.wind_speed, 0.0);
        assert_eq!(*wx.wind_gust, 0.0);
        assert_eq!(*wx.wind_direction, 30.0);
        assert_eq!(*wx.humidity, 100.0);
        assert_eq!(*wx.lightning_probability, 1.0);
    }

    #[test]
    fn test_timeline_reproducible() {
        let a = WeatherTimeline::generate(&WeatherState::red_flag(), 72, 123);
        let b = WeatherTimeline::generate(&WeatherState::red_flag(), 72, 123);
        assert_eq!(a, b);

        let c = WeatherTimeline::generate(&WeatherState::red_flag(), 72, 124);
        assert_ne!(a, c);
    }

    #[test]
    fn test_empty_timeline() {
        let timeline = WeatherTimeline::generate(&WeatherState::red_flag(), 0, 1);
        assert!(timeline.is_empty());
        assert!(timeline.peak().is_none());
    }
}
