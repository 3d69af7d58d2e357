//! Semantic unit types for weather and terrain inputs
//!
//! Newtype wrappers keep wind speeds, temperatures, humidities and angles from
//! being mixed up when they flow into the risk formulas.
//!
//! # Design Philosophy
//! - All quantities are f64; grids are small and scores are rounded to 4 places
//! - Constructors sanitize instead of rejecting: non-finite values map to the
//!   range floor and out-of-range values are clamped
//! - Total ordering via `Ord` (NaN can never be stored)
//! - Serde support; deserialization goes through the same sanitizing
//!   constructors, so decoded values obey the same ranges
//!
//! # Usage
//! ```
//! use shutoff_core::core_types::units::{MilesPerHour, Percent, Fraction};
//!
//! let wind = MilesPerHour::new(45.0);
//! assert_eq!(*wind, 45.0);
//!
//! // Humidity is clamped into [0, 100]
//! assert_eq!(*Percent::new(140.0), 100.0);
//!
//! // Fractions are clamped into [0, 1]
//! assert_eq!(*Fraction::new(-0.2), 0.0);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Compare f64 values with total ordering
#[inline]
fn f64_total_cmp(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

/// Replace NaN/±inf with `floor`, then clamp into `[lo, hi]`
#[inline]
fn sanitize(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        lo
    }
}

/// Clip a value into [0, 1], mapping NaN to 0
///
/// Every normalized risk component in the crate goes through this helper.
#[inline]
#[must_use]
pub fn clip01(value: f64) -> f64 {
    sanitize(value, 0.0, 1.0)
}

/// Round to a fixed number of decimal places
#[inline]
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

// ============================================================================
// SPEED
// ============================================================================

/// Wind speed in miles per hour (never negative)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "f64")]
#[repr(transparent)]
pub struct MilesPerHour(f64);

impl Eq for MilesPerHour {}

impl PartialOrd for MilesPerHour {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MilesPerHour {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for MilesPerHour {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl MilesPerHour {
    /// Create a wind speed, clamping negatives to zero
    #[inline]
    #[must_use]
    pub fn new(value: f64) -> Self {
        MilesPerHour(sanitize(value, 0.0, f64::MAX))
    }
}

impl From<f64> for MilesPerHour {
    fn from(v: f64) -> Self {
        MilesPerHour::new(v)
    }
}

impl fmt::Display for MilesPerHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} mph", self.0)
    }
}

// ============================================================================
// TEMPERATURE
// ============================================================================

/// Air temperature in degrees Fahrenheit
///
/// Display-only in the risk model; the timeline generator varies it diurnally.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "f64")]
#[repr(transparent)]
pub struct Fahrenheit(f64);

impl Deref for Fahrenheit {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Fahrenheit {
    /// Absolute zero in Fahrenheit
    const ABSOLUTE_ZERO: f64 = -459.67;

    /// Create a temperature, clamping at absolute zero
    #[inline]
    #[must_use]
    pub fn new(value: f64) -> Self {
        Fahrenheit(sanitize(value, Self::ABSOLUTE_ZERO, f64::MAX))
    }
}

impl From<f64> for Fahrenheit {
    fn from(v: f64) -> Self {
        Fahrenheit::new(v)
    }
}

impl fmt::Display for Fahrenheit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°F", self.0)
    }
}

// ============================================================================
// DIMENSIONLESS
// ============================================================================

/// A percentage in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "f64")]
#[repr(transparent)]
pub struct Percent(f64);

impl Eq for Percent {}

impl PartialOrd for Percent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Percent {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Percent {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Percent {
    /// Create a percentage, clamped into [0, 100]
    #[inline]
    #[must_use]
    pub fn new(value: f64) -> Self {
        Percent(sanitize(value, 0.0, 100.0))
    }
}

impl From<f64> for Percent {
    fn from(v: f64) -> Self {
        Percent::new(v)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}

/// A fraction in the range [0, 1]
/// Represents probabilities, fuel densities, moisture contents and exposures
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "f64")]
#[repr(transparent)]
pub struct Fraction(f64);

impl Eq for Fraction {}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Fraction {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Fraction {
    /// Create a new fraction, clamped into [0, 1]
    #[inline]
    #[must_use]
    pub fn new(value: f64) -> Self {
        Fraction(clip01(value))
    }
}

impl From<f64> for Fraction {
    fn from(v: f64) -> Self {
        Fraction::new(v)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

// ============================================================================
// ANGLE
// ============================================================================

/// Compass bearing in degrees, normalized into [0, 360)
///
/// 0° = North, 90° = East. Wind direction uses this type.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "f64")]
#[repr(transparent)]
pub struct Degrees(f64);

impl Deref for Degrees {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Degrees {
    /// Create a bearing, wrapping into [0, 360)
    #[inline]
    #[must_use]
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Degrees(value.rem_euclid(360.0))
        } else {
            Degrees(0.0)
        }
    }

    /// Convert to radians
    #[inline]
    #[must_use]
    pub fn to_radians(self) -> f64 {
        self.0.to_radians()
    }
}

impl From<f64> for Degrees {
    fn from(v: f64) -> Self {
        Degrees::new(v)
    }
}

impl fmt::Display for Degrees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°", self.0)
    }
}
