//! Semantic unit types for the quantities flowing through the dispersion model
//!
//! Newtype wrappers keep roadway geometry, wind, emission and concentration
//! values apart at API boundaries. The numeric kernels unwrap them to plain
//! `f64` because the CALINE3 power-law curves are dimensionally informal
//! (sigma in metres from a distance in metres raised to a fitted exponent).
//!
//! # Design Philosophy
//! - All types wrap `f64`; CALINE3 reference numerics are double precision
//! - Implements the traits the model needs (Add, Sub, Mul, Div, Ord, Display)
//! - Total ordering via `Ord` (NaN sorts greater than all values)
//! - Explicit conversion methods between related types
//! - Serde support for serialization
//!
//! # Usage
//! ```
//! use caline3_core::core_types::units::{Degrees, Meters, MicrogramsPerCubicMeter};
//!
//! let co = MicrogramsPerCubicMeter::new(1000.0);
//! assert!((*co.to_ppm(28.0) - 0.875).abs() < 1e-12);
//!
//! let bearing = Degrees::new(90.0);
//! assert!((*bearing.to_radians() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
//!
//! let w1 = Meters::new(9.5);
//! let w2 = Meters::new(14.5);
//! assert_eq!(w1.max(w2), w2);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Deref, Div, Mul, Sub};

/// Compare f64 values with total ordering using Rust's built-in `total_cmp`
#[inline]
fn f64_total_cmp(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

// ============================================================================
// LENGTH TYPES
// ============================================================================

/// Non-negative length in meters (link length, half-width, mixing height)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Meters(f64);

impl Eq for Meters {}

impl PartialOrd for Meters {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Meters {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Meters {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Meters {
    /// Create a new length in meters. Asserts value >= 0.
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(value >= 0.0, "Meters::new: negative length is invalid");
        Meters(value)
    }
}

impl From<Meters> for f64 {
    fn from(m: Meters) -> f64 {
        m.0
    }
}

impl Div<f64> for Meters {
    type Output = Meters;
    fn div(self, rhs: f64) -> Meters {
        Meters(self.0 / rhs)
    }
}

impl fmt::Display for Meters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} m", self.0)
    }
}

/// Length in centimeters (CALINE3 surface roughness input)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Centimeters(f64);

impl Deref for Centimeters {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Centimeters {
    /// Create a new length in centimeters
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Centimeters(value)
    }
}

impl fmt::Display for Centimeters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} cm", self.0)
    }
}

// ============================================================================
// ANGLE TYPES
// ============================================================================

/// Angle in degrees (wind and link bearings, clockwise from north)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Degrees(f64);

impl Eq for Degrees {}

impl PartialOrd for Degrees {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Degrees {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Degrees {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Degrees {
    /// Create a new angle in degrees (any value, signed differences allowed)
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Degrees(value)
    }

    /// Absolute value of the angle
    #[inline]
    #[must_use]
    pub fn abs(self) -> Degrees {
        Degrees(self.0.abs())
    }

    /// Convert to radians
    #[inline]
    #[must_use]
    pub fn to_radians(self) -> Radians {
        Radians(self.0.to_radians())
    }
}

impl From<Degrees> for Radians {
    fn from(d: Degrees) -> Radians {
        d.to_radians()
    }
}

impl Sub for Degrees {
    type Output = Degrees;
    fn sub(self, rhs: Degrees) -> Degrees {
        Degrees(self.0 - rhs.0)
    }
}

impl fmt::Display for Degrees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°", self.0)
    }
}

/// Angle in radians
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Radians(f64);

impl Eq for Radians {}

impl PartialOrd for Radians {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Radians {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Radians {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Radians {
    /// Create a new angle in radians
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Radians(value)
    }

    /// Convert to degrees
    #[inline]
    #[must_use]
    pub fn to_degrees(self) -> Degrees {
        Degrees(self.0.to_degrees())
    }

    #[inline]
    #[must_use]
    pub fn sin(self) -> f64 {
        self.0.sin()
    }
}

impl From<Radians> for Degrees {
    fn from(r: Radians) -> Degrees {
        r.to_degrees()
    }
}

impl Add for Radians {
    type Output = Radians;
    fn add(self, rhs: Radians) -> Radians {
        Radians(self.0 + rhs.0)
    }
}

impl Sub for Radians {
    type Output = Radians;
    fn sub(self, rhs: Radians) -> Radians {
        Radians(self.0 - rhs.0)
    }
}

impl fmt::Display for Radians {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} rad", self.0)
    }
}

// ============================================================================
// VELOCITY AND TIME TYPES
// ============================================================================

/// Velocity in meters per second (wind speed, deposition and settling velocity)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MetersPerSecond(f64);

impl Eq for MetersPerSecond {}

impl PartialOrd for MetersPerSecond {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetersPerSecond {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for MetersPerSecond {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl MetersPerSecond {
    /// Still air / no deposition
    pub const ZERO: MetersPerSecond = MetersPerSecond(0.0);

    /// Create a new velocity in m/s
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        MetersPerSecond(value)
    }

    /// Convert a velocity given in cm/s (CALINE3 job record units)
    #[inline]
    #[must_use]
    pub fn from_centimeters_per_second(value: f64) -> Self {
        MetersPerSecond(value / 100.0)
    }
}

impl fmt::Display for MetersPerSecond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} m/s", self.0)
    }
}

/// Duration in minutes (concentration averaging time)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Minutes(f64);

impl Deref for Minutes {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Minutes {
    /// Create a new duration in minutes
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Minutes(value)
    }
}

impl fmt::Display for Minutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0} min", self.0)
    }
}

// ============================================================================
// EMISSION AND CONCENTRATION TYPES
// ============================================================================

/// Lineal source strength in µg/(m·s)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MicrogramsPerMeterSecond(f64);

impl Deref for MicrogramsPerMeterSecond {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl MicrogramsPerMeterSecond {
    /// Conversion of (veh/h)·(g/mile) to µg/(m·s): 10⁶ / (1609.344 · 3600),
    /// kept at the four digits the model was calibrated with
    pub const PER_VEHICLE_GRAM_MILE: f64 = 0.1726;

    /// Create a new lineal source strength
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        MicrogramsPerMeterSecond(value)
    }

    /// Lineal strength of a traffic stream
    ///
    /// # Arguments
    /// * `vehicles_per_hour` - Traffic volume (veh/h)
    /// * `grams_per_mile` - Emission factor (g/mile per vehicle)
    #[inline]
    #[must_use]
    pub fn from_traffic(vehicles_per_hour: f64, grams_per_mile: f64) -> Self {
        MicrogramsPerMeterSecond(Self::PER_VEHICLE_GRAM_MILE * vehicles_per_hour * grams_per_mile)
    }
}

impl fmt::Display for MicrogramsPerMeterSecond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} µg/(m·s)", self.0)
    }
}

/// Mass concentration in µg/m³
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MicrogramsPerCubicMeter(f64);

impl Eq for MicrogramsPerCubicMeter {}

impl PartialOrd for MicrogramsPerCubicMeter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MicrogramsPerCubicMeter {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for MicrogramsPerCubicMeter {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl MicrogramsPerCubicMeter {
    /// No pollutant
    pub const ZERO: MicrogramsPerCubicMeter = MicrogramsPerCubicMeter(0.0);

    /// Molar volume of air at 25 °C and 1 atm in m³/mol (per 1000 for µg → mg)
    const MOLAR_VOLUME_FACTOR: f64 = 0.0245;

    /// Create a new concentration
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        MicrogramsPerCubicMeter(value)
    }

    /// Convert to a volume mixing ratio for a gas of the given molecular weight (g/mol)
    #[inline]
    #[must_use]
    pub fn to_ppm(self, molecular_weight: f64) -> PartsPerMillion {
        PartsPerMillion(self.0 * Self::MOLAR_VOLUME_FACTOR / molecular_weight)
    }
}

impl Add for MicrogramsPerCubicMeter {
    type Output = MicrogramsPerCubicMeter;
    fn add(self, rhs: MicrogramsPerCubicMeter) -> MicrogramsPerCubicMeter {
        MicrogramsPerCubicMeter(self.0 + rhs.0)
    }
}

impl AddAssign for MicrogramsPerCubicMeter {
    fn add_assign(&mut self, rhs: MicrogramsPerCubicMeter) {
        self.0 += rhs.0;
    }
}

impl Sum for MicrogramsPerCubicMeter {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(MicrogramsPerCubicMeter::ZERO, Add::add)
    }
}

impl Mul<f64> for MicrogramsPerCubicMeter {
    type Output = MicrogramsPerCubicMeter;
    fn mul(self, rhs: f64) -> MicrogramsPerCubicMeter {
        MicrogramsPerCubicMeter(self.0 * rhs)
    }
}

impl fmt::Display for MicrogramsPerCubicMeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} µg/m³", self.0)
    }
}

/// Volume mixing ratio in parts per million
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PartsPerMillion(f64);

impl Deref for PartsPerMillion {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl PartsPerMillion {
    /// Create a new mixing ratio
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        PartsPerMillion(value)
    }

    /// Most decimal digits an `f64` mixing ratio can be rounded to
    pub const MAX_DIGITS: u32 = 15;

    /// Round half to even to the given number of decimal digits
    ///
    /// `digits` above [`Self::MAX_DIGITS`] are clamped.
    #[inline]
    #[must_use]
    pub fn round(self, digits: u32) -> PartsPerMillion {
        let scale = 10f64.powi(digits.min(Self::MAX_DIGITS) as i32);
        PartsPerMillion((self.0 * scale).round_ties_even() / scale)
    }
}

impl Add for PartsPerMillion {
    type Output = PartsPerMillion;
    fn add(self, rhs: PartsPerMillion) -> PartsPerMillion {
        PartsPerMillion(self.0 + rhs.0)
    }
}

impl fmt::Display for PartsPerMillion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} ppm", self.0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
