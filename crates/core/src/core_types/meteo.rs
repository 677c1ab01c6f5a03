//! Meteorological scenarios
//!
//! A job evaluates every link/receptor pair once per scenario. Each scenario
//! is a steady wind (speed and the bearing it blows from), a Pasquill
//! stability class, the mixing height capping vertical dispersion and the
//! ambient background added to reported totals.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core_types::units::{Degrees, Meters, MetersPerSecond, PartsPerMillion};
use crate::error::{Caline3Error, Caline3Result};

/// Pasquill-Gifford atmospheric stability class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StabilityClass {
    /// Extremely unstable
    A,
    /// Moderately unstable
    B,
    /// Slightly unstable
    C,
    /// Neutral
    D,
    /// Slightly stable
    E,
    /// Moderately stable
    F,
}

impl StabilityClass {
    /// All classes in input-code order
    pub const ALL: [StabilityClass; 6] = [
        StabilityClass::A,
        StabilityClass::B,
        StabilityClass::C,
        StabilityClass::D,
        StabilityClass::E,
        StabilityClass::F,
    ];

    /// Class from its numeric input code (1 = A ... 6 = F)
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1..=6 => Some(Self::ALL[usize::from(code - 1)]),
            _ => None,
        }
    }

    /// Numeric input code (1 = A ... 6 = F)
    pub fn code(self) -> u8 {
        match self {
            StabilityClass::A => 1,
            StabilityClass::B => 2,
            StabilityClass::C => 3,
            StabilityClass::D => 4,
            StabilityClass::E => 5,
            StabilityClass::F => 6,
        }
    }

    /// σy at 1 m downwind for 3 cm roughness and 3 min averaging [m]
    pub fn sigma_y_near(self) -> f64 {
        match self {
            StabilityClass::A => 0.46,
            StabilityClass::B => 0.29,
            StabilityClass::C => 0.18,
            StabilityClass::D => 0.11,
            StabilityClass::E => 0.087,
            StabilityClass::F => 0.057,
        }
    }

    /// σy at 10 km downwind for 3 cm roughness and 3 min averaging [m]
    pub fn sigma_y_far(self) -> f64 {
        match self {
            StabilityClass::A => 1831.0,
            StabilityClass::B => 1155.0,
            StabilityClass::C => 717.0,
            StabilityClass::D => 438.0,
            StabilityClass::E => 346.0,
            StabilityClass::F => 227.0,
        }
    }

    /// σz at 10 km downwind for 10 cm roughness and 3 min averaging [m]
    pub fn sigma_z_far(self) -> f64 {
        match self {
            StabilityClass::A => 1112.0,
            StabilityClass::B => 566.0,
            StabilityClass::C => 353.0,
            StabilityClass::D => 219.0,
            StabilityClass::E => 124.0,
            StabilityClass::F => 56.0,
        }
    }
}

impl fmt::Display for StabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            StabilityClass::A => 'A',
            StabilityClass::B => 'B',
            StabilityClass::C => 'C',
            StabilityClass::D => 'D',
            StabilityClass::E => 'E',
            StabilityClass::F => 'F',
        };
        write!(f, "{letter}")
    }
}

/// One meteorological scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meteo {
    pub(crate) ordinal: usize,
    pub(crate) wind_speed: MetersPerSecond,
    /// Direction the wind blows from, clockwise from north
    pub(crate) wind_bearing: Degrees,
    pub(crate) stability: StabilityClass,
    pub(crate) mixing_height: Meters,
    pub(crate) ambient: PartsPerMillion,
}

impl Meteo {
    /// Mixing heights at or above this value are treated as unlimited
    /// (no reflections off the inversion lid)
    pub const UNLIMITED_MIXING_HEIGHT: Meters = Meters::new(1000.0);

    /// Create a scenario
    ///
    /// # Arguments
    /// * `ordinal` - Position of the scenario in its job (0-based)
    /// * `wind_speed` - Wind speed, must be positive
    /// * `wind_bearing` - Direction the wind blows from (degrees from north)
    /// * `stability` - Stability class
    /// * `mixing_height` - Mixing height in meters, must be positive
    /// * `ambient` - Background concentration added to reported totals
    ///
    /// # Errors
    /// Returns [`Caline3Error::InvalidMeteo`] for a non-positive wind speed,
    /// a non-positive mixing height or non-finite values. A lid at ground
    /// level leaves the reflection series without a bound.
    pub fn new(
        ordinal: usize,
        wind_speed: MetersPerSecond,
        wind_bearing: Degrees,
        stability: StabilityClass,
        mixing_height: f64,
        ambient: PartsPerMillion,
    ) -> Caline3Result<Self> {
        let invalid = |reason: String| Caline3Error::InvalidMeteo { ordinal, reason };

        if !wind_speed.is_finite() || *wind_speed <= 0.0 {
            return Err(invalid(format!(
                "wind speed must be positive, got {}",
                *wind_speed
            )));
        }
        if !wind_bearing.is_finite() {
            return Err(invalid("wind bearing must be finite".into()));
        }
        if !mixing_height.is_finite() || mixing_height <= 0.0 {
            return Err(invalid(format!(
                "mixing height must be positive, got {mixing_height}"
            )));
        }

        Ok(Meteo {
            ordinal,
            wind_speed,
            wind_bearing,
            stability,
            mixing_height: Meters::new(mixing_height),
            ambient,
        })
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn wind_speed(&self) -> MetersPerSecond {
        self.wind_speed
    }

    pub fn wind_bearing(&self) -> Degrees {
        self.wind_bearing
    }

    pub fn stability(&self) -> StabilityClass {
        self.stability
    }

    pub fn mixing_height(&self) -> Meters {
        self.mixing_height
    }

    pub fn ambient(&self) -> PartsPerMillion {
        self.ambient
    }

    /// Whether the mixing layer is deep enough to ignore reflections
    pub fn has_unlimited_mixing(&self) -> bool {
        self.mixing_height >= Self::UNLIMITED_MIXING_HEIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meteo(speed: f64, mixh: f64) -> Caline3Result<Meteo> {
        Meteo::new(
            0,
            MetersPerSecond::new(speed),
            Degrees::new(45.0),
            StabilityClass::D,
            mixh,
            PartsPerMillion::new(3.0),
        )
    }

    #[test]
    fn test_stability_codes_round_trip() {
        for class in StabilityClass::ALL {
            assert_eq!(StabilityClass::from_code(class.code()), Some(class));
        }
        assert_eq!(StabilityClass::from_code(0), None);
        assert_eq!(StabilityClass::from_code(7), None);
        assert_eq!(StabilityClass::F.to_string(), "F");
    }

    #[test]
    fn test_sigma_tables_decrease_with_stability() {
        for pair in StabilityClass::ALL.windows(2) {
            assert!(pair[0].sigma_y_near() > pair[1].sigma_y_near());
            assert!(pair[0].sigma_y_far() > pair[1].sigma_y_far());
            assert!(pair[0].sigma_z_far() > pair[1].sigma_z_far());
        }
    }

    #[test]
    fn test_rejects_calm_wind() {
        assert!(matches!(
            meteo(0.0, 1000.0),
            Err(Caline3Error::InvalidMeteo { ordinal: 0, .. })
        ));
        assert!(meteo(-1.0, 1000.0).is_err());
        assert!(meteo(f64::NAN, 1000.0).is_err());
    }

    #[test]
    fn test_rejects_non_positive_mixing_height() {
        assert!(meteo(1.0, -5.0).is_err());
        assert!(matches!(
            meteo(1.0, 0.0),
            Err(Caline3Error::InvalidMeteo { ordinal: 0, .. })
        ));
        assert!(meteo(1.0, f64::INFINITY).is_err());
        assert!(meteo(1.0, 0.5).is_ok());
    }

    #[test]
    fn test_unlimited_mixing_threshold() {
        assert!(meteo(1.0, 1000.0).unwrap().has_unlimited_mixing());
        assert!(meteo(1.0, 5000.0).unwrap().has_unlimited_mixing());
        assert!(!meteo(1.0, 999.9).unwrap().has_unlimited_mixing());
    }
}
