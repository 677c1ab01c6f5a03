//! Wind incidence on a link
//!
//! Reduces a wind bearing and a link bearing to the signed incidence angle φ
//! used in the element projections, the acute angle θ between the wind and
//! the link axis, and the geometric growth rate of the element lengths.

use crate::core_types::link::Link;
use crate::core_types::meteo::Meteo;
use crate::core_types::units::{Degrees, Radians};

/// Wind/link incidence for one (meteo, link) pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindFlow {
    /// Signed wind-to-link angle, BRG − LBRG
    pub phi: Radians,
    /// φ folded into [0°, 90°]
    pub teta: Radians,
    /// Element growth factor along the link
    pub base: f64,
}

impl WindFlow {
    pub fn new(meteo: &Meteo, link: &Link) -> Self {
        Self::from_bearings(meteo.wind_bearing(), link.bearing())
    }

    /// Incidence of a wind blowing from `wind_bearing` on a link heading
    /// `link_bearing`
    ///
    /// Near-parallel winds give slowly growing elements since the plume from
    /// each element travels along the link; crosswinds grow them fast.
    pub fn from_bearings(wind_bearing: Degrees, link_bearing: Degrees) -> Self {
        let phi = wind_bearing - link_bearing;

        let mut teta = *phi.abs();
        if teta >= 270.0 {
            teta = 360.0 - teta;
        } else if teta >= 180.0 {
            teta -= 180.0;
        } else if teta > 90.0 {
            teta = 180.0 - teta;
        }

        let base = if teta < 20.0 {
            1.1
        } else if teta < 50.0 {
            1.5
        } else if teta < 70.0 {
            2.0
        } else {
            4.0
        };

        WindFlow {
            phi: phi.to_radians(),
            teta: Degrees::new(teta).to_radians(),
            base,
        }
    }
}
