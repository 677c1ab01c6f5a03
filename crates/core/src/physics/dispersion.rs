//! Dispersion-parameter calibration
//!
//! σy and σz are power laws in the downwind fetch x:
//!
//! ```text
//! σy(x) = PY1 · x^PY2
//! σz(x) = PZ1 · x^PZ2
//! ```
//!
//! σy is fitted through the stability-class values at 1 m and 10 km, σz
//! through the initial vertical mixing at the edge of the mixing zone
//! (x = W2) and the class value at 10 km. Both are corrected for site
//! roughness and averaging time.
//!
//! # References
//! - Benson, P.E. (1979). "CALINE3 - A Versatile Dispersion Model for
//!   Predicting Air Pollutant Levels Near Highways and Arterial Streets".
//!   FHWA/CA/TL-79/23.

use crate::core_types::job::SiteFactors;
use crate::core_types::link::Link;
use crate::core_types::meteo::Meteo;
use crate::error::{Caline3Error, Caline3Result};

/// Near reference distance of the σy fit [m]
pub const MIN_LENGTH: f64 = 1.0;

/// Far reference distance of both fits [m]
pub const MAX_LENGTH: f64 = 10_000.0;

/// Fitted power-law coefficients for one (site, meteo, link)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispersionCurves {
    pub py1: f64,
    pub py2: f64,
    pub pz1: f64,
    pub pz2: f64,
}

impl DispersionCurves {
    /// Fit σy and σz for a link under a meteorological scenario
    ///
    /// # Errors
    /// Returns [`Caline3Error::DegenerateCalibration`] when the link's
    /// half-width equals the far reference distance (the σz fit has no
    /// span) or any coefficient comes out non-finite.
    pub fn calibrate(factors: &SiteFactors, meteo: &Meteo, link: &Link) -> Caline3Result<Self> {
        let class = meteo.stability();
        let w2 = *link.half_width();
        let u = *meteo.wind_speed();

        let py1 = class.sigma_y_near() * factors.rfac_3cm_02 * factors.afac_3min_02;
        let py10 = class.sigma_y_far() * factors.rfac_3cm_007 * factors.afac_3min_02;
        let py2 = (py10 / py1).ln() / (MAX_LENGTH / MIN_LENGTH).ln();

        // Initial vertical mixing from the residence time over the mixing zone
        let residence_time = link.residence_factor() * w2 / u;
        let sgzi = 1.8 + 0.11 * residence_time;
        let sgz1 = sgzi * factors.afac_30min_02;
        let sz10 = class.sigma_z_far() * factors.rfac_10cm_007 * factors.afac_3min_02;

        let degenerate = || {
            tracing::warn!(
                link = link.name(),
                meteo = meteo.ordinal() + 1,
                half_width = w2,
                "Cannot fit vertical dispersion curve"
            );
            Caline3Error::DegenerateCalibration {
                link: link.name().to_string(),
                half_width: w2,
            }
        };
        if w2 == MAX_LENGTH {
            return Err(degenerate());
        }

        let pz2 = (sz10 / sgz1).ln() / (MAX_LENGTH / w2).ln();
        let pz1 = (sz10 * sgz1).sqrt() / (MAX_LENGTH * w2).sqrt().powf(pz2);

        let curves = DispersionCurves { py1, py2, pz1, pz2 };
        if [py1, py2, pz1, pz2].iter().any(|c| !c.is_finite()) {
            return Err(degenerate());
        }

        tracing::debug!(
            link = link.name(),
            meteo = meteo.ordinal() + 1,
            py1,
            py2,
            pz1,
            pz2,
            "Calibrated dispersion curves"
        );
        Ok(curves)
    }

    /// Horizontal dispersion at fetch `x` [m]
    #[inline]
    pub fn sigma_y(&self, x: f64) -> f64 {
        self.py1 * x.powf(self.py2)
    }

    /// Vertical dispersion at fetch `x` [m]
    #[inline]
    pub fn sigma_z(&self, x: f64) -> f64 {
        self.pz1 * x.powf(self.pz2)
    }
}
