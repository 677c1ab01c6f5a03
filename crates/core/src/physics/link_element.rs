//! Link elements
//!
//! The plume integrator splits a link into elements whose lengths grow
//! geometrically away from the receptor's projection. Each element is
//! replaced by an equivalent finite line source perpendicular to the wind,
//! centred on the element centre and spanning its crosswind extent. The
//! lineal strength along that source is trapezoidal: full strength over the
//! central part and tapering to the outer edges.
//!
//! Element boundaries ED1 and ED2 are measured along the link relative to the
//! receptor's projection on the link line.

use std::f64::consts::SQRT_2;

use crate::core_types::link::Link;
use crate::physics::erf::erf;
use crate::physics::wind_flow::WindFlow;

/// Weights of the five crosswind bands of the equivalent line source
const BAND_WEIGHTS: [f64; 5] = [0.25, 0.75, 1.0, 0.75, 0.25];

/// One element of a link, as seen from one receptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkElement {
    /// Half of the element length, EL2
    pub half_length: f64,
    /// Distance of the element centre from the receptor projection, ECLD
    pub centre: f64,
    /// Half of the crosswind extent of the equivalent line source, ELL2
    pub crosswind_half_extent: f64,
    /// Half of the along-wind extent of the element, CSL2
    pub alongwind_half_extent: f64,
    /// Half-width of the central full-strength band, EM2
    pub core_half_width: f64,
    /// Width of each tapering band, EN2
    pub taper_width: f64,

    phi: f64,
    half_width: f64,
    lineal_strength: f64,
}

/// Position and strength of an element relative to a receptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementProfile {
    /// Emission rate of the element, QE
    pub strength: f64,
    /// Crosswind offset of the element centre from the receptor, YE
    pub offset: f64,
    /// Effective downwind fetch, FET (always > 0)
    pub fetch: f64,
}

impl LinkElement {
    /// Build the element spanning `[ed1, ed2]` along `link`
    pub fn new(link: &Link, flow: &WindFlow, ed1: f64, ed2: f64) -> Self {
        let w2 = *link.half_width();
        let teta = *flow.teta;
        let (sin_t, cos_t) = teta.sin_cos();

        let el2 = (ed2 - ed1).abs() / 2.0;
        let ecld = -(ed1 + ed2) / 2.0;
        let ell2 = w2 * cos_t + el2 * sin_t;
        let csl2 = if teta >= (w2 / el2).atan() {
            w2 / sin_t
        } else {
            el2 / cos_t
        };
        let em2 = (el2 * sin_t - w2 * cos_t).abs();
        let en2 = (ell2 - em2) / 2.0;

        LinkElement {
            half_length: el2,
            centre: ecld,
            crosswind_half_extent: ell2,
            alongwind_half_extent: csl2,
            core_half_width: em2,
            taper_width: en2,
            phi: *flow.phi,
            half_width: w2,
            lineal_strength: *link.lineal_strength(),
        }
    }

    /// Locate the element relative to a receptor at perpendicular distance
    /// `d` from the link
    ///
    /// Returns `None` when the whole element lies downwind of the receptor.
    /// An element straddling the receptor is reduced to its upwind part: the
    /// fetch becomes the midpoint of the upwind portion and the strength is
    /// scaled accordingly.
    pub fn profile(&self, d: f64) -> Option<ElementProfile> {
        let (sin_p, cos_p) = self.phi.sin_cos();
        let offset = self.centre * sin_p - d * cos_p;
        let fetch = self.centre * cos_p + d * sin_p;
        let csl2 = self.alongwind_half_extent;

        if fetch <= -csl2 {
            return None;
        }

        let (fetch, strength) = if fetch < csl2 {
            let fetch = (csl2 + fetch) / 2.0;
            (fetch, self.lineal_strength * (fetch / self.half_width))
        } else {
            (fetch, self.lineal_strength * (csl2 / self.half_width))
        };

        Some(ElementProfile {
            strength,
            offset,
            fetch,
        })
    }

    /// Crosswind-integrated strength seen by the receptor
    ///
    /// Sums the contributions of the five bands of the equivalent line
    /// source, each weighted by its relative strength and spread with
    /// horizontal dispersion `sigma_y`.
    pub fn source_strength(&self, profile: &ElementProfile, sigma_y: f64) -> f64 {
        let mut y = [0.0; 6];
        y[0] = profile.offset + self.crosswind_half_extent;
        y[1] = y[0] - self.taper_width;
        y[2] = y[1] - self.taper_width;
        y[3] = y[2] - 2.0 * self.core_half_width;
        y[4] = y[3] - self.taper_width;
        y[5] = y[4] - self.taper_width;

        let scaled = y.map(|yj| erf(yj / sigma_y / SQRT_2));
        BAND_WEIGHTS
            .iter()
            .enumerate()
            .map(|(j, w)| profile.strength * w * (scaled[j] - scaled[j + 1]) / 2.0)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::link::{LinkSpec, LinkType};
    use crate::core_types::units::Degrees;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn link() -> Link {
        Link::new(
            0,
            LinkSpec {
                name: "L".into(),
                kind: LinkType::AtGrade,
                start: Point2::new(0.0, 0.0),
                end: Point2::new(0.0, 1000.0),
                traffic: 1000.0,
                emission_factor: 10.0,
                height: 0.0,
                width: 14.0,
            },
        )
        .unwrap()
    }

    fn crosswind() -> WindFlow {
        // Link heads north, wind from the west
        WindFlow::from_bearings(Degrees::new(270.0), Degrees::new(0.0))
    }

    #[test]
    fn test_crosswind_element_geometry() {
        let link = link();
        let e = LinkElement::new(&link, &crosswind(), -40.0, -20.0);
        assert_relative_eq!(e.half_length, 10.0);
        assert_relative_eq!(e.centre, 30.0);
        // Perpendicular wind: crosswind extent is the element, along-wind is the mixing zone
        assert_relative_eq!(e.crosswind_half_extent, 10.0, epsilon = 1e-9);
        assert_relative_eq!(e.alongwind_half_extent, 10.0, epsilon = 1e-9);
        assert_relative_eq!(e.core_half_width, 10.0, epsilon = 1e-9);
        assert_relative_eq!(e.taper_width, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_profile_upwind_downwind() {
        let link = link();
        let e = LinkElement::new(&link, &crosswind(), -5.0, 5.0);

        // sin(phi) = -1 for phi = 270°, so receptors with D < 0 are downwind
        let downwind = e.profile(-100.0).unwrap();
        assert_relative_eq!(downwind.fetch, 100.0, epsilon = 1e-9);
        assert_relative_eq!(downwind.strength, *link.lineal_strength(), epsilon = 1e-9);

        assert!(e.profile(100.0).is_none());
    }

    #[test]
    fn test_profile_straddling_receptor_is_halved() {
        let link = link();
        let e = LinkElement::new(&link, &crosswind(), -5.0, 5.0);
        let on_road = e.profile(0.0).unwrap();
        assert_relative_eq!(on_road.fetch, 5.0, epsilon = 1e-9);
        assert_relative_eq!(on_road.strength, *link.lineal_strength() / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_source_strength_full_capture() {
        // With a negligible sigma only the band containing the receptor counts
        let link = link();
        let flow = WindFlow::from_bearings(Degrees::new(300.0), Degrees::new(0.0));
        let e = LinkElement::new(&link, &flow, -200.0, 200.0);
        let profile = ElementProfile {
            strength: 100.0,
            offset: -e.crosswind_half_extent + e.taper_width * 2.0 + e.core_half_width,
            fetch: 50.0,
        };
        let s = e.source_strength(&profile, 1e-3);
        assert_relative_eq!(s, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_source_strength_far_off_axis_vanishes() {
        let link = link();
        let e = LinkElement::new(&link, &crosswind(), -5.0, 5.0);
        let profile = ElementProfile {
            strength: 100.0,
            offset: 1.0e4,
            fetch: 50.0,
        };
        assert_eq!(e.source_strength(&profile, 5.0), 0.0);
    }
}
