//! Segmented Gaussian plume integration
//!
//! The concentration at a receptor is the sum of the contributions of link
//! elements. Element lengths start at the mixing-zone width W next to the
//! receptor's projection on the link line and grow by the wind-flow `base`
//! factor away from it, in both directions, until the link ends are reached.
//!
//! Each element contributes
//!
//! ```text
//! C = FACT · (G − F₃)
//! FACT = Σ bands / (√(2π) · σz · U) · DSF(D) · settling
//! ```
//!
//! where `G` sums the ground and mixing-lid reflections and `F₃` removes the
//! material deposited at the surface.

use std::f64::consts::{PI, SQRT_2};

use crate::core_types::job::Job;
use crate::core_types::link::Link;
use crate::core_types::meteo::Meteo;
use crate::core_types::receptor::Receptor;
use crate::core_types::units::MicrogramsPerCubicMeter;
use crate::error::Caline3Result;
use crate::physics::dispersion::DispersionCurves;
use crate::physics::erf::erf;
use crate::physics::link_element::LinkElement;
use crate::physics::wind_flow::WindFlow;

/// Exponent arguments below this are treated as zero contribution
const MIN_EXPONENT: f64 = -44.0;

/// Deposition argument beyond which the element contributes nothing
const MAX_DEPOSITION_ARG: f64 = 5.0;

/// Upper bound of the deposition correction
const MAX_DEPOSITION_FACTOR: f64 = 2.0;

/// Reflection steps evaluated at most under a finite mixing lid; each image
/// order takes two
const MAX_REFLECTION_STEPS: usize = 20_000;

/// Plume of one link under one meteorological scenario
///
/// Wind incidence and the dispersion curves are computed once on
/// construction and reused for every receptor.
#[derive(Debug, Clone)]
pub struct Plume<'a> {
    job: &'a Job,
    meteo: &'a Meteo,
    link: &'a Link,
    flow: WindFlow,
    curves: DispersionCurves,
}

impl<'a> Plume<'a> {
    /// # Errors
    /// Returns [`Caline3Error::DegenerateCalibration`](crate::Caline3Error)
    /// if the dispersion curves cannot be fitted for this link.
    pub fn new(job: &'a Job, meteo: &'a Meteo, link: &'a Link) -> Caline3Result<Self> {
        let flow = WindFlow::new(meteo, link);
        let curves = DispersionCurves::calibrate(job.factors(), meteo, link)?;
        Ok(Plume {
            job,
            meteo,
            link,
            flow,
            curves,
        })
    }

    /// Concentration contributed by this link at `receptor`
    pub fn concentration_at(&self, receptor: &Receptor) -> MicrogramsPerCubicMeter {
        let link = self.link;
        let frame = link.to_link_frame(receptor);
        let (d, z) = (frame.distance, frame.level);

        // Link ends relative to the receptor projection
        let downwind_end = -(*link.length() + frame.offset);
        let upwind_end = -frame.offset;
        let initial = *link.mixing_width();

        let mut total = 0.0;

        let mut end = 0.0;
        let mut length = initial;
        while end < upwind_end {
            let start = end;
            end += length;
            if end > downwind_end {
                total += self.concentration_from(
                    &self.element(start.max(downwind_end), end.min(upwind_end)),
                    d,
                    z,
                );
            }
            length *= self.flow.base;
        }

        let mut start = 0.0;
        let mut length = initial;
        while start > downwind_end {
            let end = start;
            start -= length;
            if start < upwind_end {
                total += self.concentration_from(
                    &self.element(start.max(downwind_end), end.min(upwind_end)),
                    d,
                    z,
                );
            }
            length *= self.flow.base;
        }

        MicrogramsPerCubicMeter::new(total)
    }

    fn element(&self, ed1: f64, ed2: f64) -> LinkElement {
        LinkElement::new(self.link, &self.flow, ed1, ed2)
    }

    /// Contribution of one element to a receptor at distance `d` and level `z`
    fn concentration_from(&self, element: &LinkElement, d: f64, z: f64) -> f64 {
        let Some(profile) = element.profile(d) else {
            return 0.0;
        };

        let u = *self.meteo.wind_speed();
        let h = self.link.source_height();
        let fetch = profile.fetch;

        let sgy = self.curves.sigma_y(fetch);
        let sgz = self.curves.sigma_z(fetch);
        let kz = sgz * sgz / (2.0 * fetch / u);

        let mut fact = element.source_strength(&profile, sgy) / ((2.0 * PI).sqrt() * sgz * u);
        fact *= self.link.depressed_section_factor(d);

        let Some(fac3) = self.deposition_factor(sgz, kz, z, h) else {
            return 0.0;
        };
        fact *= self.settling_factor(sgz, kz, z, h);

        let lid = (!self.meteo.has_unlimited_mixing()).then(|| *self.meteo.mixing_height());
        fact * (gaussian_factor(sgz, z, h, lid) - fac3)
    }

    /// Fraction of the plume removed by surface deposition
    ///
    /// `None` when the deposition argument exceeds its validity range; the
    /// element then contributes nothing.
    fn deposition_factor(&self, sgz: f64, kz: f64, z: f64, h: f64) -> Option<f64> {
        let v1 = *self.job.site().deposition_velocity;
        if v1 == 0.0 {
            return Some(0.0);
        }

        let arg = (v1 * sgz / kz + (z + h) / sgz) / SQRT_2;
        if arg > MAX_DEPOSITION_ARG {
            return None;
        }

        let fac3 = (2.0 * PI).sqrt()
            * v1
            * sgz
            * (v1 * (z + h) / kz + 0.5 * (v1 * sgz / kz).powi(2)).exp()
            * erf(arg)
            / kz;
        Some(fac3.min(MAX_DEPOSITION_FACTOR))
    }

    /// Plume depletion by gravitational settling
    fn settling_factor(&self, sgz: f64, kz: f64, z: f64, h: f64) -> f64 {
        let vs = *self.job.site().settling_velocity;
        if vs == 0.0 {
            return 1.0;
        }
        (-vs * (z - h) / (2.0 * kz) - (vs * sgz / kz).powi(2) / 8.0).exp()
    }
}

/// Vertical Gaussian term with reflections off the ground and the mixing lid
///
/// With no lid only the direct and ground-reflected terms are kept. Under a
/// lid at height `mixh`, image sources are added in the order 0, +1, −1,
/// +2, −2, … and the series stops once a full ± pair contributes nothing, or
/// after [`MAX_REFLECTION_STEPS`].
fn gaussian_factor(sgz: f64, z: f64, h: f64, lid: Option<f64>) -> f64 {
    let term = |offset: f64| {
        let arg = -0.5 * (offset / sgz).powi(2);
        if arg < MIN_EXPONENT {
            0.0
        } else {
            arg.exp()
        }
    };

    let Some(mixh) = lid else {
        return term(z + h) + term(z - h);
    };

    let mut total = 0.0;
    let mut cnt: f64 = 0.0;
    let mut exls = 0.0;
    for _ in 0..MAX_REFLECTION_STEPS {
        let exp1 = term(z + h + 2.0 * cnt * mixh);
        let exp2 = term(z - h + 2.0 * cnt * mixh);
        total += exp1 + exp2;

        if exp1 + exp2 + exls == 0.0 && cnt <= 0.0 {
            break;
        }

        if cnt <= 0.0 {
            cnt = cnt.abs() + 1.0;
            exls = 0.0;
        } else {
            cnt = -cnt;
            exls = exp1 + exp2;
        }
    }
    total
}

/// Concentration contributed by `link` at `receptor` under `meteo`
///
/// Convenience wrapper calibrating a [`Plume`] for a single evaluation.
///
/// # Errors
/// Propagates calibration errors from [`Plume::new`].
pub fn concentration(
    job: &Job,
    meteo: &Meteo,
    link: &Link,
    receptor: &Receptor,
) -> Caline3Result<MicrogramsPerCubicMeter> {
    Ok(Plume::new(job, meteo, link)?.concentration_at(receptor))
}
