//! Jobs: one site with its receptors, links and meteorological scenarios

use serde::Serialize;

use crate::core_types::link::Link;
use crate::core_types::meteo::Meteo;
use crate::core_types::receptor::Receptor;
use crate::core_types::units::{Centimeters, MetersPerSecond, Minutes};
use crate::error::{Caline3Error, Caline3Result};

/// Site-wide conditions shared by every scenario of a job
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SiteConditions {
    /// Averaging time of the reported concentrations
    pub averaging_time: Minutes,
    /// Aerodynamic surface roughness z0
    pub roughness: Centimeters,
    /// Particle settling velocity VS
    pub settling_velocity: MetersPerSecond,
    /// Surface deposition velocity V1
    pub deposition_velocity: MetersPerSecond,
}

/// Roughness and averaging-time corrections of the reference sigma curves
///
/// The stability-class tables are tabulated for 3 cm (σy) or 10 cm (σz)
/// roughness and a 3 min averaging time; σz near the road is tabulated for
/// 30 min.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SiteFactors {
    /// (z0/3)^0.2
    pub rfac_3cm_02: f64,
    /// (z0/3)^0.07
    pub rfac_3cm_007: f64,
    /// (z0/10)^0.07
    pub rfac_10cm_007: f64,
    /// (atim/3)^0.2
    pub afac_3min_02: f64,
    /// (atim/30)^0.2
    pub afac_30min_02: f64,
}

impl SiteFactors {
    pub fn new(roughness: Centimeters, averaging_time: Minutes) -> Self {
        let z0 = *roughness;
        let atim = *averaging_time;
        SiteFactors {
            rfac_3cm_02: (z0 / 3.0).powf(0.2),
            rfac_3cm_007: (z0 / 3.0).powf(0.07),
            rfac_10cm_007: (z0 / 10.0).powf(0.07),
            afac_3min_02: (atim / 3.0).powf(0.2),
            afac_30min_02: (atim / 30.0).powf(0.2),
        }
    }
}

/// A complete CALINE3 job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub(crate) title: String,
    pub(crate) run: String,
    pub(crate) site: SiteConditions,
    pub(crate) factors: SiteFactors,
    pub(crate) receptors: Vec<Receptor>,
    pub(crate) links: Vec<Link>,
    pub(crate) meteos: Vec<Meteo>,
}

impl Job {
    /// Assemble a job and precompute its site factors
    ///
    /// # Errors
    /// Returns [`Caline3Error::InvalidSite`] if the averaging time or the
    /// roughness is not positive, or a velocity is negative.
    pub fn new(
        title: impl Into<String>,
        run: impl Into<String>,
        site: SiteConditions,
        receptors: Vec<Receptor>,
        links: Vec<Link>,
        meteos: Vec<Meteo>,
    ) -> Caline3Result<Self> {
        if !site.averaging_time.is_finite() || *site.averaging_time <= 0.0 {
            return Err(Caline3Error::InvalidSite(format!(
                "averaging time must be positive, got {}",
                *site.averaging_time
            )));
        }
        if !site.roughness.is_finite() || *site.roughness <= 0.0 {
            return Err(Caline3Error::InvalidSite(format!(
                "surface roughness must be positive, got {}",
                *site.roughness
            )));
        }
        for (label, v) in [
            ("settling", site.settling_velocity),
            ("deposition", site.deposition_velocity),
        ] {
            if !v.is_finite() || *v < 0.0 {
                return Err(Caline3Error::InvalidSite(format!(
                    "{label} velocity must be non-negative, got {}",
                    *v
                )));
            }
        }

        Ok(Job {
            title: title.into(),
            run: run.into(),
            factors: SiteFactors::new(site.roughness, site.averaging_time),
            site,
            receptors,
            links,
            meteos,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Run label from the run record
    pub fn run(&self) -> &str {
        &self.run
    }

    pub fn site(&self) -> &SiteConditions {
        &self.site
    }

    pub fn factors(&self) -> &SiteFactors {
        &self.factors
    }

    pub fn receptors(&self) -> &[Receptor] {
        &self.receptors
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn meteos(&self) -> &[Meteo] {
        &self.meteos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn site(atim: f64, z0: f64) -> SiteConditions {
        SiteConditions {
            averaging_time: Minutes::new(atim),
            roughness: Centimeters::new(z0),
            settling_velocity: MetersPerSecond::ZERO,
            deposition_velocity: MetersPerSecond::ZERO,
        }
    }

    #[test]
    fn test_reference_site_has_unit_factors() {
        let f = SiteFactors::new(Centimeters::new(3.0), Minutes::new(3.0));
        assert_relative_eq!(f.rfac_3cm_02, 1.0);
        assert_relative_eq!(f.rfac_3cm_007, 1.0);
        assert_relative_eq!(f.afac_3min_02, 1.0);
        assert_relative_eq!(f.rfac_10cm_007, 0.3_f64.powf(0.07));
        assert_relative_eq!(f.afac_30min_02, 0.1_f64.powf(0.2));
    }

    #[test]
    fn test_job_precomputes_factors() {
        let job = Job::new("T", "R", site(60.0, 100.0), vec![], vec![], vec![]).unwrap();
        assert_relative_eq!(job.factors().rfac_3cm_02, (100.0_f64 / 3.0).powf(0.2));
        assert_relative_eq!(job.factors().afac_30min_02, 2.0_f64.powf(0.2));
        assert_eq!(job.title(), "T");
        assert_eq!(job.run(), "R");
    }

    #[test]
    fn test_rejects_invalid_site() {
        assert!(matches!(
            Job::new("T", "R", site(0.0, 10.0), vec![], vec![], vec![]),
            Err(Caline3Error::InvalidSite(_))
        ));
        assert!(Job::new("T", "R", site(60.0, 0.0), vec![], vec![], vec![]).is_err());

        let mut s = site(60.0, 10.0);
        s.deposition_velocity = MetersPerSecond::new(-0.01);
        assert!(Job::new("T", "R", s, vec![], vec![], vec![]).is_err());
    }
}
