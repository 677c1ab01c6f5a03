//! Job driver
//!
//! Evaluates every (link, receptor) pair of a job for each meteorological
//! scenario. Evaluations are independent, so links and scenarios are
//! spread over the rayon thread pool; results are collected in ordinal order
//! and are identical to a sequential run.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::core_types::job::Job;
use crate::core_types::link::Link;
use crate::core_types::meteo::Meteo;
use crate::core_types::units::MicrogramsPerCubicMeter;
use crate::error::Caline3Result;
use crate::physics::Plume;

/// Execution options for [`compute_meteo`] and [`compute_job`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Evaluate links and scenarios on the rayon thread pool
    pub parallel: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig { parallel: true }
    }
}

impl RunConfig {
    pub fn sequential() -> Self {
        RunConfig { parallel: false }
    }
}

/// Concentrations of one scenario, one row per link and one column per
/// receptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcentrationMatrix {
    meteo: usize,
    links: usize,
    receptors: usize,
    values: Vec<MicrogramsPerCubicMeter>,
}

impl ConcentrationMatrix {
    fn from_rows(meteo: usize, receptors: usize, rows: Vec<Vec<MicrogramsPerCubicMeter>>) -> Self {
        let links = rows.len();
        let values: Vec<_> = rows.into_iter().flatten().collect();
        debug_assert_eq!(values.len(), links * receptors);
        ConcentrationMatrix {
            meteo,
            links,
            receptors,
            values,
        }
    }

    /// Ordinal of the scenario these values belong to
    pub fn meteo(&self) -> usize {
        self.meteo
    }

    pub fn link_count(&self) -> usize {
        self.links
    }

    pub fn receptor_count(&self) -> usize {
        self.receptors
    }

    /// Contribution of `link` at `receptor`, by ordinal
    ///
    /// # Panics
    /// If either ordinal is out of range.
    pub fn get(&self, link: usize, receptor: usize) -> MicrogramsPerCubicMeter {
        assert!(link < self.links && receptor < self.receptors);
        self.values[link * self.receptors + receptor]
    }

    /// Contributions of one link at every receptor
    pub fn row(&self, link: usize) -> &[MicrogramsPerCubicMeter] {
        &self.values[link * self.receptors..(link + 1) * self.receptors]
    }

    /// Sum of all link contributions at `receptor` (ambient not included)
    pub fn receptor_total(&self, receptor: usize) -> MicrogramsPerCubicMeter {
        (0..self.links).map(|link| self.get(link, receptor)).sum()
    }

    /// Raw values, link-major
    pub fn values(&self) -> &[MicrogramsPerCubicMeter] {
        &self.values
    }
}

fn link_row(job: &Job, meteo: &Meteo, link: &Link) -> Caline3Result<Vec<MicrogramsPerCubicMeter>> {
    let plume = Plume::new(job, meteo, link)?;
    Ok(job
        .receptors()
        .iter()
        .map(|receptor| plume.concentration_at(receptor))
        .collect())
}

/// Concentrations of every link at every receptor for one scenario
///
/// # Errors
/// Returns the first calibration error raised by a link.
pub fn compute_meteo(
    job: &Job,
    meteo: &Meteo,
    config: &RunConfig,
) -> Caline3Result<ConcentrationMatrix> {
    debug!(
        meteo = meteo.ordinal() + 1,
        bearing = *meteo.wind_bearing(),
        stability = %meteo.stability(),
        "Computing scenario"
    );

    let rows = if config.parallel {
        job.links()
            .par_iter()
            .map(|link| link_row(job, meteo, link))
            .collect::<Caline3Result<Vec<_>>>()?
    } else {
        job.links()
            .iter()
            .map(|link| link_row(job, meteo, link))
            .collect::<Caline3Result<Vec<_>>>()?
    };

    Ok(ConcentrationMatrix::from_rows(
        meteo.ordinal(),
        job.receptors().len(),
        rows,
    ))
}

/// Concentration matrices for every scenario of a job, in scenario order
///
/// # Errors
/// Returns the first calibration error raised by any (scenario, link).
pub fn compute_job(job: &Job, config: &RunConfig) -> Caline3Result<Vec<ConcentrationMatrix>> {
    info!(
        "Running job '{}': {} links, {} receptors, {} scenarios",
        job.title(),
        job.links().len(),
        job.receptors().len(),
        job.meteos().len()
    );

    if config.parallel {
        job.meteos()
            .par_iter()
            .map(|meteo| compute_meteo(job, meteo, config))
            .collect()
    } else {
        job.meteos()
            .iter()
            .map(|meteo| compute_meteo(job, meteo, config))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::job::SiteConditions;
    use crate::core_types::link::{LinkSpec, LinkType};
    use crate::core_types::meteo::StabilityClass;
    use crate::core_types::receptor::Receptor;
    use crate::core_types::units::{
        Centimeters, Degrees, MetersPerSecond, Minutes, PartsPerMillion,
    };
    use crate::error::Caline3Error;
    use nalgebra::{Point2, Point3};

    fn link(ordinal: usize, x: f64, width: f64) -> Link {
        Link::new(
            ordinal,
            LinkSpec {
                name: format!("L{ordinal}"),
                kind: LinkType::AtGrade,
                start: Point2::new(x, -1000.0),
                end: Point2::new(x, 1000.0),
                traffic: 3000.0,
                emission_factor: 15.0,
                height: 0.0,
                width,
            },
        )
        .unwrap()
    }

    fn job(links: Vec<Link>) -> Job {
        let receptors = (0..5)
            .map(|i| Receptor::new(i, format!("R{i}"), Point3::new(-100.0 + 50.0 * i as f64, 0.0, 1.8)))
            .collect();
        let meteos = [0.0, 90.0, 250.0]
            .iter()
            .enumerate()
            .map(|(i, brg)| {
                Meteo::new(
                    i,
                    MetersPerSecond::new(1.5),
                    Degrees::new(*brg),
                    StabilityClass::E,
                    1000.0,
                    PartsPerMillion::new(1.0),
                )
                .unwrap()
            })
            .collect();
        Job::new(
            "T",
            "R",
            SiteConditions {
                averaging_time: Minutes::new(60.0),
                roughness: Centimeters::new(30.0),
                settling_velocity: MetersPerSecond::ZERO,
                deposition_velocity: MetersPerSecond::ZERO,
            },
            receptors,
            links,
            meteos,
        )
        .unwrap()
    }

    #[test]
    fn test_matrix_layout() {
        let j = job(vec![link(0, 0.0, 10.0), link(1, 60.0, 10.0)]);
        let m = compute_meteo(&j, &j.meteos()[1], &RunConfig::default()).unwrap();
        assert_eq!(m.meteo(), 1);
        assert_eq!(m.link_count(), 2);
        assert_eq!(m.receptor_count(), 5);
        assert_eq!(m.values().len(), 10);
        assert_eq!(m.row(1)[3], m.get(1, 3));

        let direct = Plume::new(&j, &j.meteos()[1], &j.links()[1])
            .unwrap()
            .concentration_at(&j.receptors()[3]);
        assert_eq!(m.get(1, 3), direct);
    }

    #[test]
    fn test_receptor_total_sums_links() {
        let j = job(vec![link(0, 0.0, 10.0), link(1, 60.0, 10.0)]);
        let m = compute_meteo(&j, &j.meteos()[1], &RunConfig::default()).unwrap();
        for r in 0..5 {
            assert_eq!(m.receptor_total(r), m.get(0, r) + m.get(1, r));
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let j = job(vec![link(0, 0.0, 10.0), link(1, 60.0, 4.0), link(2, -30.0, 20.0)]);
        let par = compute_job(&j, &RunConfig::default()).unwrap();
        let seq = compute_job(&j, &RunConfig::sequential()).unwrap();
        assert_eq!(par, seq);
        assert_eq!(par.len(), 3);
        assert!(par.iter().enumerate().all(|(i, m)| m.meteo() == i));
    }

    #[test]
    fn test_calibration_error_propagates() {
        let j = job(vec![link(0, 0.0, 10.0), link(1, 60.0, 20_000.0 - Link::WAKE_ALLOWANCE)]);
        let err = compute_job(&j, &RunConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            Caline3Error::DegenerateCalibration { ref link, .. } if link == "L1"
        ));
    }
}
