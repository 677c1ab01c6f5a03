//! Concentration reports
//!
//! Converts a scenario's mass concentrations to mixing ratios and lays them
//! out as the classic CALINE3 printout: site variables, link variables, then
//! one line per receptor with its total (ambient included) and the
//! contribution of each link.

use serde::Serialize;
use std::fmt::Write;

use crate::core_types::job::Job;
use crate::core_types::meteo::Meteo;
use crate::core_types::units::PartsPerMillion;
use crate::simulation::ConcentrationMatrix;

/// Report options
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportConfig {
    /// Molecular weight of the pollutant [g/mol]
    pub molecular_weight: f64,
    /// Decimal digits kept in reported mixing ratios
    pub digits: u32,
}

impl ReportConfig {
    /// Molecular weight of carbon monoxide
    pub const CO_MOLECULAR_WEIGHT: f64 = 28.0;
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            molecular_weight: Self::CO_MOLECULAR_WEIGHT,
            digits: 1,
        }
    }
}

/// Reported values at one receptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceptorResult {
    pub receptor: String,
    /// Sum of all links plus the ambient concentration
    pub total: PartsPerMillion,
    /// Contribution of each link, in link order
    pub links: Vec<PartsPerMillion>,
}

/// Reported values of one scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeteoResult {
    pub meteo: Meteo,
    pub receptors: Vec<ReceptorResult>,
}

/// Convert and round a scenario's concentrations
pub fn summarize(
    job: &Job,
    meteo: &Meteo,
    matrix: &ConcentrationMatrix,
    config: &ReportConfig,
) -> MeteoResult {
    let mw = config.molecular_weight;
    let receptors = job
        .receptors()
        .iter()
        .map(|receptor| {
            let r = receptor.ordinal();
            let total = (matrix.receptor_total(r).to_ppm(mw) + meteo.ambient()).round(config.digits);
            let links = (0..matrix.link_count())
                .map(|l| matrix.get(l, r).to_ppm(mw).round(config.digits))
                .collect();
            ReceptorResult {
                receptor: receptor.name().to_string(),
                total,
                links,
            }
        })
        .collect();

    MeteoResult {
        meteo: meteo.clone(),
        receptors,
    }
}

/// Render the text report of one scenario
pub fn render(
    job: &Job,
    meteo: &Meteo,
    matrix: &ConcentrationMatrix,
    config: &ReportConfig,
) -> String {
    let result = summarize(job, meteo, matrix, config);
    let site = job.site();
    let digits = config.digits as usize;
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "  CALINE3: CALIFORNIA LINE SOURCE DISPERSION MODEL");
    let _ = writeln!(out);
    let _ = writeln!(out, "  JOB: {:<40}  RUN: {}", job.title(), job.run());
    let _ = writeln!(out, "  METEOROLOGY #{}", meteo.ordinal() + 1);
    let _ = writeln!(out);

    let _ = writeln!(out, "  I. SITE VARIABLES");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "     U = {:5.1} M/S       Z0 = {:5.0}. CM       ATIM = {:3.0}. MINUTES",
        *meteo.wind_speed(),
        *site.roughness,
        *site.averaging_time
    );
    let _ = writeln!(
        out,
        "   BRG = {:5.1} DEGREES   VD = {:5.1} CM/S     MIXH = {:5.0}. M",
        *meteo.wind_bearing(),
        *site.deposition_velocity * 100.0,
        *meteo.mixing_height()
    );
    let _ = writeln!(
        out,
        "  CLAS = {:5} ({})       VS = {:5.1} CM/S      AMB = {:5.1} PPM",
        meteo.stability().code(),
        meteo.stability(),
        *site.settling_velocity * 100.0,
        *meteo.ambient()
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "  II. LINK VARIABLES");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "   {:<20} * {:>7} {:>7} {:>7} {:>7} * {:>6} {:>4} {:>4} {:>7} {:>6} {:>5} {:>5}",
        "LINK DESCRIPTION", "X1", "Y1", "X2", "Y2", "LENGTH", "BRG", "TYPE", "VPH", "EF", "H", "W"
    );
    for link in job.links() {
        let _ = writeln!(
            out,
            "   {:<20} * {:>7.0} {:>7.0} {:>7.0} {:>7.0} * {:>6.0} {:>4.0} {:>4} {:>7.0} {:>6.1} {:>5.1} {:>5.1}",
            format!("{}. {}", link_label(link.ordinal()), link.name()),
            link.start().x,
            link.start().y,
            link.end().x,
            link.end().y,
            *link.length(),
            *link.bearing(),
            link.kind(),
            link.traffic(),
            link.emission_factor(),
            link.height(),
            *link.width()
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "  III. RECEPTOR LOCATIONS AND MODEL RESULTS");
    let _ = writeln!(out);
    let mut header = format!(
        "   {:<20} * {:>7} {:>7} {:>6} * {:>7} *",
        "RECEPTOR", "X", "Y", "Z", "PPM"
    );
    for link in job.links() {
        let _ = write!(header, " {:>6}", link_label(link.ordinal()));
    }
    let _ = writeln!(out, "{header}");

    for (receptor, values) in job.receptors().iter().zip(&result.receptors) {
        let p = receptor.position();
        let _ = write!(
            out,
            "   {:<20} * {:>7.0} {:>7.0} {:>6.1} * {:>7.digits$} *",
            format!("{}. {}", receptor.ordinal() + 1, receptor.name()),
            p.x,
            p.y,
            p.z,
            *values.total
        );
        for c in &values.links {
            let _ = write!(out, " {:>6.digits$}", **c);
        }
        let _ = writeln!(out);
    }

    out
}

/// Column label of a link: A, B, ..., Z, AA, AB, ...
fn link_label(ordinal: usize) -> String {
    let mut n = ordinal + 1;
    let mut label = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        label.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    label.iter().rev().map(|b| char::from(*b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::job::SiteConditions;
    use crate::core_types::link::{Link, LinkSpec, LinkType};
    use crate::core_types::meteo::StabilityClass;
    use crate::core_types::receptor::Receptor;
    use crate::core_types::units::{
        Centimeters, Degrees, MetersPerSecond, MicrogramsPerCubicMeter, Minutes,
    };
    use crate::simulation::{compute_meteo, RunConfig};
    use approx::assert_relative_eq;
    use nalgebra::{Point2, Point3};

    fn job() -> Job {
        let link = Link::new(
            0,
            LinkSpec {
                name: "MAIN ST".into(),
                kind: LinkType::AtGrade,
                start: Point2::new(0.0, -2000.0),
                end: Point2::new(0.0, 2000.0),
                traffic: 8000.0,
                emission_factor: 25.0,
                height: 0.0,
                width: 16.0,
            },
        )
        .unwrap();
        let receptors = vec![
            Receptor::new(0, "EAST", Point3::new(30.0, 0.0, 1.8)),
            Receptor::new(1, "WEST", Point3::new(-30.0, 0.0, 1.8)),
        ];
        let meteo = Meteo::new(
            0,
            MetersPerSecond::new(1.0),
            Degrees::new(270.0),
            StabilityClass::F,
            1000.0,
            PartsPerMillion::new(3.0),
        )
        .unwrap();
        Job::new(
            "REPORT TEST",
            "ONE LINK",
            SiteConditions {
                averaging_time: Minutes::new(60.0),
                roughness: Centimeters::new(100.0),
                settling_velocity: MetersPerSecond::ZERO,
                deposition_velocity: MetersPerSecond::ZERO,
            },
            receptors,
            vec![link],
            vec![meteo],
        )
        .unwrap()
    }

    #[test]
    fn test_ppm_conversion() {
        let c = MicrogramsPerCubicMeter::new(1000.0);
        assert_relative_eq!(*c.to_ppm(ReportConfig::CO_MOLECULAR_WEIGHT), 0.875);
    }

    #[test]
    fn test_totals_include_ambient() {
        let j = job();
        let m = &j.meteos()[0];
        let matrix = compute_meteo(&j, m, &RunConfig::default()).unwrap();
        let result = summarize(&j, m, &matrix, &ReportConfig::default());

        let east = &result.receptors[0];
        let west = &result.receptors[1];
        assert!(*east.links[0] > 0.0);
        // Upwind receptor only sees the background
        assert_eq!(*west.links[0], 0.0);
        assert_relative_eq!(*west.total, 3.0);

        let expected = (matrix.receptor_total(0).to_ppm(28.0) + PartsPerMillion::new(3.0)).round(1);
        assert_eq!(east.total, expected);
        assert!(*east.total > 3.0);
    }

    #[test]
    fn test_rounding_digits() {
        let j = job();
        let m = &j.meteos()[0];
        let matrix = compute_meteo(&j, m, &RunConfig::default()).unwrap();
        let config = ReportConfig {
            digits: 3,
            ..ReportConfig::default()
        };
        let result = summarize(&j, m, &matrix, &config);
        let v = *result.receptors[0].links[0];
        assert_relative_eq!(v, (v * 1000.0).round() / 1000.0);
    }

    #[test]
    fn test_render_lists_links_and_receptors() {
        let j = job();
        let m = &j.meteos()[0];
        let matrix = compute_meteo(&j, m, &RunConfig::default()).unwrap();
        let text = render(&j, m, &matrix, &ReportConfig::default());

        assert!(text.contains("JOB: REPORT TEST"));
        assert!(text.contains("RUN: ONE LINK"));
        assert!(text.contains("A. MAIN ST"));
        assert!(text.contains("1. EAST"));
        assert!(text.contains("2. WEST"));
        assert!(text.contains("CLAS =     6 (F)"));
        assert!(text.contains("III. RECEPTOR LOCATIONS AND MODEL RESULTS"));
    }

    #[test]
    fn test_link_labels() {
        assert_eq!(link_label(0), "A");
        assert_eq!(link_label(25), "Z");
        assert_eq!(link_label(26), "AA");
        assert_eq!(link_label(27), "AB");
    }
}
