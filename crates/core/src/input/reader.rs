//! Fixed-column CALINE3 input reader
//!
//! A job is a sequence of records, one per line:
//!
//! | Record | Count | Columns |
//! |--------|-------|---------|
//! | job | 1 | title 1-40, ATIM 41-44, Z0 45-48, VS 49-53, VD 54-58, NR 59-60, SCAL 61-70 |
//! | receptor | NR | name 1-20, X 21-30, Y 31-40, Z 41-50 |
//! | run | 1 | title 1-40, NL 41-43, NM 44-46 |
//! | link | NL | name 1-20, type 21-22, X1 23-29, Y1 30-36, X2 37-43, Y2 44-50, VPH 51-58, EF 59-62, H 63-66, W 67-70 |
//! | meteo | NM | U 1-3, BRG 4-7, CLAS 8, MIXH 9-14, AMB 15-18 |
//!
//! Blank numeric fields read as zero, except SCAL which defaults to 1.
//! Coordinates, receptor heights, link heights and widths are multiplied by
//! SCAL. Velocities are given in cm/s.

use std::io::BufRead;
use std::ops::Range;

use nalgebra::{Point2, Point3};

use crate::core_types::job::{Job, SiteConditions};
use crate::core_types::link::{Link, LinkSpec, LinkType};
use crate::core_types::meteo::{Meteo, StabilityClass};
use crate::core_types::receptor::Receptor;
use crate::core_types::units::{Centimeters, Degrees, MetersPerSecond, Minutes, PartsPerMillion};
use crate::error::{Caline3Error, Caline3Result};

mod columns {
    use std::ops::Range;

    pub const JOB_TITLE: Range<usize> = 0..40;
    pub const ATIM: Range<usize> = 40..44;
    pub const Z0: Range<usize> = 44..48;
    pub const VS: Range<usize> = 48..53;
    pub const VD: Range<usize> = 53..58;
    pub const NR: Range<usize> = 58..60;
    pub const SCAL: Range<usize> = 60..70;

    pub const RECEPTOR_NAME: Range<usize> = 0..20;
    pub const RX: Range<usize> = 20..30;
    pub const RY: Range<usize> = 30..40;
    pub const RZ: Range<usize> = 40..50;

    pub const RUN_TITLE: Range<usize> = 0..40;
    pub const NL: Range<usize> = 40..43;
    pub const NM: Range<usize> = 43..46;

    pub const LINK_NAME: Range<usize> = 0..20;
    pub const LINK_TYPE: Range<usize> = 20..22;
    pub const X1: Range<usize> = 22..29;
    pub const Y1: Range<usize> = 29..36;
    pub const X2: Range<usize> = 36..43;
    pub const Y2: Range<usize> = 43..50;
    pub const VPH: Range<usize> = 50..58;
    pub const EF: Range<usize> = 58..62;
    pub const H: Range<usize> = 62..66;
    pub const W: Range<usize> = 66..70;

    pub const U: Range<usize> = 0..3;
    pub const BRG: Range<usize> = 3..7;
    pub const CLAS: Range<usize> = 7..8;
    pub const MIXH: Range<usize> = 8..14;
    pub const AMB: Range<usize> = 14..18;
}

/// One input line with its 1-based line number
struct Record {
    line: usize,
    text: String,
}

impl Record {
    /// Characters in `cols`, clipped to the line length
    fn field(&self, cols: Range<usize>) -> &str {
        let byte = |n: usize| {
            self.text
                .char_indices()
                .nth(n)
                .map_or(self.text.len(), |(i, _)| i)
        };
        &self.text[byte(cols.start)..byte(cols.end)]
    }

    fn text(&self, cols: Range<usize>) -> String {
        self.field(cols).trim().to_string()
    }

    fn real(&self, cols: Range<usize>, name: &str) -> Caline3Result<f64> {
        let raw = self.field(cols).trim();
        if raw.is_empty() {
            return Ok(0.0);
        }
        raw.parse::<f64>().map_err(|_| self.error(format!("invalid {name} '{raw}'")))
    }

    fn integer(&self, cols: Range<usize>, name: &str) -> Caline3Result<usize> {
        let raw = self.field(cols).trim();
        if raw.is_empty() {
            return Ok(0);
        }
        raw.parse::<usize>().map_err(|_| self.error(format!("invalid {name} '{raw}'")))
    }

    fn error(&self, message: String) -> Caline3Error {
        Caline3Error::Parse {
            line: self.line,
            message,
        }
    }
}

/// Reads successive jobs from a CALINE3 input stream
///
/// # Example
/// ```
/// use caline3_core::input::JobReader;
///
/// let input = "\
/// DEMO                                     60. 10.   0.   0. 1        1.
/// R1                         30.        0.       1.8
/// RUN                                       1  1
/// L1                  AG     0.  -500.     0.   500.   1000. 10.  0. 10.
/// 1. 270.4 1000. 0.0
/// ";
/// let mut reader = JobReader::new(input.as_bytes());
/// let job = reader.read().unwrap().unwrap();
/// assert_eq!(job.receptors().len(), 1);
/// assert!(reader.read().unwrap().is_none());
/// ```
pub struct JobReader<R> {
    reader: R,
    line: usize,
}

impl<R: BufRead> JobReader<R> {
    pub fn new(reader: R) -> Self {
        JobReader { reader, line: 0 }
    }

    /// Read the next job
    ///
    /// Returns `Ok(None)` at end of input. Blank lines between jobs are
    /// skipped.
    ///
    /// # Errors
    /// [`Caline3Error::Parse`] for malformed or missing records (with the
    /// offending line number), the validation errors of the data model for
    /// out-of-range values, and [`Caline3Error::Io`] for read failures.
    pub fn read(&mut self) -> Caline3Result<Option<Job>> {
        let header = loop {
            match self.next_record()? {
                None => return Ok(None),
                Some(r) if r.text.trim().is_empty() => continue,
                Some(r) => break r,
            }
        };

        let title = header.text(columns::JOB_TITLE);
        let site = SiteConditions {
            averaging_time: Minutes::new(header.real(columns::ATIM, "averaging time")?),
            roughness: Centimeters::new(header.real(columns::Z0, "surface roughness")?),
            settling_velocity: MetersPerSecond::from_centimeters_per_second(
                header.real(columns::VS, "settling velocity")?,
            ),
            deposition_velocity: MetersPerSecond::from_centimeters_per_second(
                header.real(columns::VD, "deposition velocity")?,
            ),
        };
        let receptor_count = header.integer(columns::NR, "receptor count")?;
        let scale = match header.real(columns::SCAL, "scale factor")? {
            s if s == 0.0 => 1.0,
            s => s,
        };

        let mut receptors = Vec::with_capacity(receptor_count);
        for ordinal in 0..receptor_count {
            let r = self.expect_record("receptor")?;
            receptors.push(Receptor::new(
                ordinal,
                r.text(columns::RECEPTOR_NAME),
                Point3::new(
                    r.real(columns::RX, "receptor x")? * scale,
                    r.real(columns::RY, "receptor y")? * scale,
                    r.real(columns::RZ, "receptor z")? * scale,
                ),
            ));
        }

        let run_record = self.expect_record("run")?;
        let run = run_record.text(columns::RUN_TITLE);
        let link_count = run_record.integer(columns::NL, "link count")?;
        let meteo_count = run_record.integer(columns::NM, "meteorology count")?;

        let mut links = Vec::with_capacity(link_count);
        for ordinal in 0..link_count {
            let r = self.expect_record("link")?;
            let code = r.field(columns::LINK_TYPE).to_string();
            let kind = LinkType::from_code(&code)
                .ok_or_else(|| r.error(format!("unknown link type '{}'", code.trim())))?;
            links.push(Link::new(
                ordinal,
                LinkSpec {
                    name: r.text(columns::LINK_NAME),
                    kind,
                    start: Point2::new(
                        r.real(columns::X1, "x1")? * scale,
                        r.real(columns::Y1, "y1")? * scale,
                    ),
                    end: Point2::new(
                        r.real(columns::X2, "x2")? * scale,
                        r.real(columns::Y2, "y2")? * scale,
                    ),
                    traffic: r.real(columns::VPH, "traffic volume")?,
                    emission_factor: r.real(columns::EF, "emission factor")?,
                    height: r.real(columns::H, "height")? * scale,
                    width: r.real(columns::W, "width")? * scale,
                },
            )?);
        }

        let mut meteos = Vec::with_capacity(meteo_count);
        for ordinal in 0..meteo_count {
            let r = self.expect_record("meteorology")?;
            let class_code = r.integer(columns::CLAS, "stability class")?;
            let stability = u8::try_from(class_code)
                .ok()
                .and_then(StabilityClass::from_code)
                .ok_or_else(|| r.error(format!("stability class must be 1-6, got {class_code}")))?;
            meteos.push(Meteo::new(
                ordinal,
                MetersPerSecond::new(r.real(columns::U, "wind speed")?),
                Degrees::new(r.real(columns::BRG, "wind bearing")?),
                stability,
                r.real(columns::MIXH, "mixing height")?,
                PartsPerMillion::new(r.real(columns::AMB, "ambient concentration")?),
            )?);
        }

        let job = Job::new(title, run, site, receptors, links, meteos)?;
        tracing::debug!(
            title = job.title(),
            receptors = job.receptors().len(),
            links = job.links().len(),
            meteos = job.meteos().len(),
            "Read job"
        );
        Ok(Some(job))
    }

    fn next_record(&mut self) -> Caline3Result<Option<Record>> {
        let mut text = String::new();
        if self.reader.read_line(&mut text)? == 0 {
            return Ok(None);
        }
        self.line += 1;

        let trimmed = text.trim_end_matches(['\n', '\r']).len();
        text.truncate(trimmed);
        Ok(Some(Record {
            line: self.line,
            text,
        }))
    }

    fn expect_record(&mut self, kind: &str) -> Caline3Result<Record> {
        self.next_record()?.ok_or_else(|| Caline3Error::Parse {
            line: self.line + 1,
            message: format!("unexpected end of input, expected {kind} record"),
        })
    }
}

impl<R: BufRead> Iterator for JobReader<R> {
    type Item = Caline3Result<Job>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SIMPLE: &str = "\
SIMPLE                                   30. 50.  1.5  0.5 2       10.
NEAR                        3.        0.      0.18
FAR                        50.        0.      0.18
RUN ONE                                   2  2
A                   FL   -10.   -20.    10.    20.   2000. 12. 0.3  1.
B                   DP     0.     0.     0.   100.    500.  8.-0.2 0.8
 2.270.4  800. 1.5
1.5 90.3  400. 0.0
";

    #[test]
    fn test_reads_all_records() {
        let job = JobReader::new(SIMPLE.as_bytes()).read().unwrap().unwrap();

        assert_eq!(job.title(), "SIMPLE");
        assert_eq!(job.run(), "RUN ONE");
        assert_relative_eq!(*job.site().averaging_time, 30.0);
        assert_relative_eq!(*job.site().roughness, 50.0);
        assert_relative_eq!(*job.site().settling_velocity, 0.015);
        assert_relative_eq!(*job.site().deposition_velocity, 0.005);

        assert_eq!(job.receptors().len(), 2);
        let far = &job.receptors()[1];
        assert_eq!(far.name(), "FAR");
        assert_eq!(far.ordinal(), 1);
        assert_relative_eq!(far.position().x, 500.0);
        assert_relative_eq!(far.z(), 1.8);

        assert_eq!(job.links().len(), 2);
        let a = &job.links()[0];
        assert_eq!(a.kind(), LinkType::Fill);
        assert_relative_eq!(a.start().x, -100.0);
        assert_relative_eq!(a.end().y, 200.0);
        assert_relative_eq!(a.traffic(), 2000.0);
        assert_relative_eq!(a.emission_factor(), 12.0);
        assert_relative_eq!(a.height(), 3.0);
        assert_relative_eq!(*a.width(), 10.0);
        let b = &job.links()[1];
        assert_eq!(b.kind(), LinkType::Depressed);
        assert_relative_eq!(b.height(), -2.0);

        assert_eq!(job.meteos().len(), 2);
        let m = &job.meteos()[0];
        assert_relative_eq!(*m.wind_speed(), 2.0);
        assert_relative_eq!(*m.wind_bearing(), 270.0);
        assert_eq!(m.stability(), StabilityClass::D);
        assert_relative_eq!(*m.mixing_height(), 800.0);
        assert_relative_eq!(*m.ambient(), 1.5);

        let low_lid = &job.meteos()[1];
        assert_eq!(low_lid.stability(), StabilityClass::C);
        assert_relative_eq!(*low_lid.mixing_height(), 400.0);
        assert!(!low_lid.has_unlimited_mixing());
    }

    #[test]
    fn test_reads_successive_jobs() {
        let two = format!("{SIMPLE}\n{SIMPLE}");
        let jobs: Vec<_> = JobReader::new(two.as_bytes())
            .collect::<Caline3Result<_>>()
            .unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].links().len(), 2);
    }

    #[test]
    fn test_empty_input_has_no_job() {
        assert!(JobReader::new("".as_bytes()).read().unwrap().is_none());
        assert!(JobReader::new("\n  \n".as_bytes()).read().unwrap().is_none());
    }

    #[test]
    fn test_blank_scale_defaults_to_one() {
        let input = "\
NOSCALE                                  60. 10.   0.   0. 1
R                          30.        0.       1.8
RUN                                       0  0
";
        let job = JobReader::new(input.as_bytes()).read().unwrap().unwrap();
        assert_relative_eq!(job.receptors()[0].position().x, 30.0);
        assert!(job.links().is_empty());
    }

    #[test]
    fn test_malformed_number_reports_line() {
        let bad = SIMPLE.replace("-20.", "-2x.");
        let err = JobReader::new(bad.as_bytes()).read().unwrap_err();
        match err {
            Caline3Error::Parse { line, message } => {
                assert_eq!(line, 5);
                assert!(message.contains("y1"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_link_type() {
        let bad = SIMPLE.replace("A                   FL", "A                   XX");
        assert!(matches!(
            JobReader::new(bad.as_bytes()).read(),
            Err(Caline3Error::Parse { line: 5, .. })
        ));
    }

    #[test]
    fn test_bad_stability_class() {
        let bad = SIMPLE.replace(" 2.270.4", " 2.270.9");
        assert!(matches!(
            JobReader::new(bad.as_bytes()).read(),
            Err(Caline3Error::Parse { line: 7, .. })
        ));
    }

    #[test]
    fn test_truncated_input() {
        let truncated: String = SIMPLE.lines().take(4).map(|l| format!("{l}\n")).collect();
        assert!(matches!(
            JobReader::new(truncated.as_bytes()).read(),
            Err(Caline3Error::Parse { line: 5, .. })
        ));
    }

    #[test]
    fn test_blank_mixing_height_is_a_meteo_error() {
        let bad = SIMPLE.replace("1.5 90.3  400. 0.0", "1.5 90.3       0.0");
        let err = JobReader::new(bad.as_bytes()).read().unwrap_err();
        assert!(matches!(err, Caline3Error::InvalidMeteo { ordinal: 1, .. }));
        assert!(err.to_string().contains("mixing height"), "{err}");
    }

    #[test]
    fn test_calm_wind_is_a_meteo_error() {
        let bad = SIMPLE.replace("1.5 90.3", " 0. 90.3");
        assert!(matches!(
            JobReader::new(bad.as_bytes()).read(),
            Err(Caline3Error::InvalidMeteo { ordinal: 1, .. })
        ));
    }
}
