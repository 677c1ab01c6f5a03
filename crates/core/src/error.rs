//! Errors raised while reading a job or preparing a dispersion run
//!
//! All physical-input validation happens once, when the data model or a
//! [`Plume`](crate::physics::Plume) is constructed. A concentration evaluation
//! itself never fails.

use std::fmt;
use std::io;

/// Errors that can occur while building or running a CALINE3 job
#[derive(Debug)]
pub enum Caline3Error {
    /// Meteorological scenario with out-of-range conditions
    InvalidMeteo {
        /// Position of the scenario in the job (0-based)
        ordinal: usize,
        /// What is wrong with it
        reason: String,
    },
    /// Link with invalid geometry or emission data
    InvalidLink {
        /// Link name as given in the input
        name: String,
        /// What is wrong with it
        reason: String,
    },
    /// Site-wide parameter (roughness, averaging time, velocities) out of range
    InvalidSite(String),
    /// The sigma-z power law cannot be fitted for this link: its half-width
    /// coincides with the 10 km reference distance or produced a non-finite fit
    DegenerateCalibration {
        /// Link name
        link: String,
        /// Mixing-zone half-width in meters
        half_width: f64,
    },
    /// Malformed input record
    Parse {
        /// 1-based input line number
        line: usize,
        /// Description of the problem
        message: String,
    },
    /// Failure reading the input stream
    Io(io::Error),
}

impl fmt::Display for Caline3Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caline3Error::InvalidMeteo { ordinal, reason } => {
                write!(f, "Invalid meteorology #{}: {reason}", ordinal + 1)
            }
            Caline3Error::InvalidLink { name, reason } => {
                write!(f, "Invalid link '{name}': {reason}")
            }
            Caline3Error::InvalidSite(msg) => write!(f, "Invalid site parameters: {msg}"),
            Caline3Error::DegenerateCalibration { link, half_width } => write!(
                f,
                "Cannot fit vertical dispersion curve for link '{link}' (half-width {half_width} m)"
            ),
            Caline3Error::Parse { line, message } => write!(f, "Line {line}: {message}"),
            Caline3Error::Io(e) => write!(f, "Failed to read input: {e}"),
        }
    }
}

impl std::error::Error for Caline3Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Caline3Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Caline3Error {
    fn from(e: io::Error) -> Self {
        Caline3Error::Io(e)
    }
}

/// Result alias used throughout the crate
pub type Caline3Result<T> = Result<T, Caline3Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meteo_error_is_one_based() {
        let err = Caline3Error::InvalidMeteo {
            ordinal: 2,
            reason: "wind speed must be positive".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid meteorology #3: wind speed must be positive"
        );
    }

    #[test]
    fn test_io_error_has_source() {
        let err: Caline3Error = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(std::error::Error::source(&err).is_some());
    }
}
