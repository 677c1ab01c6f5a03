//! Roadway links (finite line sources)
//!
//! A link is a straight roadway segment with a uniform traffic emission rate.
//! Dispersion is computed over its mixing zone: the traveled way plus 3 m on
//! each side to account for the vehicle wake.
//!
//! # Cross-section types
//! | Code | Type | Source height | Receptor level | Wind-speed correction |
//! |------|------|---------------|----------------|-----------------------|
//! | `AG` | at-grade | H | z | none |
//! | `BR` | bridge | H | z | none |
//! | `FL` | fill | 0 | z − H | none |
//! | `DP` | depressed | 0 | z | `DSTR` near the cut when H < −1.5 m |

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core_types::geometry::{azimuth, distance};
use crate::core_types::receptor::Receptor;
use crate::core_types::units::{Degrees, Meters, MicrogramsPerMeterSecond};
use crate::error::{Caline3Error, Caline3Result};

/// Roadway cross-section type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    /// At grade (`AG`)
    AtGrade,
    /// Bridge (`BR`): elevated source with air flowing underneath
    Bridge,
    /// Fill (`FL`): roadway on an embankment, treated as at grade on top of it
    Fill,
    /// Depressed section (`DP`): cut below grade
    Depressed,
}

impl LinkType {
    /// Parse a two-letter input code
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "AG" => Some(LinkType::AtGrade),
            "BR" => Some(LinkType::Bridge),
            "FL" => Some(LinkType::Fill),
            "DP" => Some(LinkType::Depressed),
            _ => None,
        }
    }

    /// Two-letter input code
    pub fn code(self) -> &'static str {
        match self {
            LinkType::AtGrade => "AG",
            LinkType::Bridge => "BR",
            LinkType::Fill => "FL",
            LinkType::Depressed => "DP",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Input description of a link, before derived geometry is computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub name: String,
    pub kind: LinkType,
    pub start: Point2<f64>,
    pub end: Point2<f64>,
    /// Traffic volume (veh/h)
    pub traffic: f64,
    /// Emission factor (g/mile per vehicle)
    pub emission_factor: f64,
    /// Source height relative to the receptor datum (m); negative for cuts
    pub height: f64,
    /// Traveled-way width (m)
    pub width: f64,
}

/// Receptor position expressed relative to a link
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkFrame {
    /// Signed perpendicular distance D from the link line. Positive on the
    /// left of the start → end direction.
    pub distance: f64,
    /// Along-link coordinate L: the negated offset of the receptor's
    /// projection from the link start (projection at `-L` from the start)
    pub offset: f64,
    /// Receptor level Z adjusted for the link type
    pub level: f64,
}

/// A roadway link with its derived geometry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub(crate) ordinal: usize,
    pub(crate) name: String,
    pub(crate) kind: LinkType,
    pub(crate) start: Point2<f64>,
    pub(crate) end: Point2<f64>,
    pub(crate) traffic: f64,
    pub(crate) emission_factor: f64,
    pub(crate) height: f64,
    pub(crate) width: Meters,

    // Derived
    pub(crate) length: Meters,
    pub(crate) bearing: Degrees,
    pub(crate) mixing_width: Meters,
    pub(crate) half_width: Meters,
    pub(crate) lineal_strength: MicrogramsPerMeterSecond,
    pub(crate) residence_factor: f64,
}

impl Link {
    /// Vehicle wake allowance added to the traveled way (3 m per side)
    pub const WAKE_ALLOWANCE: f64 = 6.0;

    /// Depressed sections shallower than this depth behave as at grade
    pub const DEPRESSION_THRESHOLD: f64 = -1.5;

    /// Distance between the traveled-way edge and the mixing-zone edge
    const SHOULDER: f64 = 3.0;

    /// Build a link and derive its length, bearing, mixing zone and strength
    ///
    /// # Errors
    /// Returns [`Caline3Error::InvalidLink`] for a negative width, negative
    /// traffic or emission factor, or non-finite coordinates.
    pub fn new(ordinal: usize, spec: LinkSpec) -> Caline3Result<Self> {
        let invalid = |reason: String| Caline3Error::InvalidLink {
            name: spec.name.clone(),
            reason,
        };

        let coords = [spec.start.x, spec.start.y, spec.end.x, spec.end.y];
        if coords.iter().any(|c| !c.is_finite()) || !spec.height.is_finite() {
            return Err(invalid("coordinates and height must be finite".into()));
        }
        if !spec.width.is_finite() || spec.width < 0.0 {
            return Err(invalid(format!(
                "width must be non-negative, got {}",
                spec.width
            )));
        }
        if !spec.traffic.is_finite() || spec.traffic < 0.0 {
            return Err(invalid(format!(
                "traffic volume must be non-negative, got {}",
                spec.traffic
            )));
        }
        if !spec.emission_factor.is_finite() || spec.emission_factor < 0.0 {
            return Err(invalid(format!(
                "emission factor must be non-negative, got {}",
                spec.emission_factor
            )));
        }

        let length = distance(&spec.start, &spec.end);
        if *length == 0.0 {
            tracing::warn!(link = %spec.name, "Zero-length link contributes nothing");
        }

        let bearing = azimuth(&spec.start, &spec.end).to_degrees();
        let width = Meters::new(spec.width);
        let mixing_width = Meters::new(spec.width + Self::WAKE_ALLOWANCE);
        let half_width = mixing_width / 2.0;
        let lineal_strength =
            MicrogramsPerMeterSecond::from_traffic(spec.traffic, spec.emission_factor);

        let depth = match spec.kind {
            LinkType::Depressed => spec.height,
            _ => 0.0,
        };
        let residence_factor = if depth < Self::DEPRESSION_THRESHOLD {
            0.72 * depth.abs().powf(0.83)
        } else {
            1.0
        };

        Ok(Link {
            ordinal,
            name: spec.name,
            kind: spec.kind,
            start: spec.start,
            end: spec.end,
            traffic: spec.traffic,
            emission_factor: spec.emission_factor,
            height: spec.height,
            width,
            length,
            bearing,
            mixing_width,
            half_width,
            lineal_strength,
            residence_factor,
        })
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> LinkType {
        self.kind
    }

    pub fn start(&self) -> &Point2<f64> {
        &self.start
    }

    pub fn end(&self) -> &Point2<f64> {
        &self.end
    }

    /// Traffic volume (veh/h)
    pub fn traffic(&self) -> f64 {
        self.traffic
    }

    /// Emission factor (g/mile)
    pub fn emission_factor(&self) -> f64 {
        self.emission_factor
    }

    /// Height as given in the input (m)
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Traveled-way width
    pub fn width(&self) -> Meters {
        self.width
    }

    pub fn length(&self) -> Meters {
        self.length
    }

    /// Bearing of the start → end direction
    pub fn bearing(&self) -> Degrees {
        self.bearing
    }

    /// Mixing-zone width W (traveled way plus wake allowance)
    pub fn mixing_width(&self) -> Meters {
        self.mixing_width
    }

    /// Mixing-zone half-width W2
    pub fn half_width(&self) -> Meters {
        self.half_width
    }

    /// Lineal source strength Q1
    pub fn lineal_strength(&self) -> MicrogramsPerMeterSecond {
        self.lineal_strength
    }

    /// Residence-time multiplier DSTR for deep depressed sections (1 otherwise)
    pub fn residence_factor(&self) -> f64 {
        self.residence_factor
    }

    /// Depth of the cut for depressed sections, 0 for other types
    pub fn depression_depth(&self) -> f64 {
        match self.kind {
            LinkType::Depressed => self.height,
            _ => 0.0,
        }
    }

    /// Effective source height H used by the vertical plume terms
    pub fn source_height(&self) -> f64 {
        match self.kind {
            LinkType::AtGrade | LinkType::Bridge => self.height,
            LinkType::Fill | LinkType::Depressed => 0.0,
        }
    }

    /// Express a receptor in link coordinates (D, L, Z)
    ///
    /// From the squared distances `A` and `B` of the receptor to the link
    /// ends, `L = (B − A − LL²) / 2LL` and `|D| = √(A − L²)`. D is positive
    /// on the left of the link direction so that, with the wind bearing
    /// measured as the direction the wind blows from, `D·sin(φ)` is the
    /// downwind fetch of the receptor's projection.
    pub fn to_link_frame(&self, receptor: &Receptor) -> LinkFrame {
        let r = receptor.plan();
        let level = match self.kind {
            LinkType::Fill => receptor.z() - self.height,
            _ => receptor.z(),
        };

        let ll = *self.length;
        if ll == 0.0 {
            return LinkFrame {
                distance: *distance(&self.start, &r),
                offset: 0.0,
                level,
            };
        }

        let a = (r - self.start).norm_squared();
        let b = (r - self.end).norm_squared();
        let offset = (b - a - ll * ll) / (2.0 * ll);

        let mut d = if a > offset * offset {
            (a - offset * offset).sqrt()
        } else {
            0.0
        };
        if d > 0.0 && (azimuth(&self.start, &r) - self.bearing.to_radians()).sin() > 0.0 {
            // Receptor on the right-hand side
            d = -d;
        }

        LinkFrame {
            distance: d,
            offset,
            level,
        }
    }

    /// Wind-speed reduction inside a deep depressed section
    ///
    /// Inside the cut (|D| below the traveled-way half-width) concentrations
    /// are scaled by `DSTR`; beyond the edge the factor decays linearly to 1
    /// over `2|HDS| + 3` meters. Links that are not deep depressed sections
    /// return 1.
    pub fn depressed_section_factor(&self, d: f64) -> f64 {
        let depth = self.depression_depth();
        if depth >= Self::DEPRESSION_THRESHOLD {
            return 1.0;
        }

        let d = d.abs();
        let edge = *self.half_width - Self::SHOULDER;
        if d < edge {
            return self.residence_factor;
        }

        let decay = (self.residence_factor - 1.0) * (d - edge) / (2.0 * depth.abs() + Self::SHOULDER);
        (self.residence_factor - decay).max(1.0)
    }
}
