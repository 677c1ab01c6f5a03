//! Core types: units, geometry and the job data model

pub mod geometry;
pub mod job;
pub mod link;
pub mod meteo;
pub mod receptor;
pub mod units;

pub use job::{Job, SiteConditions, SiteFactors};
pub use link::{Link, LinkFrame, LinkSpec, LinkType};
pub use meteo::{Meteo, StabilityClass};
pub use receptor::Receptor;
pub use units::*;
