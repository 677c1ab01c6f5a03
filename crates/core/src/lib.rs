//! CALINE3 Line Source Dispersion Core Library
//!
//! Steady-state concentrations of an inert pollutant downwind of roadways,
//! computed with the CALINE3 segmented Gaussian-plume model (Benson, 1979).
//!
//! A [`Job`] holds the site conditions, receptors, roadway links and
//! meteorological scenarios. For each (scenario, link) a [`Plume`] fits the
//! dispersion curves once; it then splits the link into elements that grow
//! geometrically away from each receptor and sums their Gaussian
//! contributions, corrected for deposition, settling, reflections off the
//! ground and the mixing lid, and the reduced wind speed in deep cuts.
//!
//! ## Example
//! ```
//! use caline3_core::{compute_job, JobReader, RunConfig};
//!
//! let input = "\
//! DEMO                                     60. 10.   0.   0. 1        1.
//! R1                         30.        0.       1.8
//! RUN                                       1  1
//! L1                  AG     0.  -500.     0.   500.   1000. 10.  0. 10.
//! 1. 270.4 1000. 0.0
//! ";
//! let job = JobReader::new(input.as_bytes()).read().unwrap().unwrap();
//! let results = compute_job(&job, &RunConfig::default()).unwrap();
//! assert!(*results[0].get(0, 0) > 0.0);
//! ```

// Core types and utilities
pub mod core_types;
pub mod error;

// Dispersion model
pub mod physics;

// Input, driver and output
pub mod input;
pub mod report;
pub mod simulation;

// Re-export core types
pub use core_types::{
    Job, Link, LinkFrame, LinkSpec, LinkType, Meteo, Receptor, SiteConditions, SiteFactors,
    StabilityClass,
};
pub use error::{Caline3Error, Caline3Result};

// Re-export model and driver
pub use input::JobReader;
pub use physics::{concentration, Plume};
pub use report::{render, summarize, MeteoResult, ReceptorResult, ReportConfig};
pub use simulation::{compute_job, compute_meteo, ConcentrationMatrix, RunConfig};
