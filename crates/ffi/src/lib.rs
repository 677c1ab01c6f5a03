//! C ABI for the CALINE3 dispersion engine
//!
//! A job is parsed from CALINE3 input text into an opaque handle; callers
//! then query its sizes and compute one meteorological scenario at a time into
//! buffers they own. Every function returns a [`Caline3ErrorCode`]; the
//! message of the last failure on the calling thread is available from
//! [`caline3_get_last_error`].
//!
//! The C header `Caline3FFI.h` is generated by the build script.

mod error;
mod helpers;
mod instance;
mod queries;

pub use error::{caline3_get_last_error, caline3_get_last_error_code, Caline3ErrorCode};
pub use instance::{caline3_job_destroy, caline3_job_parse, Caline3Job};
pub use queries::{caline3_compute_meteo, caline3_job_counts, caline3_receptor_totals_ppm};
