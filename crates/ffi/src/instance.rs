use caline3_core::{Job, JobReader};
use std::os::raw::c_char;
use std::ptr;

use crate::error::{Caline3ErrorCode, DefaultCaline3Error};
use crate::helpers::{str_from_ptr, track_error, track_result};

/// A parsed CALINE3 job: site, receptors, links and meteorological scenarios.
///
/// # Thread Safety
/// The job is immutable once parsed. Any number of threads may query or
/// compute concentrations from the same handle concurrently; computations
/// run on the internal rayon thread pool.
///
/// # Usage
/// ```c
/// Caline3Job* job = NULL;
/// if (caline3_job_parse(input_text, &job) != Ok) {
///     fprintf(stderr, "%s\n", caline3_get_last_error());
///     return;
/// }
///
/// size_t receptors = 0, links = 0, meteos = 0;
/// caline3_job_counts(job, &receptors, &links, &meteos);
///
/// double* values = malloc(links * receptors * sizeof(double));
/// for (size_t m = 0; m < meteos; ++m) {
///     caline3_compute_meteo(job, m, values, links * receptors);
///     // values[l * receptors + r] is link l's contribution at receptor r [ug/m3]
/// }
///
/// free(values);
/// caline3_job_destroy(job);
/// ```
pub struct Caline3Job {
    pub(crate) job: Job,
}

impl Caline3Job {
    /// Parses the first job of a CALINE3 input deck.
    ///
    /// # Errors
    ///
    /// Returns `Caline3ErrorCode::Parse` for malformed or empty input.
    /// Returns `Caline3ErrorCode::InvalidInput` for out-of-range site, link or meteorology values.
    pub(crate) fn parse(input: &str) -> Result<Box<Self>, DefaultCaline3Error> {
        let job = JobReader::new(input.as_bytes())
            .read()?
            .ok_or_else(DefaultCaline3Error::empty_input)?;

        Ok(Box::new(Self { job }))
    }
}

/// Parse a CALINE3 input deck and return the job via out-parameter.
///
/// This function follows standard C error handling conventions:
/// - Returns `Caline3ErrorCode::Ok` (0) on success with a valid job in `out_job`
/// - Returns non-zero error code on failure with `out_job` set to null
///
/// Parameters
/// - `input`: Null-terminated UTF-8 text in the CALINE3 fixed-column format.
///   Only the first job of the deck is read. The text is copied; the caller
///   keeps ownership.
/// - `out_job`: Pointer to receive the created job. Must be non-null.
///
/// Returns
/// - `Caline3ErrorCode::Ok` (0) - success, `out_job` contains valid pointer
/// - `Caline3ErrorCode::NullPointer` - `input` or `out_job` is null
/// - `Caline3ErrorCode::InvalidUtf8` - `input` is not valid UTF-8
/// - `Caline3ErrorCode::Parse` - malformed, truncated or empty deck
/// - `Caline3ErrorCode::InvalidInput` - physical values out of range
///
/// Error Details
/// - Call `caline3_get_last_error()` to retrieve human-readable error description
///
/// # Safety
///
/// - `input` must be null or a valid null-terminated string.
/// - `out_job` must be a valid, non-null pointer to writable memory.
/// - The caller takes ownership of the returned job and MUST call `caline3_job_destroy`
///   exactly once to avoid memory leaks.
#[no_mangle]
pub unsafe extern "C" fn caline3_job_parse(
    input: *const c_char,
    out_job: *mut *mut Caline3Job,
) -> Caline3ErrorCode {
    if out_job.is_null() {
        return track_error(&DefaultCaline3Error::null_pointer("out_job"));
    }

    // SAFETY: `input` is null or null-terminated per the documented contract.
    let parsed = unsafe { str_from_ptr(input, "input") }.and_then(Caline3Job::parse);

    match track_result(parsed) {
        Ok(job) => {
            // SAFETY: `out_job` was checked for null above.
            unsafe {
                *out_job = Box::into_raw(job);
            }
            Caline3ErrorCode::Ok
        }
        Err(code) => {
            // SAFETY: `out_job` was checked for null above.
            unsafe {
                // Set to null on error (per documentation contract)
                *out_job = ptr::null_mut();
            }
            code
        }
    }
}

/// Destroys a job previously created by `caline3_job_parse`.
///
/// Behavior:
/// - If `ptr` is null, this function is a no-op.
/// - Otherwise the job and everything it owns is freed.
///
/// # Safety
/// - The pointer MUST have been created by `caline3_job_parse`.
/// - The pointer MUST NOT have been freed already.
/// - After calling this function, the caller must not use the pointer again.
#[no_mangle]
pub unsafe extern "C" fn caline3_job_destroy(ptr: *mut Caline3Job) {
    if ptr.is_null() {
        return;
    }

    // SAFETY: The pointer was created by `Box::into_raw` in `caline3_job_parse`
    // and has not been freed. `Box::from_raw` reclaims ownership and drops it.
    unsafe {
        drop(Box::from_raw(ptr));
    }
}
