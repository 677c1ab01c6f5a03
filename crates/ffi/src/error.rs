use caline3_core::Caline3Error;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

/// Common interface for FFI error types.
///
/// # Design
/// - `code()` - Returns the error code to be passed across FFI boundary
/// - `msg()` - Returns the error message for diagnostic purposes
pub(crate) trait Caline3FfiError {
    /// Returns the error code to be returned across the FFI boundary.
    fn code(&self) -> Caline3ErrorCode;

    /// Returns the human-readable error message.
    fn msg(&self) -> &str;
}

/// Default implementation of `Caline3FfiError` for FFI error scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefaultCaline3Error {
    code: Caline3ErrorCode,
    msg: String,
}

impl DefaultCaline3Error {
    /// Create error for null pointer passed where non-null required.
    ///
    /// # Arguments
    /// * `param_name` - The name of the parameter that was null (e.g., `"out_job"`, `"input"`)
    pub fn null_pointer(param_name: &str) -> Self {
        Self {
            code: Caline3ErrorCode::NullPointer,
            msg: format!("Parameter '{param_name}' cannot be null"),
        }
    }

    /// Create error for input text that is not valid UTF-8.
    pub fn invalid_utf8(param_name: &str) -> Self {
        Self {
            code: Caline3ErrorCode::InvalidUtf8,
            msg: format!("Parameter '{param_name}' is not valid UTF-8"),
        }
    }

    /// Create error for input text holding no job.
    pub fn empty_input() -> Self {
        Self {
            code: Caline3ErrorCode::Parse,
            msg: "Input holds no job".to_string(),
        }
    }

    /// Create error for an index past the end of a collection.
    ///
    /// # Arguments
    /// * `what` - Collection being indexed (e.g., `"meteorology"`)
    /// * `index` - The requested index
    /// * `len` - Number of items available
    pub fn index_out_of_range(what: &str, index: usize, len: usize) -> Self {
        Self {
            code: Caline3ErrorCode::IndexOutOfRange,
            msg: format!("{what} index {index} out of range (count {len})"),
        }
    }

    /// Create error for an output buffer that cannot hold the result.
    ///
    /// # Arguments
    /// * `required` - Number of values the call writes
    /// * `provided` - Capacity passed by the caller
    pub fn buffer_too_small(required: usize, provided: usize) -> Self {
        Self {
            code: Caline3ErrorCode::BufferTooSmall,
            msg: format!("Output buffer holds {provided} values, {required} required"),
        }
    }

    /// Create error for invalid parameter.
    ///
    /// # Arguments
    /// * `message` - Description of the error
    pub fn invalid_parameter(message: String) -> Self {
        Self {
            code: Caline3ErrorCode::InvalidParameter,
            msg: message,
        }
    }
}

impl From<Caline3Error> for DefaultCaline3Error {
    fn from(error: Caline3Error) -> Self {
        let code = match error {
            Caline3Error::Parse { .. } | Caline3Error::Io(_) => Caline3ErrorCode::Parse,
            Caline3Error::InvalidMeteo { .. }
            | Caline3Error::InvalidLink { .. }
            | Caline3Error::InvalidSite(_) => Caline3ErrorCode::InvalidInput,
            Caline3Error::DegenerateCalibration { .. } => Caline3ErrorCode::DegenerateCalibration,
        };
        Self {
            code,
            msg: error.to_string(),
        }
    }
}

impl Caline3FfiError for DefaultCaline3Error {
    fn code(&self) -> Caline3ErrorCode {
        self.code
    }

    fn msg(&self) -> &str {
        &self.msg
    }
}

/// FFI error codes returned by CALINE3 functions.
/// Follows standard C convention: 0 = success, non-zero = error.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caline3ErrorCode {
    /// Operation completed successfully.
    Ok = 0,

    /// Invalid pointer: null pointer passed where non-null required.
    NullPointer = 1,

    /// Input text is not valid UTF-8.
    InvalidUtf8 = 2,

    /// Malformed or truncated input deck.
    Parse = 3,

    /// Input values out of their physical range (wind speed, widths, site parameters).
    InvalidInput = 4,

    /// Dispersion curves cannot be fitted for a link.
    DegenerateCalibration = 5,

    /// Index past the end of the job's receptors, links or scenarios.
    IndexOutOfRange = 6,

    /// Caller-provided output buffer is too small.
    BufferTooSmall = 7,

    /// Invalid parameter passed to function.
    InvalidParameter = 8,
}

thread_local! {
    /// Thread-local storage for the most recent FFI error (C string, error code).
    /// The CString is stored to keep the pointer returned by `caline3_get_last_error` valid.
    static LAST_ERROR: RefCell<(Option<CString>, Caline3ErrorCode)> = const { RefCell::new((None, Caline3ErrorCode::Ok)) };
}

/// Internal helper to read `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error<F, R>(f: F) -> R
where
    F: FnOnce(&(Option<CString>, Caline3ErrorCode)) -> R,
{
    LAST_ERROR.with_borrow(f)
}

/// Internal helper to mutate `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut (Option<CString>, Caline3ErrorCode)) -> R,
{
    LAST_ERROR.with_borrow_mut(f)
}

/// Retrieve the most recent FFI error message as a null-terminated C string.
///
/// Returns:
/// - A borrowed pointer to the error message if an error occurred.
/// - `null` if the last call succeeded or the message cannot be converted to a C string.
///
/// # Thread Safety
/// Error messages are stored per-thread, so each thread has its own independent error state.
///
/// # Lifetime
/// The returned pointer is valid until the next FFI call on this thread.
///
/// **DO NOT FREE THIS POINTER** - it is managed internally.
///
/// Example:
/// ```c
/// Caline3Job* job = NULL;
/// if (caline3_job_parse(text, &job) != Ok) {
///     const char* error = caline3_get_last_error();
///     if (error) {
///         fprintf(stderr, "Cannot read job: %s\n", error);
///     }
/// }
/// ```
#[no_mangle]
pub extern "C" fn caline3_get_last_error() -> *const c_char {
    with_last_error(|(cstring, _code)| cstring.as_ref().map_or(ptr::null(), |cs| cs.as_ptr()))
}

/// Retrieve the most recent FFI error code.
///
/// Returns `Caline3ErrorCode::Ok` (0) if the last call on this thread succeeded.
#[no_mangle]
pub extern "C" fn caline3_get_last_error_code() -> Caline3ErrorCode {
    with_last_error(|(_cstring, code)| *code)
}
