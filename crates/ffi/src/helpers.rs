use crate::error::{with_last_error_mut, Caline3ErrorCode, Caline3FfiError, DefaultCaline3Error};
use crate::instance::Caline3Job;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// Set the thread-local error message and code.
pub(crate) fn set_last_error(error: &impl Caline3FfiError) {
    with_last_error_mut(|(cstring, code)| {
        *cstring = CString::new(error.msg()).ok();
        *code = error.code();
    });
}

/// Track an error by setting it in thread-local storage and returning its code.
#[inline]
pub(crate) fn track_error(error: &impl Caline3FfiError) -> Caline3ErrorCode {
    set_last_error(error);
    error.code()
}

/// Record the outcome of a fallible operation: clears the error state on
/// success, stores the error and returns its code on failure.
pub(crate) fn track_result<T, E: Caline3FfiError>(result: Result<T, E>) -> Result<T, Caline3ErrorCode> {
    match result {
        Ok(value) => {
            clear_last_error();
            Ok(value)
        }
        Err(error) => Err(track_error(&error)),
    }
}

/// Clear the thread-local error message and code.
pub(crate) fn clear_last_error() {
    with_last_error_mut(|(cstring, code)| {
        *cstring = None;
        *code = Caline3ErrorCode::Ok;
    });
}

/// Borrow a job handle, rejecting null.
///
/// # Safety
/// `ptr` must be null or a live pointer returned by `caline3_job_parse`.
pub(crate) unsafe fn job_from_ptr<'a>(
    ptr: *const Caline3Job,
) -> Result<&'a Caline3Job, DefaultCaline3Error> {
    // SAFETY: the caller guarantees `ptr` is null or valid; `as_ref` handles null.
    unsafe { ptr.as_ref() }.ok_or_else(|| DefaultCaline3Error::null_pointer("job"))
}

/// Borrow a null-terminated UTF-8 string.
///
/// # Safety
/// `ptr` must be null or point to a null-terminated string valid for the
/// duration of the call.
pub(crate) unsafe fn str_from_ptr<'a>(
    ptr: *const c_char,
    param_name: &str,
) -> Result<&'a str, DefaultCaline3Error> {
    if ptr.is_null() {
        return Err(DefaultCaline3Error::null_pointer(param_name));
    }
    // SAFETY: non-null and null-terminated per the caller's contract.
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| DefaultCaline3Error::invalid_utf8(param_name))
}

/// Borrow a caller-provided output buffer of `len` values.
///
/// # Safety
/// `ptr` must be null or valid for writes of `len` `f64` values.
pub(crate) unsafe fn buffer_from_ptr<'a>(
    ptr: *mut f64,
    len: usize,
    param_name: &str,
) -> Result<&'a mut [f64], DefaultCaline3Error> {
    if ptr.is_null() {
        return Err(DefaultCaline3Error::null_pointer(param_name));
    }
    // SAFETY: non-null and valid for `len` writes per the caller's contract.
    Ok(unsafe { std::slice::from_raw_parts_mut(ptr, len) })
}
