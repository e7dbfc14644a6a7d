use std::io;

use super::ErrorCode;

/// Reads the calling thread's `errno`.
pub(crate) fn err_no() -> ErrorCode {
    io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// Resets the calling thread's `errno` to zero.
pub(crate) fn clear_err_no() {
    // SAFETY: __errno_location always returns a valid pointer to the thread-local errno.
    unsafe { *libc::__errno_location() = 0 }
}

/// Runs `call` between a cleared `errno` and an immediate capture of it, so no other code can
/// disturb the value between the stdio call and its inspection.
pub(crate) fn with_err_no<T>(call: impl FnOnce() -> T) -> (T, ErrorCode) {
    clear_err_no();
    let ret = call();
    let code = err_no();
    clear_err_no();
    (ret, code)
}
