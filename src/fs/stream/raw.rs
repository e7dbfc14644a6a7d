use std::ffi::CStr;
use std::fmt::{self, Debug, Formatter};
use std::mem::{self, MaybeUninit};
use std::ptr::NonNull;

use libc::{EIO, FILE, c_int};
use tracing::warn;

use super::Element;
use crate::fs::panic::{BadStreamPanic, Panic};
use crate::fs::{self, ErrorCode, OsError, StreamError};

/// Exclusive owner of a live stdio `FILE*`. Dropping it closes the stream.
pub(crate) struct RawStream(NonNull<FILE>);

impl RawStream {
    pub fn open(path: &CStr, mode: &CStr) -> Result<RawStream, StreamError> {
        // SAFETY: Both arguments are valid nul-terminated strings for the duration of the call.
        let (file, code) = fs::with_err_no(|| unsafe { libc::fopen(path.as_ptr(), mode.as_ptr()) });
        match NonNull::new(file) {
            Some(file) => Ok(RawStream(file)),
            None => Err(os_error(code)),
        }
    }

    /// Reassociates the stream with `path` under a new mode. The old association is closed
    /// whatever the outcome, so this consumes self.
    pub fn reopen(self, path: &CStr, mode: &CStr) -> Result<RawStream, StreamError> {
        let old = self.into_raw();
        // SAFETY: old is a live stream that freopen takes over; it is never used again.
        let (file, code) = fs::with_err_no(|| unsafe {
            libc::freopen(path.as_ptr(), mode.as_ptr(), old.as_ptr())
        });
        match NonNull::new(file) {
            Some(file) => Ok(RawStream(file)),
            None => Err(os_error(code)),
        }
    }

    /// Reads one byte. `Ok(None)` signals end of file.
    pub fn get_byte(&mut self) -> Result<Option<u8>, StreamError> {
        // SAFETY: self.0 is a live stream.
        let (ret, code) = fs::with_err_no(|| unsafe { libc::fgetc(self.as_ptr()) });
        if ret != libc::EOF {
            return Ok(Some(ret as u8));
        }
        if self.has_error() {
            self.clear_error();
            return Err(os_error(code));
        }
        Ok(None)
    }

    /// Pushes one byte back so the next read returns it.
    pub fn unget_byte(&mut self, byte: u8) -> Result<(), StreamError> {
        // SAFETY: self.0 is a live stream.
        let (ret, code) = fs::with_err_no(|| unsafe { libc::ungetc(byte as c_int, self.as_ptr()) });
        match ret {
            libc::EOF => Err(os_error(code)),
            _ => Ok(()),
        }
    }

    pub fn put_byte(&mut self, byte: u8) -> Result<(), StreamError> {
        // SAFETY: self.0 is a live stream.
        let (ret, code) = fs::with_err_no(|| unsafe { libc::fputc(byte as c_int, self.as_ptr()) });
        if ret == libc::EOF || self.has_error() {
            self.clear_error();
            return Err(os_error(code));
        }
        Ok(())
    }

    /// Reads as many whole elements as fit into `buf`, returning how many were initialized.
    pub fn read_into<T: Element>(&mut self, buf: &mut [MaybeUninit<T>]) -> Result<usize, StreamError> {
        // SAFETY: buf is valid for buf.len() elements of T, and fread writes at most that many.
        let (count, code) = fs::with_err_no(|| unsafe {
            libc::fread(buf.as_mut_ptr().cast(), size_of::<T>(), buf.len(), self.as_ptr())
        });
        if self.has_error() {
            self.clear_error();
            return Err(os_error(code));
        }
        Ok(count)
    }

    /// Reads up to `buf.len()` bytes, returning how many were read.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        // SAFETY: buf is valid for buf.len() bytes.
        let (count, code) = fs::with_err_no(|| unsafe {
            libc::fread(buf.as_mut_ptr().cast(), 1, buf.len(), self.as_ptr())
        });
        if self.has_error() {
            self.clear_error();
            return Err(os_error(code));
        }
        Ok(count)
    }

    pub fn write_from<T: Element>(&mut self, buf: &[T]) -> Result<usize, StreamError> {
        // SAFETY: buf is valid for buf.len() elements of T and Element types have no padding.
        let (count, code) = fs::with_err_no(|| unsafe {
            libc::fwrite(buf.as_ptr().cast(), size_of::<T>(), buf.len(), self.as_ptr())
        });
        if self.has_error() {
            self.clear_error();
            return Err(os_error(code));
        }
        Ok(count)
    }

    pub fn seek(&mut self, offset: i64, whence: c_int) -> Result<(), StreamError> {
        if matches!(whence, libc::SEEK_DATA | libc::SEEK_HOLE) {
            return self.seek_sparse(offset, whence);
        }
        // SAFETY: self.0 is a live stream.
        let (ret, code) = fs::with_err_no(|| unsafe {
            libc::fseeko(self.as_ptr(), offset as libc::off_t, whence)
        });
        if ret != 0 {
            self.clear_error();
            return Err(os_error(code));
        }
        Ok(())
    }

    /// stdio doesn't know `SEEK_DATA` or `SEEK_HOLE`, so the descriptor is asked directly and the
    /// stream is then moved to the absolute offset it found.
    fn seek_sparse(&mut self, offset: i64, whence: c_int) -> Result<(), StreamError> {
        self.flush()?;
        let fd = self.fd();
        // SAFETY: fd belongs to the live stream, whose pending output was just flushed.
        let (found, code) = fs::with_err_no(|| unsafe {
            libc::lseek(fd, offset as libc::off_t, whence)
        });
        if found == -1 {
            return Err(os_error(code));
        }
        self.seek(found as i64, libc::SEEK_SET)
    }

    pub fn tell(&mut self) -> Result<u64, StreamError> {
        // SAFETY: self.0 is a live stream.
        let (ret, code) = fs::with_err_no(|| unsafe { libc::ftello(self.as_ptr()) });
        if ret < 0 {
            return Err(os_error(code));
        }
        Ok(ret as u64)
    }

    /// Rewinds to the start, clearing the stdio end-of-file and error indicators.
    pub fn rewind(&mut self) -> Result<(), StreamError> {
        // SAFETY: self.0 is a live stream.
        let ((), code) = fs::with_err_no(|| unsafe { libc::rewind(self.as_ptr()) });
        if code != 0 {
            return Err(os_error(code));
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), StreamError> {
        // SAFETY: self.0 is a live stream.
        let (ret, code) = fs::with_err_no(|| unsafe { libc::fflush(self.as_ptr()) });
        if ret != 0 {
            self.clear_error();
            return Err(os_error(code));
        }
        Ok(())
    }

    /// Size in bytes of the underlying file as the kernel currently sees it, or `None` for files
    /// without a meaningful size (pipes, terminals).
    pub fn file_size(&self) -> Result<Option<u64>, StreamError> {
        let fd = self.fd();
        let mut raw_meta: MaybeUninit<libc::stat> = MaybeUninit::uninit();
        // SAFETY: fd belongs to the live stream and raw_meta is valid for writes.
        let (ret, code) = fs::with_err_no(|| unsafe { libc::fstat(fd, raw_meta.as_mut_ptr()) });
        if ret == -1 {
            return Err(os_error(code));
        }
        // SAFETY: fstat succeeded, so raw_meta is initialized.
        let raw = unsafe { raw_meta.assume_init() };
        Ok((raw.st_mode & libc::S_IFMT == libc::S_IFREG).then_some(raw.st_size as u64))
    }

    pub fn is_eof(&self) -> bool {
        // SAFETY: self.0 is a live stream.
        unsafe { libc::feof(self.as_ptr()) != 0 }
    }

    pub fn has_error(&self) -> bool {
        // SAFETY: self.0 is a live stream.
        unsafe { libc::ferror(self.as_ptr()) != 0 }
    }

    /// Clears the stdio end-of-file and error indicators.
    pub fn clear_error(&mut self) {
        // SAFETY: self.0 is a live stream.
        unsafe { libc::clearerr(self.as_ptr()) }
    }

    pub fn close(self) -> Result<(), StreamError> {
        let file = self.into_raw();
        // SAFETY: fclose invalidates the stream regardless of the outcome, and we gave up
        // ownership of it above.
        let (ret, code) = fs::with_err_no(|| unsafe { libc::fclose(file.as_ptr()) });
        match ret {
            0 => Ok(()),
            _ => Err(os_error(code)),
        }
    }

    /// Gives up ownership of the `FILE*` without closing it.
    pub fn into_raw(self) -> NonNull<FILE> {
        let file = self.0;
        mem::forget(self);
        file
    }

    fn fd(&self) -> c_int {
        // SAFETY: self.0 is a live stream.
        let fd = unsafe { libc::fileno(self.as_ptr()) };
        if fd == -1 {
            BadStreamPanic.panic();
        }
        fd
    }

    const fn as_ptr(&self) -> *mut FILE {
        self.0.as_ptr()
    }
}

impl Drop for RawStream {
    fn drop(&mut self) {
        // SAFETY: After this, the stream is invalidated but we are dropping self so it doesn't
        // matter.
        let (ret, code) = fs::with_err_no(|| unsafe { libc::fclose(self.as_ptr()) });
        if ret != 0 {
            warn!(error = %os_error(code), "error while closing dropped stream");
        }
    }
}

impl Debug for RawStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "RawStream({:p})", self.0)
    }
}

/// Builds an OS error, falling back to `EIO` when stdio flagged a failure without setting errno.
fn os_error(code: ErrorCode) -> StreamError {
    OsError(if code == 0 { EIO } else { code }).into()
}
