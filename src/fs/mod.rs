//! Typed file streams over the C stdio layer.
//!
//! The central type is [`FileStream`], an exclusively owned `FILE*` that tracks its open mode,
//! whether it was opened in binary mode, a sticky end-of-file flag and a sticky last error. Each
//! operation returns a [`Result`] and also records its failure on the stream, so callers can
//! either propagate with `?` or poll [`FileStream::error_code`] after a batch of calls.
#![cfg(target_os = "linux")]

pub mod stream;

mod error;
mod panic;
mod syscall;

pub use error::*;
pub use stream::*;
pub(crate) use syscall::*;
