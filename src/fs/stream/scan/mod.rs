//! A formatted scan engine, the reading half of [`FileStream::get_by_format`].
//!
//! Formats use the familiar `scanf` directives: whitespace matches any run of input whitespace,
//! ordinary bytes must match verbatim, and `%[*][width][length]conv` converts one field, with
//! `conv` one of `d i u o x X f F e E g G a A s c` (or `%%` for a literal percent sign). Unlike
//! `scanf`, converted fields are stored into typed [`ScanTarget`]s, which reject text they can't
//! represent instead of writing through untyped pointers.
//!
//! The format string is still a trust boundary: it decides how much input is consumed and how
//! many targets are written, so it must never be built from untrusted input.
//!
//! [`FileStream::get_by_format`]: crate::fs::FileStream::get_by_format

mod format;
mod scanner;
mod target;
mod tests;

pub use format::Conversion;
pub use target::*;
pub(crate) use scanner::*;

use super::raw::RawStream;
use crate::fs::StreamError;

impl ByteSource for RawStream {
    fn next_byte(&mut self) -> Result<Option<u8>, StreamError> {
        self.get_byte()
    }

    fn push_back(&mut self, byte: u8) -> Result<(), StreamError> {
        self.unget_byte(byte)
    }
}
