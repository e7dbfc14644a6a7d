//! [`FileStream`] and its supporting types.
//!
//! # Modes
//! A stream is opened under one of six [`Mode`]s, mirroring the stdio dispositions `r`, `w`, `a`,
//! `r+`, `w+` and `a+`, either in text mode or in binary mode. In text mode each element moves as
//! one text character; in binary mode each element moves as its raw `size_of::<C>()` bytes.
//!
//! # Errors
//! Every fallible operation both returns its [`StreamError`](crate::fs::StreamError) and records
//! it on the stream. Recorded errors stay until they're cleared, so a batch of operations can be
//! checked once at the end, and [`close`](FileStream::close) is always safe to call afterwards.

pub mod scan;

mod element;
mod io;
mod mode;
mod options;
mod raw;
mod stream;

pub use element::*;
pub use mode::*;
pub use options::*;
pub use scan::{Conversion, ScanTarget};
pub use stream::FileStream;
