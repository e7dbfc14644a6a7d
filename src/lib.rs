//! This crate provides typed file streams: owned stdio `FILE*` handles that remember how they were
//! opened and keep track of their own errors.
//!
//! # Purpose
//! Plain stdio makes it easy to lose track of failures. The `errno` value is shared by everything
//! running on a thread, the stream error indicator can be cleared by accident along with the
//! end-of-file indicator, and buffers returned by reads have to be freed by hand on every path.
//! [`FileStream`](fs::FileStream) wraps one stream and fixes those three problems in one place.
//!
//! # Method
//! Every stdio call goes through a small side channel that clears `errno`, makes the call and
//! captures `errno` immediately, so errors can't leak in from unrelated code. Every operation
//! returns a [`Result`] and also records its error on the stream, where it stays until it's
//! explicitly cleared. The end-of-file flag is kept separately from stdio's own indicator, so
//! clearing an error can never make a finished stream readable again. Reads return owned [`Vec`]s.
//!
//! # Error Handling
//! When this crate employs errors via [`Result`]s, it does so in a method that is strongly typed,
//! using enums for static dispatch rather than dynamic, with structs (often ZSTs) that implement
//! [`Error`](std::error::Error). [`StreamError::code`](fs::StreamError::code) maps any of them
//! back to an integer code for callers that prefer polling.
//!
//! # Dependencies
//! The [`fs`] module relies on `libc` for its thin stdio wrappers, and on `tracing` for structured
//! logging of stream lifecycle events and recorded errors. No subscriber is installed by the
//! library itself.
//!
//! This crate also depends on some derive macros because they're helpful and remove the need for
//! some very repetitive programming.

// #![warn(missing_docs)]
#![warn(clippy::missing_safety_doc)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![warn(clippy::missing_const_for_fn)]
#![warn(clippy::missing_panics_doc)]
#![warn(clippy::unwrap_used)]
#![allow(clippy::module_inception)]

pub mod fs;

pub(crate) mod util;
