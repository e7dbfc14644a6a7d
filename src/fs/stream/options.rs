use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;
use std::path::Path;

use super::{Element, FileStream, Mode};
use crate::fs::{DEFAULT_ERROR_CODE, ErrorCode, StreamError};
use crate::util;
use crate::util::fmt::DebugRaw;

/// A builder struct to help with opening streams, using customizable options and logical defaults.
/// Available via [`FileStream::options`] to avoid additional use statements.
///
/// By default, streams are opened read only, in text mode, with [`DEFAULT_ERROR_CODE`] as the
/// code recorded for precondition failures.
#[derive(Clone)]
pub struct OpenOptions<C: Element = u8> {
    pub(crate) _element: PhantomData<fn() -> C>,
    pub(crate) mode: Mode,
    pub(crate) binary: bool,
    pub(crate) default_error: ErrorCode,
}

impl<C: Element> OpenOptions<C> {
    pub fn new() -> OpenOptions<C> {
        OpenOptions::<C>::default()
    }

    pub const fn mode(&mut self, value: Mode) -> &mut Self {
        self.mode = value;
        self
    }

    pub const fn binary(&mut self, value: bool) -> &mut Self {
        self.binary = value;
        self
    }

    pub const fn default_error(&mut self, value: ErrorCode) -> &mut Self {
        self.default_error = value;
        self
    }

    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<FileStream<C>, StreamError> {
        let mut stream = FileStream::<C>::with_default_error(self.default_error);
        stream.open(path, self.mode, self.binary)?;
        Ok(stream)
    }
}

impl<C: Element> Default for OpenOptions<C> {
    fn default() -> Self {
        Self {
            _element: PhantomData,
            mode: Mode::Read,
            binary: false,
            default_error: DEFAULT_ERROR_CODE,
        }
    }
}

impl<C: Element> Debug for OpenOptions<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenOptions")
            .field("<element>", &util::fmt::raw_type_name::<C>())
            .field("mode", &self.mode)
            .field("binary", &self.binary)
            .field("default_error", &DebugRaw(self.default_error.to_string()))
            .finish()
    }
}
