use std::ffi::{CString, OsStr};
use std::fmt;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr::NonNull;
use std::slice;

use libc::{FILE, SEEK_CUR, SEEK_END, SEEK_SET};
use tracing::{debug, trace};

use super::raw::RawStream;
use super::scan::{self, ScanTarget};
use super::{Element, Mode, OpenOptions, Origin};
use crate::fs::{
    AlreadyOpenError, DEFAULT_ERROR_CODE, EndOfFileError, ErrorCode, InvalidPathError,
    NotOpenError, PathLengthError, ShortTransferError, StreamError, TextRangeError,
    UnsupportedError, UnterminatedError, WrongModeError,
};

/// A file stream with sticky end-of-file and error tracking, reading and writing text or binary
/// elements of type `C`.
///
/// A stream is either fully closed or fully open: the `FILE*`, the open [`Mode`], the binary flag
/// and an owned copy of the path are created together by [`open`](FileStream::open) and released
/// together by [`close`](FileStream::close) (or on drop).
///
/// Operations return a [`Result`], and any error is also recorded on the stream until it's
/// explicitly cleared with [`clear_error`](FileStream::clear_error) or
/// [`take_error`](FileStream::take_error). A later successful call never clears it.
///
/// The end-of-file flag is sticky as well: once set, only a reposition
/// ([`reset`](FileStream::reset), [`point_to`](FileStream::point_to)) or reopening clears it.
pub struct FileStream<C: Element = u8> {
    pub(super) state: Option<OpenState>,
    pub(super) end_of_file: bool,
    pub(super) last_error: Option<StreamError>,
    pub(super) default_error: ErrorCode,
    pub(super) _element: PhantomData<fn() -> C>,
}

#[derive(Debug)]
pub(super) struct OpenState {
    pub raw: RawStream,
    pub mode: Mode,
    pub binary: bool,
    pub path: CString,
    pub direction: Direction,
    /// Size of a regular file as of the last reposition or write.
    pub size: Option<u64>,
    /// Position kept current across element reads, so they don't need to ask stdio for it.
    pub position: Option<u64>,
}

/// The last kind of transfer on a stream, which stdio needs a reposition to switch away from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Direction {
    Idle,
    Reading,
    Writing,
}

impl OpenState {
    pub fn new(raw: RawStream, mode: Mode, binary: bool, path: CString) -> OpenState {
        let mut state = OpenState {
            raw,
            mode,
            binary,
            path,
            direction: Direction::Idle,
            size: None,
            position: None,
        };
        state.refresh();
        state
    }

    pub fn switch_to(&mut self, direction: Direction) -> Result<(), StreamError> {
        let flips = matches!(
            (self.direction, direction),
            (Direction::Reading, Direction::Writing) | (Direction::Writing, Direction::Reading)
        );
        if flips {
            self.raw.seek(0, SEEK_CUR)?;
            self.refresh();
        }
        self.direction = direction;
        Ok(())
    }

    /// Re-reads the file size and forgets the position. Needed after anything that moves the
    /// position or flushes pending writes.
    pub fn refresh(&mut self) {
        self.size = self.raw.file_size().ok().flatten();
        self.position = None;
    }

    /// Folds a finished write into the cached size.
    pub fn wrote(&mut self) {
        self.position = None;
        if !self.mode.is_readable() {
            return;
        }
        self.position = self.raw.tell().ok();
        if let (Some(size), Some(position)) = (self.size, self.position) {
            self.size = Some(size.max(position));
        }
    }

    fn advance(&mut self, bytes: usize) {
        if let Some(position) = self.position.as_mut() {
            *position += bytes as u64;
        }
    }

    /// Checks whether a read-capable stream has nothing left to read. This is the case once stdio
    /// has hit the end, or when the position has reached the size of a regular file.
    pub fn at_end(&mut self) -> bool {
        if !self.mode.is_readable() {
            return false;
        }
        if self.raw.is_eof() {
            return true;
        }
        let Some(size) = self.size else {
            return false;
        };
        if self.position.is_none() {
            self.position = self.raw.tell().ok();
        }
        self.position.is_some_and(|position| position >= size)
    }

    fn read_element<T: Element>(&mut self) -> Result<T, StreamError> {
        self.switch_to(Direction::Reading)?;
        if self.binary {
            let mut slot = [MaybeUninit::<T>::uninit()];
            match self.raw.read_into(&mut slot)? {
                // SAFETY: read_into reported that it initialized the only slot.
                1 => Ok(unsafe { slot[0].assume_init() }),
                _ => Err(ShortTransferError.into()),
            }
        } else {
            match self.raw.get_byte()? {
                Some(byte) => Ok(T::from_text(byte)),
                None => Err(EndOfFileError.into()),
            }
        }
    }

    /// Reads one element and folds the resulting end-of-file state into `end_of_file`, whatever
    /// the outcome of the read.
    pub fn next_element<T: Element>(&mut self, end_of_file: &mut bool) -> Result<T, StreamError> {
        let result = self.read_element::<T>();
        match result {
            Ok(_) => self.advance(if self.binary { size_of::<T>() } else { 1 }),
            Err(_) => self.position = None,
        }
        *end_of_file |= self.at_end();
        result
    }

    pub fn write_element<T: Element>(&mut self, element: T) -> Result<(), StreamError> {
        if self.binary {
            self.switch_to(Direction::Writing)?;
            match self.raw.write_from(slice::from_ref(&element))? {
                1 => Ok(()),
                _ => Err(ShortTransferError.into()),
            }
        } else {
            let byte = element.to_text().ok_or(TextRangeError)?;
            self.switch_to(Direction::Writing)?;
            self.raw.put_byte(byte)
        }
    }
}

/// Checks that the stream is open for reading, in binary mode if `binary` says so, and not at the
/// end of the file.
pub(super) fn readable(
    state: &mut Option<OpenState>,
    end_of_file: bool,
    binary: Option<bool>,
) -> Result<&mut OpenState, StreamError> {
    let state = state.as_mut().ok_or(NotOpenError)?;
    if !state.mode.is_readable() || binary.is_some_and(|binary| binary != state.binary) {
        Err(WrongModeError)?
    }
    if end_of_file {
        Err(EndOfFileError)?
    }
    Ok(state)
}

/// Checks that the stream is open for writing, in binary mode if `binary` says so.
pub(super) fn writable(
    state: &mut Option<OpenState>,
    binary: Option<bool>,
) -> Result<&mut OpenState, StreamError> {
    let state = state.as_mut().ok_or(NotOpenError)?;
    if !state.mode.is_writable() || binary.is_some_and(|binary| binary != state.binary) {
        Err(WrongModeError)?
    }
    Ok(state)
}

/// Checks that the stream is open and can be repositioned.
fn seekable(state: &mut Option<OpenState>) -> Result<&mut OpenState, StreamError> {
    let state = state.as_mut().ok_or(NotOpenError)?;
    if state.mode.is_append_only() {
        Err(WrongModeError)?
    }
    Ok(state)
}

/// Converts a path to the nul-terminated form stdio expects, bounded by `PATH_MAX`.
fn c_path(path: &Path) -> Result<CString, StreamError> {
    let bytes = path.as_os_str().as_bytes();
    if bytes.len() >= libc::PATH_MAX as usize {
        Err(PathLengthError)?
    }
    CString::new(bytes).map_err(|_| InvalidPathError.into())
}

/// Cuts `buf` at its first zero element. With a nonzero `expected_size`, that zero element must
/// lie within the first `expected_size` elements.
fn terminated<C: Element>(buf: &[C], expected_size: usize) -> Result<&[C], StreamError> {
    let end = buf.iter().position(|&element| element == C::ZERO);
    if expected_size != 0 && !end.is_some_and(|end| end < expected_size) {
        Err(UnterminatedError)?
    }
    Ok(&buf[..end.unwrap_or(buf.len())])
}

impl<C: Element> FileStream<C> {
    /// Creates an unopened stream.
    pub const fn new() -> FileStream<C> {
        FileStream::with_default_error(DEFAULT_ERROR_CODE)
    }

    /// Creates an unopened stream that reports precondition failures with `code`.
    pub const fn with_default_error(code: ErrorCode) -> FileStream<C> {
        FileStream {
            state: None,
            end_of_file: false,
            last_error: None,
            default_error: code,
            _element: PhantomData,
        }
    }

    pub fn options() -> OpenOptions<C> {
        OpenOptions::new()
    }

    pub(super) fn record<T>(&mut self, result: Result<T, StreamError>) -> Result<T, StreamError> {
        if let Err(error) = &result {
            debug!(%error, code = error.code(self.default_error), "stream operation failed");
            self.last_error = Some(*error);
        }
        result
    }

    // Lifecycle

    /// Opens `path` with the given mode. Fails without side effects if the stream is already open.
    pub fn open<P: AsRef<Path>>(&mut self, path: P, mode: Mode, binary: bool) -> Result<(), StreamError> {
        let result = self.open_inner(path.as_ref(), mode, binary);
        self.record(result)
    }

    fn open_inner(&mut self, path: &Path, mode: Mode, binary: bool) -> Result<(), StreamError> {
        if self.state.is_some() {
            Err(AlreadyOpenError)?
        }
        self.open_c_path(c_path(path)?, mode, binary)
    }

    fn open_c_path(&mut self, path: CString, mode: Mode, binary: bool) -> Result<(), StreamError> {
        let raw = RawStream::open(&path, mode.stdio_mode(binary))?;
        let mut state = OpenState::new(raw, mode, binary, path);
        self.end_of_file = state.at_end();
        debug!(path = ?state.path, %mode, binary, end_of_file = self.end_of_file, "opened stream");
        self.state = Some(state);
        Ok(())
    }

    /// Closes the stream. Safe to call in any state, including after errors and repeatedly.
    ///
    /// A failure to flush while closing is recorded, but the stream is closed regardless.
    pub fn close(&mut self) {
        self.end_of_file = false;
        if let Some(state) = self.state.take() {
            debug!(path = ?state.path, "closing stream");
            if let Err(error) = state.raw.close() {
                let _ = self.record::<()>(Err(error));
            }
        }
    }

    /// Reopens the current path with a new mode. If the OS refuses, the old association is gone
    /// as well and the stream is left closed.
    pub fn reopen(&mut self, mode: Mode, binary: bool) -> Result<(), StreamError> {
        let result = self.reopen_inner(mode, binary);
        self.record(result)
    }

    fn reopen_inner(&mut self, mode: Mode, binary: bool) -> Result<(), StreamError> {
        let OpenState { raw, path, .. } = self.state.take().ok_or(NotOpenError)?;
        self.end_of_file = false;
        let raw = raw.reopen(&path, mode.stdio_mode(binary)).inspect_err(|_| {
            debug!(?path, "reopen failed, stream closed");
        })?;
        let mut state = OpenState::new(raw, mode, binary, path);
        self.end_of_file = state.at_end();
        debug!(path = ?state.path, %mode, binary, "reopened stream");
        self.state = Some(state);
        Ok(())
    }

    /// Hands the live `FILE*` to the caller and leaves this stream unopened, without closing it.
    /// The caller becomes responsible for eventually passing it to `fclose`.
    pub fn detach(&mut self) -> Option<NonNull<FILE>> {
        self.end_of_file = false;
        let state = self.state.take()?;
        debug!(path = ?state.path, "detached stream");
        Some(state.raw.into_raw())
    }

    /// Moves this stream, open or not, into a stream over another element type.
    pub fn cast<T: Element>(self) -> FileStream<T> {
        let FileStream { state, end_of_file, last_error, default_error, .. } = self;
        FileStream { state, end_of_file, last_error, default_error, _element: PhantomData }
    }

    /// Closes this stream, then opens it on the path, mode and binary flag of `other`, if `other`
    /// is open. The new stream is independent of `other`.
    ///
    /// Note that this reopens the file: with [`Mode::Write`] or [`Mode::ReadWriteCreate`] the file
    /// is truncated, as with any other open in those modes.
    pub fn assign_from<D: Element>(&mut self, other: &FileStream<D>) -> Result<(), StreamError> {
        self.close();
        let result = match &other.state {
            Some(state) => self.open_c_path(state.path.clone(), state.mode, state.binary),
            None => Ok(()),
        };
        self.record(result)
    }

    /// Opens an independent stream on the same path, mode and binary flag.
    /// See [`assign_from`](FileStream::assign_from).
    pub fn duplicate(&self) -> Result<FileStream<C>, StreamError> {
        let mut copy = FileStream::with_default_error(self.default_error);
        copy.assign_from(self)?;
        Ok(copy)
    }

    // State

    pub const fn is_open(&self) -> bool {
        self.state.is_some()
    }

    /// The open mode, or `None` while unopened.
    pub fn mode(&self) -> Option<Mode> {
        self.state.as_ref().map(|state| state.mode)
    }

    pub fn is_binary(&self) -> bool {
        self.state.as_ref().is_some_and(|state| state.binary)
    }

    pub fn path(&self) -> Option<&Path> {
        self.state.as_ref().map(|state| Path::new(OsStr::from_bytes(state.path.as_bytes())))
    }

    pub const fn is_end_of_file(&self) -> bool {
        self.end_of_file
    }

    pub const fn default_error(&self) -> ErrorCode {
        self.default_error
    }

    /// The current position in bytes from the start of the file.
    pub fn position(&mut self) -> Result<u64, StreamError> {
        let result = match self.state.as_mut() {
            Some(state) => state.raw.tell(),
            None => Err(NotOpenError.into()),
        };
        self.record(result)
    }

    // Errors

    pub const fn last_error(&self) -> Option<&StreamError> {
        self.last_error.as_ref()
    }

    /// The recorded error as an integer: zero when clear, the OS code for OS failures and the
    /// default error code for everything else.
    pub fn error_code(&self) -> ErrorCode {
        self.last_error.map_or(0, |error| error.code(self.default_error))
    }

    /// Forgets the recorded error and resets the stdio error indicator. The end-of-file flag is
    /// left alone.
    pub fn clear_error(&mut self) {
        self.last_error = None;
        if let Some(state) = self.state.as_mut() {
            state.raw.clear_error();
        }
    }

    /// Returns the recorded error and clears it.
    pub fn take_error(&mut self) -> Option<StreamError> {
        let error = self.last_error;
        self.clear_error();
        error
    }

    /// Returns the recorded error as an integer and clears it.
    pub fn take_error_code(&mut self) -> ErrorCode {
        let code = self.error_code();
        self.clear_error();
        code
    }

    /// Passes the recorded error, if any, to `handler`, closing the stream if it returns true.
    pub fn handle_error<F: FnOnce(&StreamError) -> bool>(&mut self, handler: F) {
        if let Some(error) = self.last_error {
            if handler(&error) {
                self.close();
            }
        }
    }

    // Element reads

    /// Reads one element: `size_of::<C>()` raw bytes in binary mode, one text character otherwise.
    pub fn get_character(&mut self) -> Result<C, StreamError> {
        let result = self.get_character_inner();
        self.record(result)
    }

    fn get_character_inner(&mut self) -> Result<C, StreamError> {
        let state = readable(&mut self.state, self.end_of_file, None)?;
        state.next_element(&mut self.end_of_file)
    }

    /// Reads up to `count` elements, stopping early at the end of the file.
    pub fn get_string(&mut self, count: usize) -> Result<Vec<C>, StreamError> {
        let result = self.get_string_inner(count);
        self.record(result)
    }

    fn get_string_inner(&mut self, count: usize) -> Result<Vec<C>, StreamError> {
        let state = readable(&mut self.state, self.end_of_file, None)?;
        let mut buf = Vec::new();
        while buf.len() < count && !self.end_of_file {
            buf.push(state.next_element(&mut self.end_of_file)?);
        }
        Ok(buf)
    }

    /// Reads elements up to the next newline, which is consumed but not returned. The last line
    /// of a file doesn't need a trailing newline.
    pub fn get_line(&mut self) -> Result<Vec<C>, StreamError> {
        let result = self.get_line_inner();
        self.record(result)
    }

    fn get_line_inner(&mut self) -> Result<Vec<C>, StreamError> {
        let state = readable(&mut self.state, self.end_of_file, None)?;
        let newline = C::newline();
        let mut line = Vec::new();
        while !self.end_of_file {
            match state.next_element(&mut self.end_of_file)? {
                element if element == newline => break,
                element => line.push(element),
            }
        }
        Ok(line)
    }

    /// Reads everything from the current position to the end of the file. Already being at the
    /// end yields an empty buffer rather than an error.
    pub fn get_file(&mut self) -> Result<Vec<C>, StreamError> {
        let result = self.get_file_inner();
        self.record(result)
    }

    fn get_file_inner(&mut self) -> Result<Vec<C>, StreamError> {
        let end_of_file = self.end_of_file;
        let state = readable(&mut self.state, false, None)?;
        let mut buf = Vec::new();
        if end_of_file {
            return Ok(buf);
        }
        while !self.end_of_file {
            buf.push(state.next_element(&mut self.end_of_file)?);
        }
        Ok(buf)
    }

    // Element writes

    /// Writes one element: `size_of::<C>()` raw bytes in binary mode, one text character
    /// otherwise.
    pub fn write_character(&mut self, element: C) -> Result<(), StreamError> {
        let result = self.write_elements(&[element], false);
        self.record(result)
    }

    /// Writes `buf` up to its first zero element. A nonzero `expected_size` demands that the zero
    /// element lies within the first `expected_size` elements.
    pub fn write_string(&mut self, buf: &[C], expected_size: usize) -> Result<(), StreamError> {
        let result = terminated(buf, expected_size).and_then(|body| self.write_elements(body, false));
        self.record(result)
    }

    /// Like [`write_string`](FileStream::write_string), followed by a newline once the whole body
    /// has been written.
    pub fn write_line(&mut self, buf: &[C], expected_size: usize) -> Result<(), StreamError> {
        let result = terminated(buf, expected_size).and_then(|body| self.write_elements(body, true));
        self.record(result)
    }

    fn write_elements(&mut self, body: &[C], newline: bool) -> Result<(), StreamError> {
        let state = writable(&mut self.state, None)?;
        let result = body.iter()
            .chain(newline.then(C::newline).as_ref())
            .try_for_each(|&element| state.write_element(element));
        state.wrote();
        self.end_of_file |= state.at_end();
        result
    }

    // Positioning

    /// Rewinds to the start of the file, clearing the end-of-file flag and the stdio error
    /// indicator.
    pub fn reset(&mut self) -> Result<(), StreamError> {
        let result = self.reset_inner();
        self.record(result)
    }

    fn reset_inner(&mut self) -> Result<(), StreamError> {
        let state = seekable(&mut self.state)?;
        state.raw.rewind()?;
        state.direction = Direction::Idle;
        state.refresh();
        self.end_of_file = false;
        trace!(path = ?state.path, "rewound stream");
        Ok(())
    }

    /// Moves to `offset` relative to `origin`, then recomputes the end-of-file flag from scratch.
    pub fn point_to(&mut self, offset: i64, origin: Origin) -> Result<(), StreamError> {
        let result = self.point_to_inner(offset, origin);
        self.record(result)
    }

    fn point_to_inner(&mut self, offset: i64, origin: Origin) -> Result<(), StreamError> {
        let state = seekable(&mut self.state)?;
        state.raw.seek(offset, origin.whence())?;
        state.direction = Direction::Idle;
        state.refresh();
        self.end_of_file = state.at_end();
        trace!(path = ?state.path, offset, %origin, end_of_file = self.end_of_file, "repositioned stream");
        Ok(())
    }

    /// The size of the file in bytes. The position is restored afterwards.
    pub fn size(&mut self) -> Result<u64, StreamError> {
        let result = self.size_inner();
        self.record(result)
    }

    fn size_inner(&mut self) -> Result<u64, StreamError> {
        let state = seekable(&mut self.state)?;
        let saved = state.raw.tell()?;
        state.raw.seek(0, SEEK_END)?;
        state.direction = Direction::Idle;
        let size = state.raw.tell();
        state.raw.seek(saved as i64, SEEK_SET)?;
        state.refresh();
        size
    }

    // Binary blocks

    /// Reads exactly `count` elements of `T`. Anything less is an error and nothing is returned.
    pub fn read_block<T: Element>(&mut self, count: usize) -> Result<Vec<T>, StreamError> {
        let result = self.read_block_inner(count);
        self.record(result)
    }

    fn read_block_inner<T: Element>(&mut self, count: usize) -> Result<Vec<T>, StreamError> {
        if count == 0 {
            Err(UnsupportedError)?
        }
        let state = readable(&mut self.state, self.end_of_file, Some(true))?;
        state.switch_to(Direction::Reading)?;

        let mut block = Vec::<T>::with_capacity(count);
        let read = state.raw.read_into(&mut block.spare_capacity_mut()[..count]);
        state.position = None;
        self.end_of_file |= state.at_end();
        if read? != count {
            Err(ShortTransferError)?
        }
        // SAFETY: read_into initialized all `count` elements.
        unsafe { block.set_len(count) };
        Ok(block)
    }

    pub fn read_variable<T: Element>(&mut self) -> Result<T, StreamError> {
        self.read_block::<T>(1).map(|block| block[0])
    }

    /// Writes all of `block`. Writing fewer elements is an error.
    pub fn write_block<T: Element>(&mut self, block: &[T]) -> Result<(), StreamError> {
        let result = self.write_block_inner(block);
        self.record(result)
    }

    fn write_block_inner<T: Element>(&mut self, block: &[T]) -> Result<(), StreamError> {
        if block.is_empty() {
            Err(UnsupportedError)?
        }
        let state = writable(&mut self.state, Some(true))?;
        state.switch_to(Direction::Writing)?;
        let written = state.raw.write_from(block);
        state.wrote();
        self.end_of_file |= state.at_end();
        if written? != block.len() {
            Err(ShortTransferError)?
        }
        Ok(())
    }

    pub fn write_variable<T: Element>(&mut self, value: T) -> Result<(), StreamError> {
        self.write_block(slice::from_ref(&value))
    }

    // Formatted text

    /// Scans text according to a `scanf`-style `format`, storing converted fields into `targets`
    /// in order, and returns how many were stored. See [`scan`](super::scan) for the directives.
    ///
    /// `format` is trusted input: never build it from data an attacker can influence.
    pub fn get_by_format(
        &mut self,
        format: &str,
        targets: &mut [&mut dyn ScanTarget],
    ) -> Result<usize, StreamError> {
        let result = self.get_by_format_inner(format, targets);
        self.record(result)
    }

    fn get_by_format_inner(
        &mut self,
        format: &str,
        targets: &mut [&mut dyn ScanTarget],
    ) -> Result<usize, StreamError> {
        let state = readable(&mut self.state, self.end_of_file, Some(false))?;
        state.switch_to(Direction::Reading)?;
        let result = scan::scan(&mut state.raw, format, targets);
        state.position = None;
        self.end_of_file |= state.at_end();
        result
    }

    /// Writes formatted text, as produced by [`format_args!`], and returns the number of bytes
    /// written. The format itself is checked at compile time.
    pub fn write_by_format(&mut self, args: fmt::Arguments<'_>) -> Result<usize, StreamError> {
        let result = self.write_by_format_inner(args);
        self.record(result)
    }

    fn write_by_format_inner(&mut self, args: fmt::Arguments<'_>) -> Result<usize, StreamError> {
        let state = writable(&mut self.state, Some(false))?;
        let text = fmt::format(args);
        state.switch_to(Direction::Writing)?;
        let written = state.raw.write_from(text.as_bytes());
        state.wrote();
        self.end_of_file |= state.at_end();
        if written? != text.len() {
            Err(ShortTransferError)?
        }
        Ok(text.len())
    }
}

impl<C: Element> Default for FileStream<C> {
    fn default() -> Self {
        FileStream::new()
    }
}

/// Streams are equal when they have the same path, mode and binary flag, or are both unopened.
impl<C: Element, D: Element> PartialEq<FileStream<D>> for FileStream<C> {
    fn eq(&self, other: &FileStream<D>) -> bool {
        match (&self.state, &other.state) {
            (Some(a), Some(b)) => a.path == b.path && a.mode == b.mode && a.binary == b.binary,
            (None, None) => true,
            _ => false,
        }
    }
}

impl<C: Element> fmt::Debug for FileStream<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStream")
            .field("<element>", &crate::util::fmt::raw_type_name::<C>())
            .field("path", &self.path())
            .field("mode", &self.mode())
            .field("binary", &self.is_binary())
            .field("end_of_file", &self.end_of_file)
            .field("last_error", &self.last_error)
            .finish()
    }
}
