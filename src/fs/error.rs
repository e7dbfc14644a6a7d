use derive_more::{Display, Error, From, IsVariant};
use libc::c_int;

/// An integer error code, as reported by `errno` or chosen as a stream's default code.
pub type ErrorCode = c_int;

/// The code recorded for precondition and transfer failures unless a stream is configured with
/// another one.
pub const DEFAULT_ERROR_CODE: ErrorCode = 1;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error)]
#[display("stream is not open")]
pub struct NotOpenError;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error)]
#[display("stream is already open")]
pub struct AlreadyOpenError;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error)]
#[display("operation not permitted by the stream's open mode")]
pub struct WrongModeError;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error)]
#[display("end of file reached")]
pub struct EndOfFileError;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error)]
#[display("unsupported element count of zero")]
pub struct UnsupportedError;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error)]
#[display("path is too long")]
pub struct PathLengthError;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error)]
#[display("path contains an interior nul byte")]
pub struct InvalidPathError;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error)]
#[display("buffer is not terminated within its expected size")]
pub struct UnterminatedError;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error)]
#[display("element is not representable as a text character")]
pub struct TextRangeError;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error)]
#[display("fewer elements transferred than requested")]
pub struct ShortTransferError;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error)]
#[display("malformed format string or too few scan targets")]
pub struct InvalidFormatError;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error)]
#[display("scanned text does not fit the target type")]
pub struct FormatMismatchError;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error)]
#[display("OS error with code: {_0}")]
pub struct OsError(#[error(not(source))] pub ErrorCode);

/// Every failure a [`FileStream`](super::stream::FileStream) can record.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, From, Error, IsVariant)]
pub enum StreamError {
    NotOpen(NotOpenError),
    AlreadyOpen(AlreadyOpenError),
    WrongMode(WrongModeError),
    EndOfFile(EndOfFileError),
    Unsupported(UnsupportedError),
    PathLength(PathLengthError),
    InvalidPath(InvalidPathError),
    Unterminated(UnterminatedError),
    TextRange(TextRangeError),
    ShortTransfer(ShortTransferError),
    InvalidFormat(InvalidFormatError),
    FormatMismatch(FormatMismatchError),
    Os(OsError),
}

impl StreamError {
    /// Returns true if the error was raised before any OS call was attempted.
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            StreamError::NotOpen(_)
                | StreamError::AlreadyOpen(_)
                | StreamError::WrongMode(_)
                | StreamError::EndOfFile(_)
                | StreamError::Unsupported(_)
                | StreamError::PathLength(_)
                | StreamError::InvalidPath(_)
                | StreamError::Unterminated(_)
                | StreamError::TextRange(_)
                | StreamError::InvalidFormat(_)
        )
    }

    /// The integer code for this error: the OS code for OS failures, `default` otherwise.
    pub const fn code(&self, default: ErrorCode) -> ErrorCode {
        match self {
            StreamError::Os(OsError(code)) => *code,
            _ => default,
        }
    }
}

impl From<StreamError> for std::io::Error {
    fn from(value: StreamError) -> Self {
        use std::io::ErrorKind;

        match value {
            StreamError::Os(OsError(code)) => std::io::Error::from_raw_os_error(code),
            StreamError::EndOfFile(_) | StreamError::ShortTransfer(_) => {
                std::io::Error::new(ErrorKind::UnexpectedEof, value)
            },
            StreamError::NotOpen(_) | StreamError::WrongMode(_) | StreamError::AlreadyOpen(_) => {
                std::io::Error::new(ErrorKind::Unsupported, value)
            },
            _ => std::io::Error::new(ErrorKind::InvalidInput, value),
        }
    }
}
