use std::ffi::CStr;

use derive_more::{Display, IsVariant};
use libc::{SEEK_CUR, SEEK_DATA, SEEK_END, SEEK_HOLE, SEEK_SET, c_int};

/// The disposition a stream is opened with.
///
/// The numeric codes accepted by [`Mode::from_code`] are:
/// 1. read only;
/// 2. write only, truncating or creating the file;
/// 3. append only, creating the file if missing;
/// 4. read and write, the file must exist;
/// 5. read and write, truncating or creating the file;
/// 6. read and append, creating the file if missing.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, IsVariant)]
pub enum Mode {
    #[display("read")]
    Read,
    #[display("write")]
    Write,
    #[display("append")]
    Append,
    #[display("read-write (existing)")]
    ReadWriteExisting,
    #[display("read-write (create)")]
    ReadWriteCreate,
    #[display("read-append")]
    ReadAppend,
}

impl Mode {
    pub fn from_code(code: u16) -> Option<Mode> {
        Some(match code {
            1 => Mode::Read,
            2 => Mode::Write,
            3 => Mode::Append,
            4 => Mode::ReadWriteExisting,
            5 => Mode::ReadWriteCreate,
            6 => Mode::ReadAppend,
            _ => None?,
        })
    }

    pub const fn code(self) -> u16 {
        match self {
            Mode::Read              => 1,
            Mode::Write             => 2,
            Mode::Append            => 3,
            Mode::ReadWriteExisting => 4,
            Mode::ReadWriteCreate   => 5,
            Mode::ReadAppend        => 6,
        }
    }

    pub const fn is_readable(self) -> bool {
        !matches!(self, Mode::Write | Mode::Append)
    }

    pub const fn is_writable(self) -> bool {
        !matches!(self, Mode::Read)
    }

    /// Append-only streams can't be repositioned or measured.
    pub const fn is_append_only(self) -> bool {
        matches!(self, Mode::Append)
    }

    pub(crate) const fn stdio_mode(self, binary: bool) -> &'static CStr {
        match (self, binary) {
            (Mode::Read, false)              => c"r",
            (Mode::Read, true)               => c"rb",
            (Mode::Write, false)             => c"w",
            (Mode::Write, true)              => c"wb",
            (Mode::Append, false)            => c"a",
            (Mode::Append, true)             => c"ab",
            (Mode::ReadWriteExisting, false) => c"r+",
            (Mode::ReadWriteExisting, true)  => c"rb+",
            (Mode::ReadWriteCreate, false)   => c"w+",
            (Mode::ReadWriteCreate, true)    => c"wb+",
            (Mode::ReadAppend, false)        => c"a+",
            (Mode::ReadAppend, true)         => c"ab+",
        }
    }
}

/// The reference point for [`FileStream::point_to`](super::FileStream::point_to).
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, IsVariant)]
pub enum Origin {
    Start,
    Current,
    End,
    /// The next region holding data at or after the offset, for sparse files.
    Data,
    /// The next hole at or after the offset, for sparse files.
    Hole,
}

impl Origin {
    pub fn from_code(code: u16) -> Option<Origin> {
        Some(match code {
            1 => Origin::Start,
            2 => Origin::Current,
            3 => Origin::End,
            4 => Origin::Data,
            5 => Origin::Hole,
            _ => None?,
        })
    }

    pub(crate) const fn whence(self) -> c_int {
        match self {
            Origin::Start   => SEEK_SET,
            Origin::Current => SEEK_CUR,
            Origin::End     => SEEK_END,
            Origin::Data    => SEEK_DATA,
            Origin::Hole    => SEEK_HOLE,
        }
    }
}
