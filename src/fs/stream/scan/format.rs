use derive_more::IsVariant;

use crate::fs::{InvalidFormatError, StreamError};

/// The kind of text a scan conversion accepts, and how numbers in it are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum Conversion {
    /// `%d`: an optionally signed decimal integer.
    Signed,
    /// `%i`: an optionally signed integer whose radix follows its prefix (`0x`, `0`, or none).
    Auto,
    /// `%u`, `%o`, `%x`: an integer in the given radix.
    Unsigned(u32),
    /// `%f`, `%e`, `%g`, `%a` and their capitals.
    Float,
    /// `%s`: a run of non-whitespace bytes.
    Word,
    /// `%c`: exactly `width` bytes (default 1), whitespace included.
    Chars,
}

impl Conversion {
    pub const fn is_integer(self) -> bool {
        matches!(self, Conversion::Signed | Conversion::Auto | Conversion::Unsigned(_))
    }

    pub const fn is_text(self) -> bool {
        matches!(self, Conversion::Word | Conversion::Chars)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScanSpec {
    pub suppress: bool,
    pub width: Option<usize>,
    pub conversion: Conversion,
}

impl ScanSpec {
    pub const fn limit(&self) -> usize {
        match (self.width, self.conversion) {
            (Some(width), _) => width,
            (None, Conversion::Chars) => 1,
            (None, _) => usize::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub(crate) enum Directive {
    /// Any run of whitespace in the format, matching any amount (including none) of input
    /// whitespace.
    Whitespace,
    /// A byte that must appear verbatim in the input.
    Literal(u8),
    /// `%%`.
    Percent,
    Spec(ScanSpec),
}

/// Parses a whole scan format up front, so malformed formats fail before any input is consumed.
pub(crate) fn parse_format(format: &[u8]) -> Result<Vec<Directive>, StreamError> {
    let mut directives = Vec::new();
    let mut pos = 0;

    while pos < format.len() {
        match format[pos] {
            b'%' => {
                let (directive, consumed) = parse_spec(&format[pos + 1..])?;
                directives.push(directive);
                pos += consumed + 1;
            },
            ch if ch.is_ascii_whitespace() => {
                if !directives.last().is_some_and(|d: &Directive| d.is_whitespace()) {
                    directives.push(Directive::Whitespace);
                }
                pos += 1;
            },
            ch => {
                directives.push(Directive::Literal(ch));
                pos += 1;
            },
        }
    }

    Ok(directives)
}

/// Parses one directive from the bytes following a '%', returning it with the number of bytes
/// consumed.
fn parse_spec(fmt: &[u8]) -> Result<(Directive, usize), StreamError> {
    let mut pos = 0;

    if fmt.first() == Some(&b'%') {
        return Ok((Directive::Percent, 1));
    }

    let suppress = fmt.first() == Some(&b'*');
    if suppress {
        pos += 1;
    }

    let start = pos;
    while pos < fmt.len() && fmt[pos].is_ascii_digit() {
        pos += 1;
    }
    let width = match pos > start {
        true => Some(parse_width(&fmt[start..pos])?),
        false => None,
    };

    // Length modifiers are accepted for familiarity; the target type decides the width.
    while pos < fmt.len() && matches!(fmt[pos], b'h' | b'l' | b'L' | b'q' | b'j' | b'z' | b't') {
        pos += 1;
    }

    let conversion = match fmt.get(pos) {
        Some(b'd') => Conversion::Signed,
        Some(b'i') => Conversion::Auto,
        Some(b'u') => Conversion::Unsigned(10),
        Some(b'o') => Conversion::Unsigned(8),
        Some(b'x' | b'X') => Conversion::Unsigned(16),
        Some(b'f' | b'F' | b'e' | b'E' | b'g' | b'G' | b'a' | b'A') => Conversion::Float,
        Some(b's') => Conversion::Word,
        Some(b'c') => Conversion::Chars,
        _ => Err(InvalidFormatError)?,
    };

    Ok((Directive::Spec(ScanSpec { suppress, width, conversion }), pos + 1))
}

fn parse_width(digits: &[u8]) -> Result<usize, StreamError> {
    let width = digits.iter().try_fold(0_usize, |acc, &d| {
        acc.checked_mul(10)?.checked_add((d - b'0') as usize)
    });
    match width {
        Some(0) | None => Err(InvalidFormatError.into()),
        Some(width) => Ok(width),
    }
}
