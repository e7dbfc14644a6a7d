use super::format::{self, Conversion, Directive, ScanSpec};
use super::ScanTarget;
use crate::fs::{EndOfFileError, FormatMismatchError, InvalidFormatError, StreamError};

/// A byte input with one byte of pushback, which is all a scan ever needs.
pub(crate) trait ByteSource {
    /// Reads the next byte, or `None` at the end of input.
    fn next_byte(&mut self) -> Result<Option<u8>, StreamError>;

    /// Returns the last byte read to the input.
    fn push_back(&mut self, byte: u8) -> Result<(), StreamError>;
}

/// Scans `source` according to `format`, storing each converted field into the next target.
///
/// Returns the number of targets assigned. A matching failure stops the scan early and is not an
/// error; running out of input before anything was assigned is.
pub(crate) fn scan<S: ByteSource + ?Sized>(
    source: &mut S,
    format: &str,
    targets: &mut [&mut dyn ScanTarget],
) -> Result<usize, StreamError> {
    let directives = format::parse_format(format.as_bytes())?;
    let wanted = directives.iter()
        .filter(|d| matches!(d, Directive::Spec(spec) if !spec.suppress))
        .count();
    if wanted > targets.len() {
        Err(InvalidFormatError)?
    }

    let mut scanner = Scanner { source, exhausted: false };
    let mut targets = targets.iter_mut();
    let mut assigned = 0;

    for directive in directives {
        match directive {
            Directive::Whitespace => scanner.skip_whitespace()?,
            Directive::Literal(byte) => {
                if !scanner.expect(byte)? {
                    return scanner.finish(assigned);
                }
            },
            Directive::Percent => {
                scanner.skip_whitespace()?;
                if !scanner.expect(b'%')? {
                    return scanner.finish(assigned);
                }
            },
            Directive::Spec(spec) => {
                if spec.conversion != Conversion::Chars {
                    scanner.skip_whitespace()?;
                }
                let token = scanner.token(&spec)?;
                if token.is_empty() {
                    return scanner.finish(assigned);
                }
                if spec.suppress {
                    continue;
                }
                let target = targets.next().ok_or(InvalidFormatError)?;
                if !target.store(spec.conversion, &token) {
                    Err(FormatMismatchError)?
                }
                assigned += 1;
            },
        }
    }

    Ok(assigned)
}

struct Scanner<'a, S: ?Sized> {
    source: &'a mut S,
    exhausted: bool,
}

impl<S: ByteSource + ?Sized> Scanner<'_, S> {
    fn next(&mut self) -> Result<Option<u8>, StreamError> {
        let byte = self.source.next_byte()?;
        self.exhausted |= byte.is_none();
        Ok(byte)
    }

    fn finish(&self, assigned: usize) -> Result<usize, StreamError> {
        match (self.exhausted, assigned) {
            (true, 0) => Err(EndOfFileError.into()),
            _ => Ok(assigned),
        }
    }

    fn skip_whitespace(&mut self) -> Result<(), StreamError> {
        while let Some(byte) = self.next()? {
            if !byte.is_ascii_whitespace() {
                self.source.push_back(byte)?;
                break;
            }
        }
        Ok(())
    }

    fn expect(&mut self, expected: u8) -> Result<bool, StreamError> {
        match self.next()? {
            Some(byte) if byte == expected => Ok(true),
            Some(byte) => {
                self.source.push_back(byte)?;
                Ok(false)
            },
            None => Ok(false),
        }
    }

    /// Appends the next byte to `token` if the token has room and `accept` approves of it.
    fn take_if(
        &mut self,
        token: &mut Vec<u8>,
        limit: usize,
        accept: impl Fn(u8) -> bool,
    ) -> Result<bool, StreamError> {
        if token.len() >= limit {
            return Ok(false);
        }
        match self.next()? {
            Some(byte) if accept(byte) => {
                token.push(byte);
                Ok(true)
            },
            Some(byte) => {
                self.source.push_back(byte)?;
                Ok(false)
            },
            None => Ok(false),
        }
    }

    /// Reads the text of one conversion. An empty token means the conversion failed to match.
    fn token(&mut self, spec: &ScanSpec) -> Result<Vec<u8>, StreamError> {
        let limit = spec.limit();
        let mut token = Vec::new();

        match spec.conversion {
            Conversion::Chars => {
                while self.take_if(&mut token, limit, |_| true)? {}
                if token.len() < limit {
                    token.clear();
                }
            },
            Conversion::Word => {
                while self.take_if(&mut token, limit, |b| !b.is_ascii_whitespace())? {}
            },
            Conversion::Float => {
                self.take_if(&mut token, limit, |b| b == b'+' || b == b'-')?;
                let mut digits = 0;
                while self.take_if(&mut token, limit, |b| b.is_ascii_digit())? {
                    digits += 1;
                }
                if self.take_if(&mut token, limit, |b| b == b'.')? {
                    while self.take_if(&mut token, limit, |b| b.is_ascii_digit())? {
                        digits += 1;
                    }
                }
                if digits == 0 {
                    token.clear();
                } else if self.take_if(&mut token, limit, |b| b == b'e' || b == b'E')? {
                    self.take_if(&mut token, limit, |b| b == b'+' || b == b'-')?;
                    while self.take_if(&mut token, limit, |b| b.is_ascii_digit())? {}
                }
            },
            integer => {
                self.take_if(&mut token, limit, |b| b == b'+' || b == b'-')?;
                let mut radix = match integer {
                    Conversion::Unsigned(radix) => radix,
                    Conversion::Auto => 0,
                    _ => 10,
                };
                let mut digits = 0;
                if matches!(radix, 0 | 16) && self.take_if(&mut token, limit, |b| b == b'0')? {
                    digits += 1;
                    if self.take_if(&mut token, limit, |b| b == b'x' || b == b'X')? {
                        radix = 16;
                        digits = 0;
                    } else if radix == 0 {
                        radix = 8;
                    }
                }
                if radix == 0 {
                    radix = 10;
                }
                while self.take_if(&mut token, limit, |b| (b as char).is_digit(radix))? {
                    digits += 1;
                }
                if digits == 0 {
                    token.clear();
                }
            },
        }

        Ok(token)
    }
}
