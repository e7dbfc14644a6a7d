#![cfg(test)]

use super::*;
use crate::fs::{EndOfFileError, FormatMismatchError, InvalidFormatError, StreamError};

struct SliceSource<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    fn new(text: &'a str) -> SliceSource<'a> {
        SliceSource { bytes: text.as_bytes(), pos: 0 }
    }

    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }
}

impl ByteSource for SliceSource<'_> {
    fn next_byte(&mut self) -> Result<Option<u8>, StreamError> {
        let byte = self.bytes.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        Ok(byte)
    }

    fn push_back(&mut self, byte: u8) -> Result<(), StreamError> {
        assert!(self.pos > 0, "Pushback should only follow a read.");
        self.pos -= 1;
        assert_eq!(self.bytes[self.pos], byte, "Pushback should return the byte just read.");
        Ok(())
    }
}

#[test]
fn test_unsigned_pair() {
    let mut source = SliceSource::new("5:3");
    let (mut a, mut b) = (0_u32, 0_u32);

    assert_eq!(scan(&mut source, "%u:%u", &mut [&mut a, &mut b]), Ok(2));
    assert_eq!((a, b), (5, 3), "Both fields should be stored in order.");
}

#[test]
fn test_whitespace_and_mixed_targets() {
    let mut source = SliceSource::new("  -42   3.5e1 word\tx rest");
    let mut int = 0_i64;
    let mut float = 0.0_f64;
    let mut word = String::new();
    let mut ch = ' ';

    assert_eq!(
        scan(&mut source, "%d %f %s %c", &mut [&mut int, &mut float, &mut word, &mut ch]),
        Ok(4)
    );
    assert_eq!(int, -42);
    assert_eq!(float, 35.0);
    assert_eq!(word, "word");
    assert_eq!(ch, 'x', "%c after a whitespace directive should read the next non-blank byte.");
    assert_eq!(source.rest(), b" rest", "Scanning should stop right after the last field.");
}

#[test]
fn test_auto_radix_and_hex() {
    let mut source = SliceSource::new("0x1f 017 15 ff");
    let (mut hex, mut oct, mut dec, mut bare_hex) = (0_i32, 0_i32, 0_i32, 0_u8);

    assert_eq!(
        scan(&mut source, "%i %i %i %x", &mut [&mut hex, &mut oct, &mut dec, &mut bare_hex]),
        Ok(4)
    );
    assert_eq!((hex, oct, dec, bare_hex), (31, 15, 15, 255));
}

#[test]
fn test_width_and_suppression() {
    let mut source = SliceSource::new("123456 skipped kept");
    let (mut head, mut tail) = (0_u32, 0_u32);
    let mut kept = Vec::<u8>::new();

    assert_eq!(
        scan(&mut source, "%3u%u %*s %s", &mut [&mut head, &mut tail, &mut kept]),
        Ok(3),
        "Suppressed conversions shouldn't count or consume a target."
    );
    assert_eq!((head, tail), (123, 456), "Width should split a run of digits.");
    assert_eq!(kept, b"kept");
}

#[test]
fn test_matching_failure_is_partial() {
    let mut source = SliceSource::new("7,abc");
    let (mut a, mut b) = (0_u32, 0_u32);

    assert_eq!(scan(&mut source, "%u,%u", &mut [&mut a, &mut b]), Ok(1));
    assert_eq!(a, 7);
    assert_eq!(b, 0, "Unmatched targets should be left untouched.");
    assert_eq!(source.rest(), b"abc", "The mismatching byte should be pushed back.");
}

#[test]
fn test_literal_mismatch_stops() {
    let mut source = SliceSource::new("1|2");
    let (mut a, mut b) = (0_u8, 0_u8);

    assert_eq!(scan(&mut source, "%u:%u", &mut [&mut a, &mut b]), Ok(1));
    assert_eq!(source.rest(), b"|2");
}

#[test]
fn test_end_of_input_before_any_field() {
    let mut source = SliceSource::new("   ");
    let mut a = 0_u32;

    assert_eq!(
        scan(&mut source, "%u", &mut [&mut a]),
        Err(StreamError::EndOfFile(EndOfFileError)),
        "Running out of input before the first conversion should be an error."
    );
}

#[test]
fn test_percent_literal() {
    let mut source = SliceSource::new("50 %");
    let mut a = 0_u32;

    assert_eq!(scan(&mut source, "%u%%", &mut [&mut a]), Ok(1));
    assert!(source.rest().is_empty());
}

#[test]
fn test_type_mismatch() {
    let mut source = SliceSource::new("-1");
    let mut a = 0_u32;
    assert_eq!(
        scan(&mut source, "%d", &mut [&mut a]),
        Err(StreamError::FormatMismatch(FormatMismatchError)),
        "A negative value can't be stored in an unsigned target."
    );

    let mut source = SliceSource::new("300");
    let mut b = 0_u8;
    assert_eq!(scan(&mut source, "%u", &mut [&mut b]), Err(StreamError::FormatMismatch(FormatMismatchError)));

    let mut source = SliceSource::new("1.5");
    let mut c = 0.0_f32;
    assert_eq!(
        scan(&mut source, "%u", &mut [&mut c]),
        Err(StreamError::FormatMismatch(FormatMismatchError)),
        "Float targets should only accept float conversions."
    );
}

#[test]
fn test_invalid_formats() {
    let mut a = 0_u32;
    for format in ["%", "%q", "%0u", "%[a]", "%n"] {
        let mut source = SliceSource::new("1");
        assert_eq!(
            scan(&mut source, format, &mut [&mut a]),
            Err(StreamError::InvalidFormat(InvalidFormatError)),
            "{format:?} should be rejected."
        );
        assert_eq!(source.pos, 0, "An invalid format shouldn't consume input.");
    }

    let mut source = SliceSource::new("1 2");
    assert_eq!(
        scan(&mut source, "%u %u", &mut [&mut a]),
        Err(StreamError::InvalidFormat(InvalidFormatError)),
        "Having fewer targets than conversions should be rejected up front."
    );
}

#[test]
fn test_chars_width() {
    let mut source = SliceSource::new("ab cd");
    let mut text = String::new();

    assert_eq!(scan(&mut source, "%4c", &mut [&mut text]), Ok(1));
    assert_eq!(text, "ab c", "%c should keep whitespace.");
}
