use std::str;

use super::Conversion;

/// A place [`FileStream::get_by_format`](crate::fs::FileStream::get_by_format) can store one
/// converted field into.
pub trait ScanTarget {
    /// Stores `text`, which was scanned under `conversion`. Returns false if the text can't be
    /// represented by the target, leaving the target untouched.
    fn store(&mut self, conversion: Conversion, text: &[u8]) -> bool;
}

/// Parses scanned integer text, following the prefix rules of `%i` and the optional `0x` of `%x`.
fn parse_integer(conversion: Conversion, text: &[u8]) -> Option<i128> {
    let text = str::from_utf8(text).ok()?;
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let hex_digits = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X"));

    let (radix, digits) = match (conversion, hex_digits) {
        (Conversion::Unsigned(16) | Conversion::Auto, Some(hex)) => (16, hex),
        (Conversion::Unsigned(radix), None) => (radix, digits),
        (Conversion::Auto, None) if digits.len() > 1 && digits.starts_with('0') => (8, &digits[1..]),
        (Conversion::Auto | Conversion::Signed, None) => (10, digits),
        _ => None?,
    };

    let magnitude = i128::from_str_radix(digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

macro_rules! impl_scan_target_int {
    ($($int:ty),+) => {
        $(
            impl ScanTarget for $int {
                fn store(&mut self, conversion: Conversion, text: &[u8]) -> bool {
                    if !conversion.is_integer() {
                        return false;
                    }
                    match parse_integer(conversion, text).and_then(|v| <$int>::try_from(v).ok()) {
                        Some(value) => {
                            *self = value;
                            true
                        },
                        None => false,
                    }
                }
            }
        )+
    };
}

macro_rules! impl_scan_target_float {
    ($($float:ty),+) => {
        $(
            impl ScanTarget for $float {
                fn store(&mut self, conversion: Conversion, text: &[u8]) -> bool {
                    if conversion != Conversion::Float {
                        return false;
                    }
                    match str::from_utf8(text).ok().and_then(|t| t.parse::<$float>().ok()) {
                        Some(value) => {
                            *self = value;
                            true
                        },
                        None => false,
                    }
                }
            }
        )+
    };
}

impl_scan_target_int!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, usize, isize);
impl_scan_target_float!(f32, f64);

impl ScanTarget for String {
    fn store(&mut self, conversion: Conversion, text: &[u8]) -> bool {
        if !conversion.is_text() {
            return false;
        }
        match str::from_utf8(text) {
            Ok(value) => {
                value.clone_into(self);
                true
            },
            Err(_) => false,
        }
    }
}

impl ScanTarget for Vec<u8> {
    fn store(&mut self, conversion: Conversion, text: &[u8]) -> bool {
        if !conversion.is_text() {
            return false;
        }
        text.clone_into(self);
        true
    }
}

impl ScanTarget for char {
    fn store(&mut self, conversion: Conversion, text: &[u8]) -> bool {
        let mut chars = match (conversion, str::from_utf8(text)) {
            (Conversion::Chars, Ok(value)) => value.chars(),
            _ => return false,
        };
        match (chars.next(), chars.next()) {
            (Some(value), None) => {
                *self = value;
                true
            },
            _ => false,
        }
    }
}
