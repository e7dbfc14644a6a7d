use std::fmt::Debug;

/// A fixed-size value that can be moved to and from a file as raw bytes.
///
/// # Safety
/// Implementors must have no padding bytes and every bit pattern of `size_of::<Self>()` bytes must
/// be a valid value, because binary reads fill values straight from file contents.
pub unsafe trait Element: Copy + PartialEq + Debug + 'static {
    /// The element that ends strings and buffers.
    const ZERO: Self;

    /// Converts one text character into an element.
    fn from_text(byte: u8) -> Self;

    /// Converts an element into one text character, if it fits into one.
    fn to_text(self) -> Option<u8>;

    fn newline() -> Self {
        Self::from_text(b'\n')
    }
}

macro_rules! impl_element_int {
    ($($int:ty),+) => {
        $(
            // SAFETY: Primitive integers have no padding and no invalid bit patterns.
            unsafe impl Element for $int {
                const ZERO: Self = 0;

                fn from_text(byte: u8) -> Self {
                    byte as $int
                }

                /// Single-byte types reinterpret their bits, as `fputc` does with a C `char`.
                fn to_text(self) -> Option<u8> {
                    match size_of::<Self>() {
                        1 => Some(self as u8),
                        _ => u8::try_from(self).ok(),
                    }
                }
            }
        )+
    };
}

macro_rules! impl_element_float {
    ($($float:ty),+) => {
        $(
            // SAFETY: Every bit pattern of an IEEE 754 float is a valid (possibly NaN) value.
            unsafe impl Element for $float {
                const ZERO: Self = 0.0;

                fn from_text(byte: u8) -> Self {
                    byte as $float
                }

                fn to_text(self) -> Option<u8> {
                    (self.fract() == 0.0 && (0.0..=255.0).contains(&self)).then_some(self as u8)
                }
            }
        )+
    };
}

impl_element_int!(u8, i8, u16, i16, u32, i32, u64, i64, usize, isize);
impl_element_float!(f32, f64);
