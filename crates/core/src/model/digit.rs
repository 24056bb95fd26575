use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DigitError {
    #[error("predicted digit {0} is outside 0..=9")]
    OutOfRange(i64),
}

/// One recognised gesture: a single decimal digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digit(u8);

impl Digit {
    /// # Errors
    ///
    /// Returns `DigitError::OutOfRange` unless `value` is in `0..=9`.
    pub fn new(value: i64) -> Result<Self, DigitError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 9)
            .map(Self)
            .ok_or(DigitError::OutOfRange(value))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn as_char(self) -> char {
        char::from(b'0' + self.0)
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_zero_through_nine() {
        for v in 0..=9 {
            let d = Digit::new(v).unwrap();
            assert_eq!(i64::from(d.value()), v);
            assert_eq!(d.as_char().to_digit(10), Some(u32::from(d.value())));
        }
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(Digit::new(10), Err(DigitError::OutOfRange(10)));
        assert_eq!(Digit::new(-1), Err(DigitError::OutOfRange(-1)));
    }
}
