use std::fmt;
use thiserror::Error;

/// Largest operand magnitude accepted by a range.
///
/// Keeps every product of two operands inside `i64`.
pub const OPERAND_LIMIT: i64 = 1_000_000_000;

/// Largest digit count accepted by [`NumberRange::from_digits`].
pub const MAX_DIGITS: u32 = 9;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RangeError {
    #[error("range minimum {min} is greater than maximum {max}")]
    Inverted { min: i64, max: i64 },
    #[error("range bound {value} is outside ±{limit}", limit = OPERAND_LIMIT)]
    OutOfLimits { value: i64 },
    #[error("range bound is not an integer: {0:?}")]
    NotAnInteger(String),
    #[error("digit count must be between 1 and {max}, got {0}", max = MAX_DIGITS)]
    InvalidDigits(u32),
}

/// Inclusive integer range operands are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumberRange {
    min: i64,
    max: i64,
}

impl NumberRange {
    /// # Errors
    ///
    /// Returns `RangeError::Inverted` if `min > max` and
    /// `RangeError::OutOfLimits` if a bound exceeds [`OPERAND_LIMIT`].
    pub fn new(min: i64, max: i64) -> Result<Self, RangeError> {
        for value in [min, max] {
            if !(-OPERAND_LIMIT..=OPERAND_LIMIT).contains(&value) {
                return Err(RangeError::OutOfLimits { value });
            }
        }
        if min > max {
            return Err(RangeError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    /// Parse user-supplied bounds.
    ///
    /// # Errors
    ///
    /// Returns `RangeError::NotAnInteger` for text that is not a plain
    /// integer, plus the errors of [`NumberRange::new`].
    pub fn parse(min: &str, max: &str) -> Result<Self, RangeError> {
        let parse = |raw: &str| {
            raw.trim()
                .parse::<i64>()
                .map_err(|_| RangeError::NotAnInteger(raw.to_owned()))
        };
        Self::new(parse(min)?, parse(max)?)
    }

    /// All numbers with exactly `digits` decimal digits: `[10^(d-1), 10^d - 1]`.
    ///
    /// A single digit gives `[1, 9]`, so zero never appears as an operand.
    ///
    /// # Errors
    ///
    /// Returns `RangeError::InvalidDigits` unless `1 <= digits <= 9`.
    pub fn from_digits(digits: u32) -> Result<Self, RangeError> {
        if !(1..=MAX_DIGITS).contains(&digits) {
            return Err(RangeError::InvalidDigits(digits));
        }
        let min = 10_i64.pow(digits - 1);
        let max = 10_i64.pow(digits) - 1;
        Self::new(min, max)
    }

    /// `[0, max]`, the range used by mixed-operation drills.
    ///
    /// # Errors
    ///
    /// Same as [`NumberRange::new`].
    pub fn up_to(max: i64) -> Result<Self, RangeError> {
        Self::new(0, max)
    }

    #[must_use]
    pub fn min(&self) -> i64 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> i64 {
        self.max
    }

    #[must_use]
    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl fmt::Display for NumberRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_bounds() {
        assert_eq!(
            NumberRange::new(5, 1).unwrap_err(),
            RangeError::Inverted { min: 5, max: 1 }
        );
        assert!(NumberRange::new(3, 3).is_ok());
    }

    #[test]
    fn rejects_bounds_past_limit() {
        assert!(NumberRange::new(0, OPERAND_LIMIT).is_ok());
        assert_eq!(
            NumberRange::new(0, OPERAND_LIMIT + 1).unwrap_err(),
            RangeError::OutOfLimits {
                value: OPERAND_LIMIT + 1
            }
        );
    }

    #[test]
    fn parse_rejects_non_integers() {
        assert_eq!(
            NumberRange::parse("1.5", "9").unwrap_err(),
            RangeError::NotAnInteger("1.5".into())
        );
        assert_eq!(NumberRange::parse(" -3 ", "12").unwrap(), NumberRange::new(-3, 12).unwrap());
    }

    #[test]
    fn digit_ranges() {
        let one = NumberRange::from_digits(1).unwrap();
        assert_eq!((one.min(), one.max()), (1, 9));
        let three = NumberRange::from_digits(3).unwrap();
        assert_eq!((three.min(), three.max()), (100, 999));
        assert_eq!(NumberRange::from_digits(0).unwrap_err(), RangeError::InvalidDigits(0));
        assert_eq!(NumberRange::from_digits(10).unwrap_err(), RangeError::InvalidDigits(10));
    }
}
