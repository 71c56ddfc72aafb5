//! Phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input contains something other than ASCII digits.
    #[error("phone number may only contain digits")]
    NonDigit,
    /// The input has the wrong number of digits.
    #[error("phone number must be {expected} digits, got {actual}")]
    WrongLength {
        /// Required digit count.
        expected: usize,
        /// Digit count of the input.
        actual: usize,
    },
}

/// A phone number of exactly ten ASCII digits.
///
/// ```
/// use tmc_core::PhoneNumber;
///
/// assert!(PhoneNumber::parse("1234567890").is_ok());
/// assert!(PhoneNumber::parse("123456789").is_err());
/// assert!(PhoneNumber::parse("12345678901").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Required number of digits.
    pub const DIGITS: usize = 10;

    /// Parse a `PhoneNumber`. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is not exactly ten ASCII digits.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let s = s.trim();

        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PhoneError::NonDigit);
        }

        if s.len() != Self::DIGITS {
            return Err(PhoneError::WrongLength {
                expected: Self::DIGITS,
                actual: s.len(),
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ten_digits() {
        assert!(PhoneNumber::parse("1234567890").is_ok());
        assert!(PhoneNumber::parse(" 0987654321 ").is_ok());
    }

    #[test]
    fn test_parse_wrong_length() {
        assert_eq!(
            PhoneNumber::parse("123456789"),
            Err(PhoneError::WrongLength {
                expected: 10,
                actual: 9
            })
        );
        assert!(matches!(
            PhoneNumber::parse("12345678901"),
            Err(PhoneError::WrongLength { actual: 11, .. })
        ));
        assert!(PhoneNumber::parse("").is_err());
    }

    #[test]
    fn test_parse_non_digits() {
        assert_eq!(PhoneNumber::parse("12345-7890"), Err(PhoneError::NonDigit));
        assert_eq!(PhoneNumber::parse("+4712345678"), Err(PhoneError::NonDigit));
    }
}
