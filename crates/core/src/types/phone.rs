//! Normalized phone identifier.
//!
//! The phone number is the unique, immutable identifier for a tenant. It is
//! normalized at the boundary: all non-digit characters are stripped and the
//! result must be exactly 11 digits.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneError {
    /// The input string contains no digits.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input does not normalize to exactly 11 digits.
    #[error("phone number must be exactly 11 digits (got {got})")]
    WrongLength {
        /// Number of digits after stripping separators.
        got: usize,
    },
}

/// A normalized phone number: exactly 11 digits.
///
/// Parsing strips spaces, dashes, parentheses, and any other non-digit
/// characters before validating length, so `0803-123-4567` and
/// `08031234567` normalize to the same identifier.
///
/// ## Examples
///
/// ```
/// use stitchdesk_core::Phone;
///
/// assert!(Phone::parse("08031234567").is_ok());
/// assert!(Phone::parse("0803-123-4567").is_ok());
///
/// assert!(Phone::parse("").is_err());            // empty
/// assert!(Phone::parse("12345").is_err());       // too short
/// assert!(Phone::parse("080312345678").is_err()); // too long
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Required number of digits.
    pub const DIGITS: usize = 11;

    /// Parse a `Phone` from a string, stripping non-digit characters.
    ///
    /// # Errors
    ///
    /// Returns an error if the input contains no digits, or does not
    /// normalize to exactly 11 digits.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();

        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }

        if digits.len() != Self::DIGITS {
            return Err(PhoneError::WrongLength { got: digits.len() });
        }

        Ok(Self(digits))
    }

    /// Returns the normalized phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Phone` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_digits() {
        let phone = Phone::parse("08031234567").expect("valid");
        assert_eq!(phone.as_str(), "08031234567");
    }

    #[test]
    fn test_parse_strips_separators() {
        let phone = Phone::parse(" 0803-123-4567 ").expect("valid");
        assert_eq!(phone.as_str(), "08031234567");
    }

    #[test]
    fn test_parse_same_identity_for_formatted_input() {
        let a = Phone::parse("0803 123 4567").expect("valid");
        let b = Phone::parse("(0803)1234567").expect("valid");
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(Phone::parse(""), Err(PhoneError::Empty)));
        assert!(matches!(Phone::parse("---"), Err(PhoneError::Empty)));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert!(matches!(
            Phone::parse("12345"),
            Err(PhoneError::WrongLength { got: 5 })
        ));
        assert!(matches!(
            Phone::parse("080312345678"),
            Err(PhoneError::WrongLength { got: 12 })
        ));
    }
}
