//! Photomask barcode number.
//!
//! A barcode is exactly 12 characters long and uses digits plus uppercase
//! Latin letters. The letters O, Q, L, J, U and V are excluded from the
//! alphabet because they are easily confused with digits or each other.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

pub const BARCODE_LENGTH: usize = 12;

pub const FORBIDDEN_LETTERS: [char; 6] = ['O', 'Q', 'L', 'J', 'U', 'V'];

/// "O, Q, L, J, U, V" for error messages.
pub(crate) fn forbidden_letters_list() -> String {
    FORBIDDEN_LETTERS
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_allowed(c: char) -> bool {
    (c.is_ascii_digit() || c.is_ascii_uppercase()) && !FORBIDDEN_LETTERS.contains(&c)
}

/// Validated barcode value. Not used by the OCR pipeline, which matches
/// barcode candidates permissively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Barcode(String);

impl Barcode {
    pub fn new(value: &str) -> Result<Self, ValidationError> {
        let valid = value.chars().count() == BARCODE_LENGTH && value.chars().all(is_allowed);
        if valid {
            Ok(Self(value.to_string()))
        } else {
            Err(ValidationError {
                value: value.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Barcode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Barcode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl AsRef<str> for Barcode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
