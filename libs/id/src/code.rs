//! Structured capsule codes.
//!
//! A capsule code is one uppercase section letter followed by a positive
//! number, e.g. `C1` or `A01`. Codes are parsed once into a structured form;
//! ordering and equality use the numeric value, so `C2 < C11` and `A1 == A01`.
//! The written digit width is kept so zero-padded codes render unchanged.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::CodeError;

/// A validated capsule code.
#[derive(Debug, Clone, Copy)]
pub struct CapsuleCode {
    section: char,
    number: u32,
    width: u8,
}

impl CapsuleCode {
    /// Builds a code from a section letter and number.
    ///
    /// The letter must be an uppercase ASCII letter and the number positive.
    pub fn new(section: char, number: u32) -> Result<Self, CodeError> {
        if !section.is_ascii_uppercase() {
            return Err(CodeError::MissingSection(section.to_string()));
        }
        if number == 0 {
            return Err(CodeError::InvalidNumber("0".to_string()));
        }
        let width = digit_count(number);
        Ok(Self {
            section,
            number,
            width,
        })
    }

    /// Parses a code from its string form.
    pub fn parse(s: &str) -> Result<Self, CodeError> {
        let mut chars = s.chars();
        let Some(section) = chars.next() else {
            return Err(CodeError::Empty);
        };
        if !section.is_ascii_uppercase() {
            return Err(CodeError::MissingSection(s.to_string()));
        }

        let digits = chars.as_str();
        if digits.is_empty() {
            return Err(CodeError::MissingNumber(s.to_string()));
        }
        // Nine digits is already beyond any physical inventory; this also
        // keeps the u32 parse from overflowing.
        if digits.len() > 9 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CodeError::InvalidNumber(s.to_string()));
        }

        let number: u32 = digits
            .parse()
            .map_err(|_| CodeError::InvalidNumber(s.to_string()))?;
        if number == 0 {
            return Err(CodeError::InvalidNumber(s.to_string()));
        }

        Ok(Self {
            section,
            number,
            width: digits.len() as u8,
        })
    }

    /// Returns the section letter.
    #[must_use]
    pub const fn section_letter(&self) -> char {
        self.section
    }

    /// Returns the numeric part.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }
}

impl fmt::Display for CapsuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:0width$}",
            self.section,
            self.number,
            width = usize::from(self.width)
        )
    }
}

impl FromStr for CapsuleCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Padding width is display-only; identity is (section, number).

impl PartialEq for CapsuleCode {
    fn eq(&self, other: &Self) -> bool {
        self.section == other.section && self.number == other.number
    }
}

impl Eq for CapsuleCode {}

impl Hash for CapsuleCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.section.hash(state);
        self.number.hash(state);
    }
}

impl PartialOrd for CapsuleCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CapsuleCode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.section
            .cmp(&other.section)
            .then(self.number.cmp(&other.number))
    }
}

impl serde::Serialize for CapsuleCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for CapsuleCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

fn digit_count(mut n: u32) -> u8 {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}
