//! Error types for identifier parsing.

use thiserror::Error;

/// Errors from parsing a capsule code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodeError {
    /// The code string is empty.
    #[error("capsule code cannot be empty")]
    Empty,

    /// The code does not start with an uppercase section letter.
    #[error("capsule code must start with an uppercase section letter: '{0}'")]
    MissingSection(String),

    /// The code has no number after the section letter.
    #[error("capsule code missing number after section letter: '{0}'")]
    MissingNumber(String),

    /// The numeric part is not a positive integer.
    #[error("capsule number must be a positive integer: '{0}'")]
    InvalidNumber(String),
}

/// Errors from parsing a typed ULID-based ID.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The ID string is empty.
    #[error("ID cannot be empty")]
    Empty,

    /// The ID is missing the underscore separator.
    #[error("ID missing underscore separator")]
    MissingSeparator,

    /// The ID has the wrong prefix for its type.
    #[error("invalid ID prefix: expected '{expected}', got '{actual}'")]
    InvalidPrefix {
        expected: &'static str,
        actual: String,
    },

    /// The ULID portion of the ID is invalid.
    #[error("invalid ULID: {0}")]
    InvalidUlid(String),
}
