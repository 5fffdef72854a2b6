//! # podstay-id
//!
//! Identifier types for the podstay occupancy engine.
//!
//! ## Design Principles
//!
//! - Capsule codes are parsed once at the boundary into a structured
//!   `(section letter, number)` form; all ordering and comparison operate on
//!   the structured form, never on raw strings
//! - Guest and request IDs are system-generated, typed, and have a canonical
//!   string representation with strict parsing
//! - All identifiers support roundtrip serialization (parse → format → parse)
//!
//! ## Formats
//!
//! Capsule codes are one uppercase section letter followed by a positive
//! number, with optional zero-padding preserved for display:
//!
//! - `C1`, `C26`
//! - `A01` (renders back as `A01`, compares equal to `A1`)
//!
//! Guest/request IDs use a prefixed ULID format:
//!
//! - `gst_01HV4Z2WQXKJNM8GPQY6VBKC3D`
//! - `req_01HV4Z3MXNKPQR9HSTZ7WCLD4E`

mod code;
mod error;
mod macros;
mod types;

pub use code::CapsuleCode;
pub use error::{CodeError, IdError};
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
