//! Typed ID definitions for engine resources.
//!
//! Guests and requests get ULID-based IDs; capsules are identified by their
//! physical code (see [`crate::CapsuleCode`]), not a generated ID.

use crate::define_id;

define_id!(GuestId, "gst");
define_id!(RequestId, "req");
