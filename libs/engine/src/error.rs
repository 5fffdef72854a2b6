//! Engine error taxonomy.
//!
//! Every failure is a value returned to the caller; the engine never swallows
//! an error or retries on its own, beyond the selector's single
//! preference-fallback and the check-in commit loop re-running selection when
//! a chosen capsule is taken by a concurrent request.

use chrono::NaiveDate;
use podstay_id::{CapsuleCode, CodeError, GuestId};
use thiserror::Error;

use crate::guest::{InvalidAmount, StoreError};
use crate::ledger::{AvailabilityStatus, LedgerError};
use crate::registry::RegistryError;
use crate::selector::SelectionError;

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The capsule code fails the `<SectionLetter><Number>` pattern.
    #[error("invalid capsule code: {0}")]
    InvalidCapsuleFormat(#[from] CodeError),

    /// The code is well-formed but absent from the registry.
    #[error("capsule not found: {0}")]
    CapsuleNotFound(CapsuleCode),

    /// The capsule was not `available` at commit time. The caller may retry
    /// with a fresh selection.
    #[error("capsule {code} is not available (status: {status})")]
    CapsuleUnavailable {
        code: CapsuleCode,
        status: AvailabilityStatus,
    },

    /// The preferred section is exhausted and fallback is disabled.
    #[error("no capsule available in the preferred section")]
    NoPreferredSectionAvailable,

    /// Selection exhausted: no compatible capsule anywhere.
    #[error("no capsule available")]
    NoCapsuleAtAll,

    /// The guest already holds an active assignment.
    #[error("guest {0} is already checked in")]
    GuestAlreadyCheckedIn(GuestId),

    /// Check-out attempted for a guest with no active binding.
    #[error("guest {0} is not checked in")]
    GuestNotCheckedIn(GuestId),

    /// The guest record does not exist.
    #[error("guest not found: {0}")]
    GuestNotFound(GuestId),

    /// Release attempted on a capsule with no active binding.
    #[error("capsule {0} is not occupied")]
    CapsuleNotOccupied(CapsuleCode),

    /// Out-of-service attempted while the capsule is occupied.
    #[error("capsule {0} is occupied; check the guest out first")]
    CapsuleOccupied(CapsuleCode),

    /// Administrative transition outside the state machine.
    #[error("capsule {code} cannot move from {from} to {to}")]
    InvalidTransition {
        code: CapsuleCode,
        from: AvailabilityStatus,
        to: AvailabilityStatus,
    },

    /// Inventory setup rejected a duplicate code.
    #[error("duplicate capsule code in inventory: {0}")]
    DuplicateCapsule(CapsuleCode),

    /// Guest name is empty after trimming.
    #[error("guest name must not be empty")]
    EmptyGuestName,

    /// Expected checkout date is not strictly after the check-in date.
    #[error("expected checkout {expected} must be after check-in date {check_in}")]
    InvalidCheckoutDate {
        expected: NaiveDate,
        check_in: NaiveDate,
    },

    /// Payment amount is not a non-negative numeric string.
    #[error(transparent)]
    InvalidPaymentAmount(#[from] InvalidAmount),

    /// The guest repository failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<RegistryError> for EngineError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(code) => Self::CapsuleNotFound(code),
            RegistryError::Duplicate(code) => Self::DuplicateCapsule(code),
        }
    }
}

impl From<LedgerError> for EngineError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(code) => Self::CapsuleNotFound(code),
            LedgerError::Unavailable { code, status } => Self::CapsuleUnavailable { code, status },
            LedgerError::NotOccupied(code) => Self::CapsuleNotOccupied(code),
            LedgerError::Occupied(code) => Self::CapsuleOccupied(code),
            LedgerError::InvalidTransition { code, from, to } => {
                Self::InvalidTransition { code, from, to }
            }
        }
    }
}

impl From<SelectionError> for EngineError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::NoPreferredSectionAvailable => Self::NoPreferredSectionAvailable,
            SelectionError::NoCapsuleAtAll => Self::NoCapsuleAtAll,
        }
    }
}
