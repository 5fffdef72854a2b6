//! Availability ledger.
//!
//! Owns the authoritative availability status per capsule and the active
//! guest binding. All status-changing operations take the write lock, so a
//! transition is a single atomic check-and-set; two racing `try_occupy`
//! calls on the same code see exactly one winner.
//!
//! Per-capsule state machine:
//!
//! ```text
//! available → occupied          try_occupy
//! occupied  → needs_cleaning    release (default policy)
//! occupied  → available         release (skip-cleaning policy)
//! needs_cleaning → available    mark_cleaned (housekeeping collaborator)
//! available ⇄ out_of_service    set_out_of_service / return_to_service
//! ```
//!
//! `occupied → out_of_service` is disallowed; the guest must check out first.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use podstay_id::{CapsuleCode, GuestId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::PostCheckout;

/// The allocation state of a capsule. Exactly one holds at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Available,
    Occupied,
    NeedsCleaning,
    OutOfService,
}

impl AvailabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::NeedsCleaning => "needs_cleaning",
            Self::OutOfService => "out_of_service",
        }
    }
}

impl std::fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from ledger transitions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The code is not tracked by this ledger.
    #[error("capsule not found: {0}")]
    NotFound(CapsuleCode),

    /// `try_occupy` lost: the capsule was not `available` at commit time.
    #[error("capsule {code} is not available (status: {status})")]
    Unavailable {
        code: CapsuleCode,
        status: AvailabilityStatus,
    },

    /// Release attempted on a capsule with no active binding.
    #[error("capsule {0} is not occupied")]
    NotOccupied(CapsuleCode),

    /// Out-of-service attempted while a guest is still checked in.
    #[error("capsule {0} is occupied; check the guest out first")]
    Occupied(CapsuleCode),

    /// The requested administrative transition is not part of the state machine.
    #[error("capsule {code} cannot move from {from} to {to}")]
    InvalidTransition {
        code: CapsuleCode,
        from: AvailabilityStatus,
        to: AvailabilityStatus,
    },
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    status: AvailabilityStatus,
    occupant: Option<GuestId>,
}

/// Point-in-time view of one capsule's slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotState {
    pub status: AvailabilityStatus,
    pub occupant: Option<GuestId>,
}

/// Consistent read snapshot of the whole ledger, ordered by code.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    slots: BTreeMap<CapsuleCode, SlotState>,
}

impl LedgerSnapshot {
    pub fn status_of(&self, code: CapsuleCode) -> Option<AvailabilityStatus> {
        self.slots.get(&code).map(|s| s.status)
    }

    pub fn slot_of(&self, code: CapsuleCode) -> Option<&SlotState> {
        self.slots.get(&code)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CapsuleCode, &SlotState)> {
        self.slots.iter().map(|(code, slot)| (*code, slot))
    }
}

/// Counts per status, for the occupancy aggregator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub available: usize,
    pub occupied: usize,
    pub needs_cleaning: usize,
    pub out_of_service: usize,
}

/// The availability ledger. The single source of truth for "is this capsule
/// free". Shared between concurrent request handlers; mutations serialize on
/// the internal lock, which is never held across I/O.
#[derive(Debug)]
pub struct AvailabilityLedger {
    slots: RwLock<HashMap<CapsuleCode, Slot>>,
}

impl AvailabilityLedger {
    /// Creates a ledger with every capsule `available`.
    pub fn new(codes: impl IntoIterator<Item = CapsuleCode>) -> Self {
        let slots = codes
            .into_iter()
            .map(|code| {
                (
                    code,
                    Slot {
                        status: AvailabilityStatus::Available,
                        occupant: None,
                    },
                )
            })
            .collect();
        Self {
            slots: RwLock::new(slots),
        }
    }

    /// Atomically transitions `available → occupied` and binds the guest.
    ///
    /// When two callers race on the same code, exactly one succeeds; the
    /// other observes [`LedgerError::Unavailable`].
    pub fn try_occupy(&self, code: CapsuleCode, guest: GuestId) -> Result<(), LedgerError> {
        let mut slots = self.slots.write().expect("ledger lock poisoned");
        let slot = slots.get_mut(&code).ok_or(LedgerError::NotFound(code))?;
        if slot.status != AvailabilityStatus::Available {
            return Err(LedgerError::Unavailable {
                code,
                status: slot.status,
            });
        }
        slot.status = AvailabilityStatus::Occupied;
        slot.occupant = Some(guest);
        debug!(%code, %guest, "capsule occupied");
        Ok(())
    }

    /// Releases an occupied capsule, clearing the guest binding.
    ///
    /// The next status follows the post-checkout policy: `needs_cleaning` by
    /// default, `available` when the cleaning step is skipped. Returns the
    /// guest that held the capsule. Never silently succeeds on a capsule that
    /// is not occupied.
    pub fn release(&self, code: CapsuleCode, policy: PostCheckout) -> Result<GuestId, LedgerError> {
        let mut slots = self.slots.write().expect("ledger lock poisoned");
        let slot = slots.get_mut(&code).ok_or(LedgerError::NotFound(code))?;
        if slot.status != AvailabilityStatus::Occupied {
            return Err(LedgerError::NotOccupied(code));
        }
        let guest = slot.occupant.take().ok_or(LedgerError::NotOccupied(code))?;
        slot.status = match policy {
            PostCheckout::NeedsCleaning => AvailabilityStatus::NeedsCleaning,
            PostCheckout::Available => AvailabilityStatus::Available,
        };
        debug!(%code, %guest, next_status = %slot.status, "capsule released");
        Ok(guest)
    }

    /// Housekeeping completed: `needs_cleaning → available`.
    pub fn mark_cleaned(&self, code: CapsuleCode) -> Result<(), LedgerError> {
        self.transition(
            code,
            AvailabilityStatus::NeedsCleaning,
            AvailabilityStatus::Available,
        )
    }

    /// Administrative: `available → out_of_service`.
    ///
    /// Fails with [`LedgerError::Occupied`] while a guest holds the capsule.
    pub fn set_out_of_service(&self, code: CapsuleCode) -> Result<(), LedgerError> {
        let mut slots = self.slots.write().expect("ledger lock poisoned");
        let slot = slots.get_mut(&code).ok_or(LedgerError::NotFound(code))?;
        match slot.status {
            AvailabilityStatus::Occupied => Err(LedgerError::Occupied(code)),
            AvailabilityStatus::Available => {
                slot.status = AvailabilityStatus::OutOfService;
                debug!(%code, "capsule out of service");
                Ok(())
            }
            from => Err(LedgerError::InvalidTransition {
                code,
                from,
                to: AvailabilityStatus::OutOfService,
            }),
        }
    }

    /// Administrative: `out_of_service → available`.
    pub fn return_to_service(&self, code: CapsuleCode) -> Result<(), LedgerError> {
        self.transition(
            code,
            AvailabilityStatus::OutOfService,
            AvailabilityStatus::Available,
        )
    }

    /// Current status of one capsule.
    pub fn status_of(&self, code: CapsuleCode) -> Result<AvailabilityStatus, LedgerError> {
        let slots = self.slots.read().expect("ledger lock poisoned");
        slots
            .get(&code)
            .map(|s| s.status)
            .ok_or(LedgerError::NotFound(code))
    }

    /// Guest currently bound to a capsule, if any.
    pub fn occupant_of(&self, code: CapsuleCode) -> Result<Option<GuestId>, LedgerError> {
        let slots = self.slots.read().expect("ledger lock poisoned");
        slots
            .get(&code)
            .map(|s| s.occupant)
            .ok_or(LedgerError::NotFound(code))
    }

    /// Consistent snapshot of every slot, for selection and aggregation.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let slots = self.slots.read().expect("ledger lock poisoned");
        LedgerSnapshot {
            slots: slots
                .iter()
                .map(|(code, slot)| {
                    (
                        *code,
                        SlotState {
                            status: slot.status,
                            occupant: slot.occupant,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Counts per status under a single read lock.
    pub fn status_counts(&self) -> StatusCounts {
        let slots = self.slots.read().expect("ledger lock poisoned");
        let mut counts = StatusCounts::default();
        for slot in slots.values() {
            match slot.status {
                AvailabilityStatus::Available => counts.available += 1,
                AvailabilityStatus::Occupied => counts.occupied += 1,
                AvailabilityStatus::NeedsCleaning => counts.needs_cleaning += 1,
                AvailabilityStatus::OutOfService => counts.out_of_service += 1,
            }
        }
        counts
    }

    fn transition(
        &self,
        code: CapsuleCode,
        from: AvailabilityStatus,
        to: AvailabilityStatus,
    ) -> Result<(), LedgerError> {
        let mut slots = self.slots.write().expect("ledger lock poisoned");
        let slot = slots.get_mut(&code).ok_or(LedgerError::NotFound(code))?;
        if slot.status != from {
            return Err(LedgerError::InvalidTransition {
                code,
                from: slot.status,
                to,
            });
        }
        slot.status = to;
        debug!(%code, from = %from, to = %to, "capsule status changed");
        Ok(())
    }
}
