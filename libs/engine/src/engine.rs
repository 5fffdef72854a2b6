//! Check-in / check-out orchestration.
//!
//! Ties the registry, ledger, selector, and guest store together. The commit
//! path follows "select, then atomically commit, retry selection on
//! conflict": selection runs against a snapshot without any lock, and the
//! final bind re-validates inside the ledger's critical section.

use chrono::{NaiveDate, Utc};
use podstay_id::{CapsuleCode, GuestId, RequestId};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::checkout::CheckoutBoard;
use crate::config::{EngineConfig, PostCheckout};
use crate::error::EngineError;
use crate::guest::{
    Gender, Guest, GuestStore, PaymentAmount, PaymentMethod, PaymentRecord, StoreError,
};
use crate::ledger::{AvailabilityLedger, AvailabilityStatus, LedgerError};
use crate::occupancy::OccupancySummary;
use crate::registry::{CapsuleRegistry, GenderPolicy, Section};
use crate::selector::{select_capsule, GuestProfile};

/// A validated-upstream check-in payload. The engine still enforces its own
/// boundary rules: capsule code format, non-empty name, checkout date after
/// the check-in date, non-negative payment amount.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckInRequest {
    /// Caller-supplied request identity for correlating logs across the
    /// transport layer. Generated when absent.
    #[serde(default)]
    pub request_id: Option<RequestId>,
    /// Caller-supplied guest identity, e.g. a returning guest or an
    /// idempotent retry. Generated when absent.
    #[serde(default)]
    pub guest_id: Option<GuestId>,
    pub name: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Explicit capsule code; when absent the selector picks one.
    #[serde(default)]
    pub capsule: Option<String>,
    /// Explicit section preference, overriding the gender-based default.
    #[serde(default)]
    pub section: Option<Section>,
    pub expected_checkout: NaiveDate,
    pub payment_amount: String,
    pub payment_method: PaymentMethod,
    pub payment_collector: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Registry entry joined with live ledger state, for display callers.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CapsuleView {
    pub code: CapsuleCode,
    pub section: Section,
    pub gender_policy: GenderPolicy,
    pub status: AvailabilityStatus,
    pub occupant: Option<GuestId>,
}

/// The occupancy engine.
///
/// Invoked by concurrent request handlers; the ledger serializes all
/// status-changing operations internally, and the engine runs no threads or
/// schedulers of its own.
pub struct Engine<S> {
    registry: CapsuleRegistry,
    ledger: AvailabilityLedger,
    store: S,
    config: EngineConfig,
}

impl<S: GuestStore> Engine<S> {
    /// Builds the engine over a fixed inventory. Every capsule starts
    /// `available`.
    pub fn new(registry: CapsuleRegistry, store: S, config: EngineConfig) -> Self {
        let ledger = AvailabilityLedger::new(registry.codes());
        Self {
            registry,
            ledger,
            store,
            config,
        }
    }

    pub fn registry(&self) -> &CapsuleRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &AvailabilityLedger {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Checks a guest in: validates the payload, picks a capsule (explicit or
    /// selected), atomically occupies it, and persists the guest record bound
    /// to it.
    #[instrument(skip(self, request), fields(guest_name = %request.name))]
    pub async fn check_in(&self, request: CheckInRequest) -> Result<Guest, EngineError> {
        let today = Utc::now().date_naive();

        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(EngineError::EmptyGuestName);
        }
        if request.expected_checkout <= today {
            return Err(EngineError::InvalidCheckoutDate {
                expected: request.expected_checkout,
                check_in: today,
            });
        }
        let amount = PaymentAmount::parse(&request.payment_amount)?;
        let explicit = request
            .capsule
            .as_deref()
            .map(CapsuleCode::parse)
            .transpose()?;
        if let Some(code) = explicit {
            self.registry.get(code)?;
        }

        let request_id = request.request_id.unwrap_or_else(RequestId::new);
        let guest_id = request.guest_id.unwrap_or_else(GuestId::new);
        let mut returning = false;
        if request.guest_id.is_some() {
            match self.store.get(guest_id).await {
                Ok(existing) if existing.checked_in => {
                    return Err(EngineError::GuestAlreadyCheckedIn(guest_id));
                }
                // Known identity with no active stay: a returning guest. The
                // persist below overwrites the record as a fresh stay.
                Ok(_) => returning = true,
                Err(StoreError::NotFound(_)) => {}
                Err(err) => return Err(err.into()),
            }
        }

        let code = match explicit {
            Some(code) => {
                self.ledger.try_occupy(code, guest_id)?;
                code
            }
            None => self.select_and_commit(&request, guest_id)?,
        };

        let guest = Guest {
            id: guest_id,
            name,
            gender: request.gender,
            expected_checkout: request.expected_checkout,
            payment: PaymentRecord {
                amount,
                method: request.payment_method,
                collector: request.payment_collector,
            },
            capsule: Some(code),
            checked_in: true,
            notes: request.notes,
            checked_in_at: Utc::now(),
            checked_out_at: None,
        };

        let persisted = if returning {
            self.store.update(guest.clone()).await
        } else {
            self.store.insert(guest.clone()).await
        };
        if let Err(err) = persisted {
            // Keep the ledger in step with the store: undo the occupy
            if let Err(release_err) = self.ledger.release(code, PostCheckout::Available) {
                warn!(%code, error = %release_err, "failed to roll back occupy after store error");
            }
            return Err(err.into());
        }

        info!(%request_id, guest_id = %guest.id, capsule = %code, returning, "guest checked in");
        Ok(guest)
    }

    /// Select-commit-retry loop. Selection is a pure read over a snapshot;
    /// the commit re-validates under the ledger lock, and a lost race just
    /// reselects against the shrunken candidate set.
    fn select_and_commit(
        &self,
        request: &CheckInRequest,
        guest_id: GuestId,
    ) -> Result<CapsuleCode, EngineError> {
        let profile = GuestProfile {
            gender: request.gender,
            section: request.section,
        };
        loop {
            let snapshot = self.ledger.snapshot();
            let selection = select_capsule(
                &self.registry,
                &snapshot,
                &profile,
                &self.config.preference,
                self.config.fallback,
            )?;
            match self.ledger.try_occupy(selection.code, guest_id) {
                Ok(()) => {
                    if selection.fell_back {
                        debug!(capsule = %selection.code, "preferred section full, placed in other section");
                    }
                    return Ok(selection.code);
                }
                Err(LedgerError::Unavailable { code, .. }) => {
                    debug!(capsule = %code, "lost commit race, reselecting");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Checks a guest out: releases the capsule per the post-checkout policy
    /// and clears the active binding. The record stays, marked checked out.
    #[instrument(skip(self))]
    pub async fn check_out(&self, guest_id: GuestId) -> Result<Guest, EngineError> {
        let mut guest = match self.store.get(guest_id).await {
            Ok(guest) => guest,
            Err(StoreError::NotFound(_)) => return Err(EngineError::GuestNotCheckedIn(guest_id)),
            Err(err) => return Err(err.into()),
        };
        if !guest.checked_in {
            return Err(EngineError::GuestNotCheckedIn(guest_id));
        }
        let Some(code) = guest.capsule else {
            return Err(EngineError::GuestNotCheckedIn(guest_id));
        };

        // Persist the checked-out record before touching the ledger. The
        // capsule stays occupied until the release below, so a store failure
        // leaves both sides unchanged and no other guest can take the slot.
        let prior = guest.clone();
        guest.checked_in = false;
        guest.capsule = None;
        guest.checked_out_at = Some(Utc::now());
        self.store.update(guest.clone()).await?;

        if let Err(err) = self.ledger.release(code, self.config.post_checkout) {
            // Restore the active record so the store and ledger stay in step
            if let Err(restore_err) = self.store.update(prior).await {
                warn!(%guest_id, error = %restore_err, "failed to restore guest record after release error");
            }
            return Err(err.into());
        }

        info!(%guest_id, capsule = %code, "guest checked out");
        Ok(guest)
    }

    /// Updates payment details for a checked-in guest.
    pub async fn record_payment(
        &self,
        guest_id: GuestId,
        payment: PaymentRecord,
    ) -> Result<Guest, EngineError> {
        let mut guest = self.get_checked_in(guest_id).await?;
        guest.payment = payment;
        self.store.update(guest.clone()).await?;
        Ok(guest)
    }

    /// Updates notes for a checked-in guest.
    pub async fn set_notes(
        &self,
        guest_id: GuestId,
        notes: Option<String>,
    ) -> Result<Guest, EngineError> {
        let mut guest = self.get_checked_in(guest_id).await?;
        guest.notes = notes;
        self.store.update(guest.clone()).await?;
        Ok(guest)
    }

    /// Due-today / overdue classification for the given date. Read-only.
    pub async fn checkout_board(&self, today: NaiveDate) -> Result<CheckoutBoard, EngineError> {
        let guests = self.store.list_checked_in().await?;
        Ok(CheckoutBoard::partition(guests, today))
    }

    /// Summary counts over the whole inventory. Read-only.
    pub fn occupancy(&self) -> OccupancySummary {
        OccupancySummary::from_counts(self.registry.len(), &self.ledger.status_counts())
    }

    /// Inventory joined with live status, in stable code order.
    pub fn capsules(&self) -> Vec<CapsuleView> {
        let snapshot = self.ledger.snapshot();
        self.registry
            .list_all()
            .map(|capsule| {
                let (status, occupant) = snapshot
                    .slot_of(capsule.code)
                    .map(|s| (s.status, s.occupant))
                    .unwrap_or((AvailabilityStatus::Available, None));
                CapsuleView {
                    code: capsule.code,
                    section: capsule.section,
                    gender_policy: capsule.gender_policy,
                    status,
                    occupant,
                }
            })
            .collect()
    }

    /// Housekeeping collaborator reports a capsule cleaned.
    pub fn mark_cleaned(&self, code: CapsuleCode) -> Result<(), EngineError> {
        self.ledger.mark_cleaned(code).map_err(Into::into)
    }

    /// Takes a capsule out of service for maintenance.
    pub fn set_out_of_service(&self, code: CapsuleCode) -> Result<(), EngineError> {
        self.ledger.set_out_of_service(code).map_err(Into::into)
    }

    /// Returns a capsule from maintenance to the pool.
    pub fn return_to_service(&self, code: CapsuleCode) -> Result<(), EngineError> {
        self.ledger.return_to_service(code).map_err(Into::into)
    }

    async fn get_checked_in(&self, guest_id: GuestId) -> Result<Guest, EngineError> {
        let guest = match self.store.get(guest_id).await {
            Ok(guest) => guest,
            Err(StoreError::NotFound(_)) => return Err(EngineError::GuestNotFound(guest_id)),
            Err(err) => return Err(err.into()),
        };
        if !guest.checked_in {
            return Err(EngineError::GuestNotCheckedIn(guest_id));
        }
        Ok(guest)
    }
}
