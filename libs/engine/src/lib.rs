//! # podstay-engine
//!
//! Capsule occupancy and assignment engine for a capsule hostel.
//!
//! The engine owns the allocation invariants and state-transition logic:
//!
//! - **Registry**: the fixed capsule inventory (code, section, gender policy)
//! - **Ledger**: the authoritative availability status per capsule and the
//!   guest binding, with lock-serialized transitions
//! - **Selector**: preference-ordered, deterministic capsule selection for an
//!   incoming guest
//! - **Checkout board**: due-today / overdue classification of checked-in
//!   guests
//! - **Occupancy**: summary counts and occupancy rate
//!
//! Everything around the engine (HTTP transport, durable storage, auth, UI,
//! notification delivery) is a collaborator. Collaborators reach durable
//! guest records through the [`GuestStore`] seam; the engine ships an
//! in-memory implementation.
//!
//! The core correctness property is the 1:1 active binding: at most one
//! checked-in guest per capsule, at most one occupied capsule per guest,
//! created and destroyed atomically with check-in and check-out.

mod checkout;
mod config;
mod engine;
mod error;
mod guest;
mod ledger;
mod occupancy;
mod registry;
mod selector;

pub use checkout::{is_noon_window, CheckoutBoard};
pub use config::{EngineConfig, PostCheckout};
pub use engine::{CapsuleView, CheckInRequest, Engine};
pub use error::EngineError;
pub use guest::{
    Gender, Guest, GuestStore, InvalidAmount, MemoryGuestStore, PaymentAmount, PaymentMethod,
    PaymentRecord, StoreError,
};
pub use ledger::{
    AvailabilityLedger, AvailabilityStatus, LedgerError, LedgerSnapshot, SlotState, StatusCounts,
};
pub use occupancy::OccupancySummary;
pub use registry::{Capsule, CapsuleRegistry, GenderPolicy, RegistryError, Section};
pub use selector::{
    select_capsule, FallbackMode, GuestProfile, PreferencePolicy, Selection, SelectionError,
};
