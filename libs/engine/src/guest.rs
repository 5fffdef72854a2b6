//! Guest records and the repository seam.
//!
//! A guest record is created at check-in and marked checked out at check-out;
//! it is never deleted by the engine. Durable storage is a collaborator
//! concern behind [`GuestStore`]; [`MemoryGuestStore`] is the in-tree
//! reference implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use podstay_id::{CapsuleCode, GuestId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declared guest gender. Affects selection preference and gender-restricted
/// capsules only when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
}

/// How a stay was paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Platform,
}

/// The amount string failed validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("payment amount must be a non-negative number: '{0}'")]
pub struct InvalidAmount(pub String);

/// A validated non-negative decimal amount, kept as the string the collaborator
/// supplied. The engine records payments; it never does payment arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PaymentAmount(String);

impl PaymentAmount {
    /// Validates an amount string: digits with at most one decimal point,
    /// at least one digit, no sign.
    pub fn parse(s: &str) -> Result<Self, InvalidAmount> {
        let trimmed = s.trim();
        let mut digits = 0usize;
        let mut dots = 0usize;
        for b in trimmed.bytes() {
            match b {
                b'0'..=b'9' => digits += 1,
                b'.' => dots += 1,
                _ => return Err(InvalidAmount(s.to_string())),
            }
        }
        if digits == 0 || dots > 1 {
            return Err(InvalidAmount(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PaymentAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PaymentAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Payment details captured at check-in and updatable during the stay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub amount: PaymentAmount,
    pub method: PaymentMethod,
    pub collector: String,
}

/// A guest record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guest {
    pub id: GuestId,
    pub name: String,
    pub gender: Option<Gender>,
    pub expected_checkout: NaiveDate,
    pub payment: PaymentRecord,
    /// Active capsule binding. `Some` exactly while checked in.
    pub capsule: Option<CapsuleCode>,
    pub checked_in: bool,
    pub notes: Option<String>,
    pub checked_in_at: DateTime<Utc>,
    pub checked_out_at: Option<DateTime<Utc>>,
}

/// Errors from guest record storage.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("guest not found: {0}")]
    NotFound(GuestId),

    #[error("guest already exists: {0}")]
    AlreadyExists(GuestId),

    /// A durable backend failed; carries the backend's message.
    #[error("guest store backend error: {0}")]
    Backend(String),
}

/// Repository seam for guest records.
///
/// Implementations must be safe to call from concurrent request handlers.
#[async_trait]
pub trait GuestStore: Send + Sync {
    /// Inserts a new guest record.
    async fn insert(&self, guest: Guest) -> Result<(), StoreError>;

    /// Fetches a guest record by ID.
    async fn get(&self, id: GuestId) -> Result<Guest, StoreError>;

    /// Replaces an existing guest record.
    async fn update(&self, guest: Guest) -> Result<(), StoreError>;

    /// All currently checked-in guests.
    async fn list_checked_in(&self) -> Result<Vec<Guest>, StoreError>;
}

/// In-memory guest store.
#[derive(Debug, Default)]
pub struct MemoryGuestStore {
    guests: RwLock<HashMap<GuestId, Guest>>,
}

impl MemoryGuestStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GuestStore for MemoryGuestStore {
    async fn insert(&self, guest: Guest) -> Result<(), StoreError> {
        let mut guests = self.guests.write().expect("guest store lock poisoned");
        if guests.contains_key(&guest.id) {
            return Err(StoreError::AlreadyExists(guest.id));
        }
        guests.insert(guest.id, guest);
        Ok(())
    }

    async fn get(&self, id: GuestId) -> Result<Guest, StoreError> {
        let guests = self.guests.read().expect("guest store lock poisoned");
        guests.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, guest: Guest) -> Result<(), StoreError> {
        let mut guests = self.guests.write().expect("guest store lock poisoned");
        let Some(slot) = guests.get_mut(&guest.id) else {
            return Err(StoreError::NotFound(guest.id));
        };
        *slot = guest;
        Ok(())
    }

    async fn list_checked_in(&self) -> Result<Vec<Guest>, StoreError> {
        let guests = self.guests.read().expect("guest store lock poisoned");
        let mut checked_in: Vec<Guest> = guests.values().filter(|g| g.checked_in).cloned().collect();
        // Stable output order for callers and tests
        checked_in.sort_by_key(|g| g.id);
        Ok(checked_in)
    }
}
