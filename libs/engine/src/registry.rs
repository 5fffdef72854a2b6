//! Static capsule inventory.
//!
//! The registry is the authoritative list of capsule codes with their section
//! and gender policy. It is built once at setup and never mutated; capsule
//! availability lives in the ledger, not here. Sections are configured per
//! capsule — the engine never infers a section from the code's number.

use std::collections::BTreeMap;

use podstay_id::CapsuleCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::guest::Gender;

/// Errors from registry setup and lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The same code appears twice in the inventory.
    #[error("duplicate capsule code in inventory: {0}")]
    Duplicate(CapsuleCode),

    /// The code is well-formed but not part of the inventory.
    #[error("capsule not found: {0}")]
    NotFound(CapsuleCode),
}

/// A named grouping of capsules used for preference-based selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Front,
    Middle,
    Back,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Middle => "middle",
            Self::Back => "back",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gender suitability of a capsule.
///
/// A restricted capsule admits only guests with a matching declared gender;
/// guests without a declared gender are placed in unisex capsules only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenderPolicy {
    Unisex,
    WomenOnly,
    MenOnly,
}

impl GenderPolicy {
    /// Whether a guest with the given declared gender may occupy the capsule.
    pub fn admits(&self, gender: Option<Gender>) -> bool {
        match self {
            Self::Unisex => true,
            Self::WomenOnly => gender == Some(Gender::Female),
            Self::MenOnly => gender == Some(Gender::Male),
        }
    }
}

/// A single physical sleeping unit, the unit of allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capsule {
    pub code: CapsuleCode,
    pub section: Section,
    #[serde(default = "default_gender_policy")]
    pub gender_policy: GenderPolicy,
}

fn default_gender_policy() -> GenderPolicy {
    GenderPolicy::Unisex
}

/// The fixed capsule inventory, ordered by structured code.
#[derive(Debug, Clone)]
pub struct CapsuleRegistry {
    capsules: BTreeMap<CapsuleCode, Capsule>,
}

impl CapsuleRegistry {
    /// Builds the registry from inventory entries, rejecting duplicate codes.
    pub fn new(capsules: impl IntoIterator<Item = Capsule>) -> Result<Self, RegistryError> {
        let mut map = BTreeMap::new();
        for capsule in capsules {
            if map.insert(capsule.code, capsule).is_some() {
                return Err(RegistryError::Duplicate(capsule.code));
            }
        }
        Ok(Self { capsules: map })
    }

    /// Looks up a capsule by code.
    pub fn get(&self, code: CapsuleCode) -> Result<&Capsule, RegistryError> {
        self.capsules.get(&code).ok_or(RegistryError::NotFound(code))
    }

    /// Iterates the inventory in stable code order (numeric within a letter).
    pub fn list_all(&self) -> impl Iterator<Item = &Capsule> {
        self.capsules.values()
    }

    /// All codes in stable order.
    pub fn codes(&self) -> impl Iterator<Item = CapsuleCode> + '_ {
        self.capsules.keys().copied()
    }

    /// Inventory size.
    pub fn len(&self) -> usize {
        self.capsules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capsules.is_empty()
    }
}
