//! Assignment selector.
//!
//! Pure, deterministic selection of one capsule for an incoming guest over a
//! ledger snapshot. Selection has no side effects; the caller commits the
//! choice with [`crate::AvailabilityLedger::try_occupy`] and retries selection
//! if the commit loses a race.
//!
//! Ordering rule: candidates fill in ascending structured-code order, so `C4`
//! is taken before `C11` (numeric, not lexicographic).

use std::collections::BTreeMap;

use podstay_id::CapsuleCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::guest::Gender;
use crate::ledger::{AvailabilityStatus, LedgerSnapshot};
use crate::registry::{CapsuleRegistry, Section};

/// Selection failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    /// The preferred section has no candidate and fallback is disabled.
    #[error("no capsule available in the preferred section")]
    NoPreferredSectionAvailable,

    /// No gender-compatible capsule is available anywhere.
    #[error("no capsule available")]
    NoCapsuleAtAll,
}

/// What the selector knows about the incoming guest.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuestProfile {
    pub gender: Option<Gender>,
    /// Explicit section preference; overrides the gender-based table.
    pub section: Option<Section>,
}

/// Whether selection may leave the preferred section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    /// Fall back to the other partition when the preferred one is empty.
    #[default]
    AllowOther,
    /// Fail with [`SelectionError::NoPreferredSectionAvailable`] instead.
    PreferredOnly,
}

/// Gender → preferred section table.
///
/// The default places female guests in the back section when capacity allows.
/// The table is configuration; swap it without touching the selection logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferencePolicy {
    table: BTreeMap<Gender, Section>,
}

impl Default for PreferencePolicy {
    fn default() -> Self {
        Self {
            table: BTreeMap::from([(Gender::Female, Section::Back)]),
        }
    }
}

impl PreferencePolicy {
    pub fn new(table: BTreeMap<Gender, Section>) -> Self {
        Self { table }
    }

    /// No gender-based preference at all.
    pub fn none() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// The section this guest should be steered toward, if any. An explicit
    /// request in the profile wins over the gender table.
    pub fn preferred_for(&self, profile: &GuestProfile) -> Option<Section> {
        profile
            .section
            .or_else(|| profile.gender.and_then(|g| self.table.get(&g).copied()))
    }
}

/// A successful selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub code: CapsuleCode,
    /// True when a preference existed but the capsule comes from the other
    /// partition.
    pub fell_back: bool,
}

/// Picks exactly one capsule for the guest.
///
/// Candidates are the `available` capsules whose gender policy admits the
/// guest, partitioned into preferred section and other, each in ascending
/// code order. The first preferred candidate wins; with
/// [`FallbackMode::AllowOther`] the first other-partition candidate is used
/// when the preferred partition is empty.
pub fn select_capsule(
    registry: &CapsuleRegistry,
    snapshot: &LedgerSnapshot,
    profile: &GuestProfile,
    policy: &PreferencePolicy,
    fallback: FallbackMode,
) -> Result<Selection, SelectionError> {
    let preferred_section = policy.preferred_for(profile);

    let mut preferred = None;
    let mut other = None;

    // Registry iteration is already in ascending structured-code order, so
    // the first hit per partition is the winner.
    for capsule in registry.list_all() {
        if snapshot.status_of(capsule.code) != Some(AvailabilityStatus::Available) {
            continue;
        }
        if !capsule.gender_policy.admits(profile.gender) {
            continue;
        }
        match preferred_section {
            Some(section) if capsule.section == section => {
                preferred = Some(capsule.code);
                break;
            }
            Some(_) => {
                if other.is_none() {
                    other = Some(capsule.code);
                }
            }
            None => {
                preferred = Some(capsule.code);
                break;
            }
        }
    }

    match (preferred, other) {
        (Some(code), _) => Ok(Selection {
            code,
            fell_back: false,
        }),
        (None, Some(code)) => match fallback {
            FallbackMode::AllowOther => Ok(Selection {
                code,
                fell_back: true,
            }),
            FallbackMode::PreferredOnly => Err(SelectionError::NoPreferredSectionAvailable),
        },
        (None, None) => Err(SelectionError::NoCapsuleAtAll),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PostCheckout;
    use crate::ledger::AvailabilityLedger;
    use crate::registry::{Capsule, GenderPolicy};
    use podstay_id::GuestId;
    use rstest::rstest;

    fn code(s: &str) -> CapsuleCode {
        s.parse().unwrap()
    }

    /// C1..C6 back, C7..C12 front, all unisex.
    fn registry() -> CapsuleRegistry {
        let capsules = (1..=12).map(|n| Capsule {
            code: CapsuleCode::new('C', n).unwrap(),
            section: if n <= 6 { Section::Back } else { Section::Front },
            gender_policy: GenderPolicy::Unisex,
        });
        CapsuleRegistry::new(capsules).unwrap()
    }

    fn ledger_with_available(registry: &CapsuleRegistry, available: &[&str]) -> AvailabilityLedger {
        let ledger = AvailabilityLedger::new(registry.codes());
        let keep: Vec<CapsuleCode> = available.iter().map(|s| code(s)).collect();
        for c in registry.codes() {
            if !keep.contains(&c) {
                // Park everything else out of the candidate set
                ledger.set_out_of_service(c).unwrap();
            }
        }
        ledger
    }

    fn female() -> GuestProfile {
        GuestProfile {
            gender: Some(Gender::Female),
            section: None,
        }
    }

    #[test]
    fn test_prefers_lowest_number_in_preferred_section() {
        let registry = registry();
        let ledger = ledger_with_available(&registry, &["C1", "C4", "C11", "C12"]);

        let selection = select_capsule(
            &registry,
            &ledger.snapshot(),
            &female(),
            &PreferencePolicy::default(),
            FallbackMode::AllowOther,
        )
        .unwrap();

        assert_eq!(selection.code, code("C1"));
        assert!(!selection.fell_back);
    }

    #[test]
    fn test_numeric_order_within_partition() {
        let registry = registry();
        let ledger = ledger_with_available(&registry, &["C4", "C11", "C2"]);

        // C2 and C4 are both in the preferred back section; numeric order
        // picks C2, and C4 would precede C11 if the partition were front
        let selection = select_capsule(
            &registry,
            &ledger.snapshot(),
            &female(),
            &PreferencePolicy::default(),
            FallbackMode::AllowOther,
        )
        .unwrap();
        assert_eq!(selection.code, code("C2"));
    }

    #[test]
    fn test_falls_back_to_other_partition() {
        let registry = registry();
        let ledger = ledger_with_available(&registry, &["C11", "C12"]);

        let selection = select_capsule(
            &registry,
            &ledger.snapshot(),
            &female(),
            &PreferencePolicy::default(),
            FallbackMode::AllowOther,
        )
        .unwrap();

        assert_eq!(selection.code, code("C11"));
        assert!(selection.fell_back);
    }

    #[test]
    fn test_preferred_only_refuses_fallback() {
        let registry = registry();
        let ledger = ledger_with_available(&registry, &["C11", "C12"]);

        let result = select_capsule(
            &registry,
            &ledger.snapshot(),
            &female(),
            &PreferencePolicy::default(),
            FallbackMode::PreferredOnly,
        );
        assert_eq!(result, Err(SelectionError::NoPreferredSectionAvailable));
    }

    #[test]
    fn test_exhaustion() {
        let registry = registry();
        let ledger = ledger_with_available(&registry, &[]);

        let result = select_capsule(
            &registry,
            &ledger.snapshot(),
            &female(),
            &PreferencePolicy::default(),
            FallbackMode::AllowOther,
        );
        assert_eq!(result, Err(SelectionError::NoCapsuleAtAll));
    }

    #[test]
    fn test_no_preference_takes_lowest_code_overall() {
        let registry = registry();
        let ledger = ledger_with_available(&registry, &["C3", "C9"]);

        let profile = GuestProfile {
            gender: None,
            section: None,
        };
        let selection = select_capsule(
            &registry,
            &ledger.snapshot(),
            &profile,
            &PreferencePolicy::default(),
            FallbackMode::AllowOther,
        )
        .unwrap();
        assert_eq!(selection.code, code("C3"));
    }

    #[test]
    fn test_explicit_section_overrides_gender_table() {
        let registry = registry();
        let ledger = ledger_with_available(&registry, &["C3", "C9"]);

        let profile = GuestProfile {
            gender: Some(Gender::Female),
            section: Some(Section::Front),
        };
        let selection = select_capsule(
            &registry,
            &ledger.snapshot(),
            &profile,
            &PreferencePolicy::default(),
            FallbackMode::AllowOther,
        )
        .unwrap();
        assert_eq!(selection.code, code("C9"));
        assert!(!selection.fell_back);
    }

    #[test]
    fn test_gender_restricted_capsule_excluded() {
        let capsules = vec![
            Capsule {
                code: code("C1"),
                section: Section::Back,
                gender_policy: GenderPolicy::WomenOnly,
            },
            Capsule {
                code: code("C2"),
                section: Section::Back,
                gender_policy: GenderPolicy::Unisex,
            },
        ];
        let registry = CapsuleRegistry::new(capsules).unwrap();
        let ledger = AvailabilityLedger::new(registry.codes());

        let profile = GuestProfile {
            gender: Some(Gender::Male),
            section: None,
        };
        let selection = select_capsule(
            &registry,
            &ledger.snapshot(),
            &profile,
            &PreferencePolicy::none(),
            FallbackMode::AllowOther,
        )
        .unwrap();
        assert_eq!(selection.code, code("C2"));
    }

    #[test]
    fn test_undeclared_gender_limited_to_unisex() {
        let capsules = vec![Capsule {
            code: code("C1"),
            section: Section::Back,
            gender_policy: GenderPolicy::WomenOnly,
        }];
        let registry = CapsuleRegistry::new(capsules).unwrap();
        let ledger = AvailabilityLedger::new(registry.codes());

        let result = select_capsule(
            &registry,
            &ledger.snapshot(),
            &GuestProfile::default(),
            &PreferencePolicy::none(),
            FallbackMode::AllowOther,
        );
        assert_eq!(result, Err(SelectionError::NoCapsuleAtAll));
    }

    #[rstest]
    #[case(&["C1", "C4", "C11", "C12"], "C1")]
    #[case(&["C4", "C11", "C12"], "C4")]
    #[case(&["C11", "C12"], "C11")]
    #[case(&["C12"], "C12")]
    fn test_fill_order_as_back_section_drains(
        #[case] available: &[&str],
        #[case] expected: &str,
    ) {
        let registry = registry();
        let ledger = ledger_with_available(&registry, available);

        let selection = select_capsule(
            &registry,
            &ledger.snapshot(),
            &female(),
            &PreferencePolicy::default(),
            FallbackMode::AllowOther,
        )
        .unwrap();
        assert_eq!(selection.code, code(expected));
    }

    #[test]
    fn test_selection_is_deterministic_and_pure() {
        let registry = registry();
        let ledger = ledger_with_available(&registry, &["C2", "C5", "C9"]);
        let snapshot = ledger.snapshot();

        let first = select_capsule(
            &registry,
            &snapshot,
            &female(),
            &PreferencePolicy::default(),
            FallbackMode::AllowOther,
        )
        .unwrap();
        for _ in 0..10 {
            let again = select_capsule(
                &registry,
                &snapshot,
                &female(),
                &PreferencePolicy::default(),
                FallbackMode::AllowOther,
            )
            .unwrap();
            assert_eq!(again, first);
        }

        // Selection mutated nothing
        assert_eq!(
            ledger.status_of(first.code).unwrap(),
            AvailabilityStatus::Available
        );
    }

    #[test]
    fn test_selection_ignores_occupied_and_cleaning() {
        let registry = registry();
        let ledger = AvailabilityLedger::new(registry.codes());
        ledger.try_occupy(code("C1"), GuestId::new()).unwrap();
        ledger.try_occupy(code("C2"), GuestId::new()).unwrap();
        ledger.release(code("C2"), PostCheckout::NeedsCleaning).unwrap();

        let selection = select_capsule(
            &registry,
            &ledger.snapshot(),
            &female(),
            &PreferencePolicy::default(),
            FallbackMode::AllowOther,
        )
        .unwrap();
        assert_eq!(selection.code, code("C3"));
    }
}
