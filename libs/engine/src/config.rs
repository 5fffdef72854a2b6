//! Engine configuration.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::selector::{FallbackMode, PreferencePolicy};

/// Capsule status after a guest checks out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostCheckout {
    /// Hold for housekeeping before the next guest.
    #[default]
    NeedsCleaning,
    /// Skip the cleaning step and return straight to the pool.
    Available,
}

/// Policy knobs for the engine.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub post_checkout: PostCheckout,
    pub preference: PreferencePolicy,
    pub fallback: FallbackMode,
}

impl EngineConfig {
    /// Reads policy knobs from the environment, falling back to defaults.
    ///
    /// - `PODSTAY_SKIP_CLEANING` — `1`/`true` releases capsules straight to
    ///   `available` on checkout
    /// - `PODSTAY_STRICT_PREFERENCE` — `1`/`true` disables the selector's
    ///   fallback to the non-preferred partition
    pub fn from_env() -> Result<Self> {
        let skip_cleaning = env_flag("PODSTAY_SKIP_CLEANING");
        let strict_preference = env_flag("PODSTAY_STRICT_PREFERENCE");

        Ok(Self {
            post_checkout: if skip_cleaning {
                PostCheckout::Available
            } else {
                PostCheckout::NeedsCleaning
            },
            preference: PreferencePolicy::default(),
            fallback: if strict_preference {
                FallbackMode::PreferredOnly
            } else {
                FallbackMode::AllowOther
            },
        })
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.post_checkout, PostCheckout::NeedsCleaning);
        assert_eq!(config.fallback, FallbackMode::AllowOther);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"post_checkout": "available"}"#).unwrap();
        assert_eq!(config.post_checkout, PostCheckout::Available);
        assert_eq!(config.fallback, FallbackMode::AllowOther);
    }
}
