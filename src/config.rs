//! Configuration for the phase registry.
//!
//! Parsed from TOML text supplied by the caller:
//!
//! ```toml
//! on_duplicate = "replace"
//! ```
//!
//! Every field has a default, so an empty document is a valid configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// What the registry does when a phase name is registered twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep the existing phase and return an error (default)
    #[default]
    Reject,
    /// Swap in the new phase, dropping the old one and its hooks
    Replace,
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicatePolicy::Reject => write!(f, "reject"),
            DuplicatePolicy::Replace => write!(f, "replace"),
        }
    }
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(DuplicatePolicy::Reject),
            "replace" => Ok(DuplicatePolicy::Replace),
            _ => anyhow::bail!(
                "Invalid duplicate policy '{}'. Valid values: reject, replace",
                s
            ),
        }
    }
}

/// Settings for a `PhaseRegistry`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Policy for registering a name that is already taken
    pub on_duplicate: DuplicatePolicy,
}

impl RegistryConfig {
    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse registry configuration")
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize registry configuration")
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.on_duplicate = policy;
        self
    }
}
