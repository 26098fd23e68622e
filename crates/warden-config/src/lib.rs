//! Configuration management for Warden
//!
//! Declares the policy-name → rule mapping statically and loads it from
//! multiple sources (highest precedence first):
//! 1. An explicit file passed by the caller
//! 2. Environment variables (WARDEN_* prefix, `__` between nested keys)
//! 3. warden.local.toml (gitignored, local overrides)
//! 4. warden.toml (git-tracked, project config)
//! 5. ~/.config/warden/config.toml (user defaults)
//! 6. Built-in defaults (lowest precedence)
//!
//! ```toml
//! locked = ["legacy_export"]
//!
//! [logging]
//! level = "info"
//!
//! [policies.reports]
//! allow_roles = ["analyst", "admin"]
//! deny_users = ["mallory"]
//! allow_claim = { type = "dept", values = ["finance"] }
//! ```
//!
//! Policy names are table keys; keep them lowercase, since key case is not
//! preserved by every source.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use warden_policy::{Claim, PolicyRule, PolicySet};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::{LOCAL_CONFIG_FILE, PROJECT_CONFIG_FILE, Paths};

/// Main Warden configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Policy names registered without a rule; they deny everyone.
    pub locked: BTreeSet<String>,
    pub logging: LoggingConfig,
    pub policies: BTreeMap<String, PolicyRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Log every enforcement decision.
    pub audit: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            audit: true,
        }
    }
}

impl WardenConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Parse a single TOML file, without layering.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds the policy set declared by this configuration.
    ///
    /// Rule content is never validated. The only error is a name declared
    /// both under `[policies]` and in `locked`, since names are unique.
    pub fn policy_set(&self) -> Result<PolicySet, ConfigError> {
        if let Some(name) = self.locked.iter().find(|n| self.policies.contains_key(*n)) {
            return Err(ConfigError::DuplicatePolicy(name.clone()));
        }

        let rules = self
            .policies
            .iter()
            .map(|(name, rule)| (name.clone(), Some(rule.clone())));
        let locked = self.locked.iter().map(|name| (name.clone(), None));

        Ok(rules.chain(locked).collect())
    }

    /// Starter configuration written by `warden init`
    pub fn sample() -> Self {
        let mut policies = BTreeMap::new();

        policies.insert(
            "reports".to_string(),
            PolicyRule::new()
                .allow_role("analyst")
                .allow_role("admin")
                .deny_role("contractor")
                .require_claim(Claim::new("dept", ["finance", "eng"])),
        );
        policies.insert(
            "admin_panel".to_string(),
            PolicyRule::new()
                .allow_role("admin")
                .deny_user("mallory")
                .also_require_claim(Claim::new("mfa", ["true"])),
        );
        policies.insert("profile".to_string(), PolicyRule::new());

        Self {
            locked: BTreeSet::from(["legacy_export".to_string()]),
            logging: LoggingConfig::default(),
            policies,
        }
    }
}
