use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::num::NonZeroUsize;
use std::time::Duration;

use crate::auth::DEFAULT_ADMIN_PERMISSION;
use crate::masking::DEFAULT_MAPPING_TTL_SECS;
use crate::vault::{DEFAULT_MAX_SIZE, DEFAULT_TTL};

/// What `desanitize` does when the session map cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReidentifyFailure {
    /// Return the error to the caller (fail closed)
    #[default]
    Propagate,
    /// Log and return the tokenized text
    Degrade,
}

impl std::str::FromStr for ReidentifyFailure {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "propagate" => Ok(Self::Propagate),
            "degrade" => Ok(Self::Degrade),
            other => bail!("unknown reidentify failure mode: {other}"),
        }
    }
}

/// Filter configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub vault_ttl: Duration,
    pub vault_max_size: NonZeroUsize,
    /// Horizon stamped into `expires_at` of new maps
    pub mapping_ttl: chrono::Duration,
    pub admin_permission: String,
    pub reidentify_failure: ReidentifyFailure,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vault_ttl: DEFAULT_TTL,
            vault_max_size: NonZeroUsize::new(DEFAULT_MAX_SIZE).unwrap_or(NonZeroUsize::MIN),
            mapping_ttl: chrono::Duration::seconds(DEFAULT_MAPPING_TTL_SECS),
            admin_permission: DEFAULT_ADMIN_PERMISSION.to_string(),
            reidentify_failure: ReidentifyFailure::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let vault_ttl = match lookup("AEGIS_VAULT_TTL_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .context("AEGIS_VAULT_TTL_SECS must be a valid number")?,
            ),
            None => defaults.vault_ttl,
        };

        let vault_max_size = match lookup("AEGIS_VAULT_MAX_SIZE") {
            Some(raw) => raw
                .parse::<NonZeroUsize>()
                .context("AEGIS_VAULT_MAX_SIZE must be a positive number")?,
            None => defaults.vault_max_size,
        };

        let mapping_ttl = match lookup("AEGIS_MAPPING_TTL_SECS") {
            Some(raw) => chrono::Duration::seconds(
                raw.parse::<i64>()
                    .context("AEGIS_MAPPING_TTL_SECS must be a valid number")?,
            ),
            None => defaults.mapping_ttl,
        };

        let admin_permission = lookup("AEGIS_ADMIN_PERMISSION")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(defaults.admin_permission);

        let reidentify_failure = match lookup("AEGIS_REIDENTIFY_FAILURE") {
            Some(raw) => raw
                .parse::<ReidentifyFailure>()
                .context("AEGIS_REIDENTIFY_FAILURE must be 'propagate' or 'degrade'")?,
            None => defaults.reidentify_failure,
        };

        Ok(Self {
            vault_ttl,
            vault_max_size,
            mapping_ttl,
            admin_permission,
            reidentify_failure,
        })
    }
}
