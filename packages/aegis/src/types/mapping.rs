use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ContractViolation;
use crate::token;

/// Token -> real value map for one session, bound to the identity that created it.
///
/// Entries are only ever appended. Keys always match the token grammar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMapping {
    pub session_id: String,
    pub owner_id: String,
    mappings: IndexMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TokenMapping {
    pub fn new(session_id: impl Into<String>, owner_id: impl Into<String>, ttl: Duration) -> Self {
        let created_at = Utc::now();
        Self {
            session_id: session_id.into(),
            owner_id: owner_id.into(),
            mappings: IndexMap::new(),
            created_at,
            expires_at: created_at + ttl,
        }
    }

    /// Add `token -> value`. The token must match the token grammar.
    pub fn insert(
        &mut self,
        token: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ContractViolation> {
        let token = token.into();
        token::validate(&token)?;
        self.mappings.insert(token, value.into());
        Ok(())
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.mappings.get(token).map(String::as_str)
    }

    pub fn contains_token(&self, token: &str) -> bool {
        self.mappings.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mappings.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.mappings.keys().map(String::as_str)
    }

    /// Number of issued tokens whose key starts with `[PREFIX_`.
    pub fn count_in_namespace(&self, prefix: &str) -> usize {
        let namespace = token::namespace(prefix);
        self.mappings
            .keys()
            .filter(|t| t.starts_with(&namespace))
            .count()
    }

    /// Real value -> token. Later entries win if a value repeats.
    pub fn reverse_lookup(&self) -> HashMap<&str, &str> {
        self.mappings
            .iter()
            .map(|(token, value)| (value.as_str(), token.as_str()))
            .collect()
    }

    pub fn is_owned_by(&self, subject: &str) -> bool {
        self.owner_id == subject
    }
}
