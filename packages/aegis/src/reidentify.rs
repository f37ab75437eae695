//! Restores original values into text that carries issued tokens.

use std::sync::Arc;

use crate::auth::{Actor, AuthSettings, Capability, UserContext};
use crate::error::AegisResult;
use crate::types::TokenMapping;
use crate::vault::Vault;

pub struct Reidentifier {
    vault: Arc<dyn Vault>,
    auth: AuthSettings,
}

impl Reidentifier {
    pub fn new(vault: Arc<dyn Vault>) -> Self {
        Self {
            vault,
            auth: AuthSettings::default(),
        }
    }

    pub fn with_auth(mut self, auth: AuthSettings) -> Self {
        self.auth = auth;
        self
    }

    /// Replace issued tokens in `text` with the session's real values.
    ///
    /// Returns `text` unchanged when the session is gone or the caller is not
    /// `authorized`. An authorized caller that is neither the owner nor an
    /// admin gets [`crate::AuthError::NotOwner`]; an upstream flag never
    /// overrides the stored owner. Vault failures propagate.
    pub fn reidentify(
        &self,
        text: &str,
        session_id: &str,
        context: &UserContext,
        authorized: bool,
    ) -> AegisResult<String> {
        if text.is_empty() {
            return Ok(String::new());
        }

        context.require()?;
        let Some(mapping) = self.vault.get_map(session_id, context)? else {
            tracing::debug!(session_id = %session_id, "No token map for session");
            return Ok(text.to_string());
        };

        if !authorized {
            return Ok(text.to_string());
        }

        Actor::new(context)
            .can(Capability::RevealSession)
            .check(&mapping, &self.auth)?;

        Ok(restore(text, &mapping))
    }
}

/// Literal replacement of every token in `mapping`, longest token first.
///
/// Longest-first keeps `[PATIENT_A]` from corrupting `[PATIENT_AA]`. Ties
/// are broken lexicographically so output never depends on map order.
/// Token-shaped text that was never issued is left alone.
pub fn restore(text: &str, mapping: &TokenMapping) -> String {
    let mut entries: Vec<(&str, &str)> = mapping.iter().collect();
    entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

    let mut result = text.to_string();
    for (token, value) in entries {
        if result.contains(token) {
            result = result.replace(token, value);
        }
    }
    result
}
