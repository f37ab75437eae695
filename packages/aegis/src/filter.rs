//! The `Aegis` facade: scan + mask on the way out, re-identify on the way back.

use std::sync::Arc;

use crate::auth::{Actor, AuthSettings, Capability, UserContext};
use crate::config::{Config, ReidentifyFailure};
use crate::error::AegisResult;
use crate::masking::{MaskOutput, MaskingEngine};
use crate::reidentify::Reidentifier;
use crate::scanner::{Scanner, SpanDetector};
use crate::types::Policy;
use crate::vault::{MemoryVault, Vault};

const CREDENTIAL_ENTITY: &str = "SECRET_KEY";

/// Privacy filter between an application and an LLM endpoint.
///
/// Every operation fails closed: when `sanitize` returns an error the text
/// must not be forwarded.
pub struct Aegis {
    scanner: Scanner,
    masking: MaskingEngine,
    reidentifier: Reidentifier,
    vault: Arc<dyn Vault>,
    auth: AuthSettings,
    reidentify_failure: ReidentifyFailure,
}

impl Aegis {
    /// Filter with default settings over the given detector and vault.
    pub fn new(detector: Arc<dyn SpanDetector>, vault: Arc<dyn Vault>) -> Self {
        Self::assemble(detector, vault, &Config::default())
    }

    /// Filter with an in-memory vault sized and timed from `config`.
    pub fn from_config(config: &Config, detector: Arc<dyn SpanDetector>) -> Self {
        let vault = Arc::new(MemoryVault::new(config.vault_ttl, config.vault_max_size));
        Self::assemble(detector, vault, config)
    }

    /// Filter over a caller-supplied vault, honouring the rest of `config`.
    pub fn with_vault(
        config: &Config,
        detector: Arc<dyn SpanDetector>,
        vault: Arc<dyn Vault>,
    ) -> Self {
        Self::assemble(detector, vault, config)
    }

    fn assemble(detector: Arc<dyn SpanDetector>, vault: Arc<dyn Vault>, config: &Config) -> Self {
        let auth = AuthSettings::new(config.admin_permission.clone());
        Self {
            scanner: Scanner::new(detector),
            masking: MaskingEngine::new(vault.clone())
                .with_auth(auth.clone())
                .with_mapping_ttl(config.mapping_ttl),
            reidentifier: Reidentifier::new(vault.clone()).with_auth(auth.clone()),
            vault,
            auth,
            reidentify_failure: config.reidentify_failure,
        }
    }

    /// Scan and redact `text`.
    ///
    /// A fresh session id is generated when `session_id` is `None`; it is
    /// returned as `mapping.session_id`.
    pub fn sanitize(
        &self,
        text: &str,
        context: &UserContext,
        session_id: Option<&str>,
        policy: Option<&Policy>,
    ) -> AegisResult<MaskOutput> {
        let session_id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let default_policy;
        let policy = match policy {
            Some(policy) => policy,
            None => {
                default_policy = Policy::default();
                &default_policy
            }
        };

        let result = self.sanitize_inner(text, context, &session_id, policy);
        if let Err(e) = &result {
            tracing::error!(session_id = %session_id, error = %e, "Sanitization failed");
        }
        result
    }

    fn sanitize_inner(
        &self,
        text: &str,
        context: &UserContext,
        session_id: &str,
        policy: &Policy,
    ) -> AegisResult<MaskOutput> {
        let spans = self.scanner.scan(text, policy, context)?;

        if spans.iter().any(|s| s.entity_type == CREDENTIAL_ENTITY) {
            // Never include the key itself
            tracing::warn!(session_id = %session_id, "Credential detected in outbound text");
        }

        let output = self.masking.mask(text, &spans, policy, session_id, context)?;

        tracing::info!(
            session_id = %session_id,
            entity_count = spans.len(),
            mode = policy.mode.as_str(),
            "Sanitized text"
        );

        Ok(output)
    }

    /// Restore real values into `text` for `context`.
    ///
    /// Access is decided from the requester's identity: the session owner
    /// and holders of the admin permission may reveal. Under
    /// [`ReidentifyFailure::Degrade`] any failure yields the tokenized input
    /// instead of an error.
    pub fn desanitize(
        &self,
        text: &str,
        session_id: &str,
        context: &UserContext,
    ) -> AegisResult<String> {
        match self.reidentifier.reidentify(text, session_id, context, true) {
            Ok(restored) => {
                tracing::info!(session_id = %session_id, "Desanitized text");
                Ok(restored)
            }
            Err(e) => match self.reidentify_failure {
                ReidentifyFailure::Propagate => {
                    tracing::error!(session_id = %session_id, error = %e, "Desanitization failed");
                    Err(e)
                }
                ReidentifyFailure::Degrade => {
                    tracing::warn!(
                        session_id = %session_id,
                        error = %e,
                        "Desanitization failed, returning tokenized text"
                    );
                    Ok(text.to_string())
                }
            },
        }
    }

    /// Delete a session map now instead of waiting for expiry.
    pub fn forget(&self, session_id: &str, context: &UserContext) -> AegisResult<()> {
        context.require()?;
        if let Some(mapping) = self.vault.get_map(session_id, context)? {
            Actor::new(context)
                .can(Capability::ForgetSession)
                .check(&mapping, &self.auth)?;
            self.vault.delete_map(session_id, context)?;
            tracing::info!(session_id = %session_id, "Session forgotten");
        }
        Ok(())
    }
}
