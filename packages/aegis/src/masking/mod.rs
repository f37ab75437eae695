//! Masking engine: replaces detected spans with tokens and maintains the
//! session's token map.
//!
//! # Redaction modes
//!
//! - `Mask`: generic bracketed token, irreversible (`John` -> `[PATIENT]`)
//! - `Replace`: unique reversible token stored in the vault (`John` -> `[PATIENT_A]`)
//! - `Synthetic`: deterministic fake value (`John` -> `Mary Lopez`)
//! - `Hash`: hex SHA-256 of the entity text
//!
//! Only `Replace` writes entries to the map; the map is saved back on every
//! call regardless.

mod synthetic;

pub use synthetic::synthesize;

use chrono::Duration;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::{Actor, AuthSettings, Capability, UserContext};
use crate::error::AegisResult;
use crate::token;
use crate::types::{resolve_overlaps, DetectedSpan, Policy, RedactionMode, TokenMapping};
use crate::vault::Vault;

/// Lifetime stamped on newly created maps.
pub const DEFAULT_MAPPING_TTL_SECS: i64 = 3600;

/// Redacted text plus the session map after this call.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskOutput {
    pub text: String,
    pub mapping: TokenMapping,
}

/// Map a detector label to the token prefix.
///
/// Labels that normalize to the same prefix share one suffix counter.
/// Unrecognized labels pass through unchanged; MASK and REPLACE both reject a
/// prefix that does not fit the token grammar.
pub fn normalize_entity_type(entity_type: &str) -> &str {
    match entity_type {
        "PERSON" => "PATIENT",
        "DATE_TIME" => "DATE",
        "EMAIL_ADDRESS" => "EMAIL",
        "PHONE_NUMBER" => "PHONE",
        "IP_ADDRESS" => "IP",
        other => other,
    }
}

/// Hex SHA-256 of the entity text (HASH mode).
pub fn hash_value(entity_text: &str) -> String {
    hex::encode(Sha256::digest(entity_text.as_bytes()))
}

pub struct MaskingEngine {
    vault: Arc<dyn Vault>,
    auth: AuthSettings,
    mapping_ttl: Duration,
}

impl MaskingEngine {
    pub fn new(vault: Arc<dyn Vault>) -> Self {
        Self {
            vault,
            auth: AuthSettings::default(),
            mapping_ttl: Duration::seconds(DEFAULT_MAPPING_TTL_SECS),
        }
    }

    pub fn with_auth(mut self, auth: AuthSettings) -> Self {
        self.auth = auth;
        self
    }

    /// Set the `expires_at` horizon for maps created by this engine.
    pub fn with_mapping_ttl(mut self, ttl: Duration) -> Self {
        self.mapping_ttl = ttl;
        self
    }

    /// Redact `text` according to `spans` and `policy`, persisting the
    /// session map.
    ///
    /// Spans outside the text or splitting a character are a contract
    /// violation from the detector and fail the whole call before anything
    /// is written. Loading an existing map owned by another identity
    /// requires the admin permission.
    pub fn mask(
        &self,
        text: &str,
        spans: &[DetectedSpan],
        policy: &Policy,
        session_id: &str,
        context: &UserContext,
    ) -> AegisResult<MaskOutput> {
        context.require()?;
        for span in spans {
            span.validate(text)?;
        }

        let mut mapping = match self.vault.get_map(session_id, context)? {
            Some(existing) => {
                Actor::new(context)
                    .can(Capability::ExtendSession)
                    .check(&existing, &self.auth)?;
                existing
            }
            None => TokenMapping::new(session_id, context.subject.as_str(), self.mapping_ttl),
        };

        let replacements = self.plan_replacements(text, spans, policy, &mut mapping)?;
        let masked = apply_replacements(text, replacements);

        self.vault.save_map(mapping.clone(), context)?;

        Ok(MaskOutput {
            text: masked,
            mapping,
        })
    }

    /// Pass 1: decide the replacement for every kept span, in order of
    /// appearance, so REPLACE suffixes are assigned left to right.
    fn plan_replacements(
        &self,
        text: &str,
        spans: &[DetectedSpan],
        policy: &Policy,
        mapping: &mut TokenMapping,
    ) -> AegisResult<Vec<(usize, usize, String)>> {
        let mut real_to_token: HashMap<String, String> = mapping
            .reverse_lookup()
            .into_iter()
            .map(|(value, token)| (value.to_string(), token.to_string()))
            .collect();

        let mut replacements = Vec::new();
        for span in resolve_overlaps(spans) {
            let entity_text = span.slice(text);
            if policy.allows(entity_text) {
                continue;
            }

            let prefix = normalize_entity_type(&span.entity_type);
            let replacement = match policy.mode {
                RedactionMode::Replace => match real_to_token.get(entity_text) {
                    Some(existing) => existing.clone(),
                    None => {
                        let issued = next_token(mapping, prefix)?;
                        mapping.insert(issued.clone(), entity_text)?;
                        real_to_token.insert(entity_text.to_string(), issued.clone());
                        issued
                    }
                },
                RedactionMode::Synthetic => synthesize(entity_text, &span.entity_type),
                RedactionMode::Hash => hash_value(entity_text),
                RedactionMode::Mask | RedactionMode::Unrecognized => {
                    let masked = token::bare(prefix);
                    token::validate(&masked)?;
                    masked
                }
            };

            replacements.push((span.start, span.end, replacement));
        }

        Ok(replacements)
    }
}

/// Allocate the next `[PREFIX_SUFFIX]` token for `prefix`.
fn next_token(mapping: &TokenMapping, prefix: &str) -> AegisResult<String> {
    let mut index = mapping.count_in_namespace(prefix) as i64;
    loop {
        let candidate = token::numbered(prefix, &token::suffix(index)?);
        if !mapping.contains_token(&candidate) {
            return Ok(candidate);
        }
        index += 1;
    }
}

/// Pass 2: substitute from the highest start offset down so earlier offsets
/// stay valid.
fn apply_replacements(text: &str, mut replacements: Vec<(usize, usize, String)>) -> String {
    replacements.sort_by(|a, b| b.0.cmp(&a.0));

    let mut result = text.to_string();
    for (start, end, replacement) in replacements {
        result.replace_range(start..end, &replacement);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AegisError, AuthError, ContractViolation};
    use crate::vault::MemoryVault;

    fn engine() -> (MaskingEngine, Arc<MemoryVault>) {
        let vault = Arc::new(MemoryVault::default());
        (MaskingEngine::new(vault.clone()), vault)
    }

    fn ctx() -> UserContext {
        UserContext::new("user-1")
    }

    fn person(start: usize, end: usize) -> DetectedSpan {
        DetectedSpan::new("PERSON", start, end, 0.9)
    }

    fn policy(mode: RedactionMode) -> Policy {
        Policy::builder().mode(mode).build()
    }

    #[test]
    fn test_replace_consistency() {
        let (engine, _) = engine();
        let text = "John met John.";
        let spans = [person(0, 4), person(9, 13)];
        let policy = Policy::default();
        let out = engine.mask(text, &spans, &policy, "s1", &ctx()).unwrap();

        assert_eq!(out.text, "[PATIENT_A] met [PATIENT_A].");
        assert_eq!(out.mapping.len(), 1);
        assert_eq!(out.mapping.get("[PATIENT_A]"), Some("John"));
    }

    #[test]
    fn test_replace_distinctness_in_order_of_appearance() {
        let (engine, _) = engine();
        // Spans arrive out of order
        let spans = [person(9, 13), person(0, 4)];
        let policy = Policy::default();
        let out = engine
            .mask("John met Jane.", &spans, &policy, "s1", &ctx())
            .unwrap();

        assert_eq!(out.text, "[PATIENT_A] met [PATIENT_B].");
        assert_eq!(out.mapping.get("[PATIENT_A]"), Some("John"));
        assert_eq!(out.mapping.get("[PATIENT_B]"), Some("Jane"));
    }

    #[test]
    fn test_allow_list_exemption() {
        let (engine, _) = engine();
        let policy = Policy::builder()
            .allow_list(vec!["John".to_string()])
            .build();
        let spans = [person(0, 4), person(9, 13)];
        let out = engine
            .mask("John met Jane.", &spans, &policy, "s1", &ctx())
            .unwrap();

        assert_eq!(out.text, "John met [PATIENT_A].");
        assert_eq!(out.mapping.len(), 1);
    }

    #[test]
    fn test_mask_mode_is_irreversible() {
        let (engine, vault) = engine();
        let text = "John, email: john@example.com";
        let spans = [
            person(0, 4),
            DetectedSpan::new("EMAIL_ADDRESS", 13, 29, 0.9),
        ];
        let policy = policy(RedactionMode::Mask);
        let out = engine.mask(text, &spans, &policy, "s1", &ctx()).unwrap();

        assert_eq!(out.text, "[PATIENT], email: [EMAIL]");
        assert!(out.mapping.is_empty());
        assert!(vault.get_map("s1", &ctx()).unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_unrecognized_mode_falls_back_to_mask() {
        let (engine, _) = engine();
        let policy = policy(RedactionMode::Unrecognized);
        let out = engine
            .mask("John", &[person(0, 4)], &policy, "s1", &ctx())
            .unwrap();

        assert_eq!(out.text, "[PATIENT]");
        assert!(out.mapping.is_empty());
    }

    #[test]
    fn test_mask_mode_rejects_label_outside_token_grammar() {
        let (engine, vault) = engine();
        let spans = [DetectedSpan::new("Organization", 0, 4, 0.9)];
        let policy = policy(RedactionMode::Mask);
        let err = engine
            .mask("Acme", &spans, &policy, "s1", &ctx())
            .unwrap_err();

        assert!(matches!(
            err,
            AegisError::Contract(ContractViolation::MalformedToken(_))
        ));
        assert!(vault.get_map("s1", &ctx()).unwrap().is_none());
    }

    #[test]
    fn test_hash_mode_is_session_independent() {
        let (engine, vault) = engine();
        let policy = policy(RedactionMode::Hash);
        let spans = [person(0, 4)];
        let text = "John";

        let a = engine.mask(text, &spans, &policy, "s1", &ctx()).unwrap();
        let b = engine.mask(text, &spans, &policy, "s2", &ctx()).unwrap();

        assert_eq!(a.text, b.text);
        assert_eq!(a.text, hash_value("John"));
        assert_eq!(a.text.len(), 64);
        assert!(a.mapping.is_empty());
        assert!(vault.get_map("s1", &ctx()).unwrap().unwrap().is_empty());
        assert!(vault.get_map("s2", &ctx()).unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_hash_known_vector() {
        assert_eq!(
            hash_value("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_synthetic_mode_is_session_independent() {
        let (engine, _) = engine();
        let policy = policy(RedactionMode::Synthetic);
        let spans = [DetectedSpan::new("EMAIL_ADDRESS", 8, 24, 0.9)];
        let text = "Contact test@example.com now";

        let a = engine.mask(text, &spans, &policy, "s1", &ctx()).unwrap();
        let b = engine.mask(text, &spans, &policy, "s2", &ctx()).unwrap();

        assert_eq!(a.text, b.text);
        assert!(a.text.contains('@'));
        assert!(!a.text.contains("test@example.com"));
        assert!(a.mapping.is_empty());
    }

    #[test]
    fn test_namespace_shared_by_normalized_types() {
        let (engine, _) = engine();
        let text = "Date 1: 2023-01-01. Date 2: January.";
        let spans = vec![
            DetectedSpan::new("DATE_TIME", 8, 18, 0.9),
            DetectedSpan::new("DATE", 28, 35, 0.9),
        ];
        let policy = Policy::default();
        let out = engine.mask(text, &spans, &policy, "s1", &ctx()).unwrap();

        assert_eq!(out.text, "Date 1: [DATE_A]. Date 2: [DATE_B].");
        assert_eq!(out.mapping.get("[DATE_B]"), Some("January"));
    }

    #[test]
    fn test_unknown_entity_type_passes_through() {
        let (engine, _) = engine();
        let text = "Google is an organization.";
        let spans = [DetectedSpan::new("ORGANIZATION", 0, 6, 0.9)];
        let policy = Policy::default();
        let out = engine.mask(text, &spans, &policy, "s1", &ctx()).unwrap();

        assert_eq!(out.text, "[ORGANIZATION_A] is an organization.");
        assert_eq!(out.mapping.get("[ORGANIZATION_A]"), Some("Google"));
    }

    #[test]
    fn test_lowercase_label_violates_token_grammar() {
        let (engine, vault) = engine();
        let spans = [DetectedSpan::new("custom", 0, 4, 0.9)];
        let policy = Policy::default();
        let err = engine
            .mask("John", &spans, &policy, "s1", &ctx())
            .unwrap_err();

        assert!(matches!(
            err,
            AegisError::Contract(ContractViolation::MalformedToken(_))
        ));
        assert!(vault.get_map("s1", &ctx()).unwrap().is_none());
    }

    #[test]
    fn test_many_tokens_roll_into_double_letters() {
        let (engine, _) = engine();
        let names: Vec<String> = (0..30).map(|i| format!("Name{:02}", i)).collect();
        let text = names.join(" ");
        let spans: Vec<DetectedSpan> = (0..30).map(|i| person(i * 7, i * 7 + 6)).collect();
        let policy = Policy::default();

        let out = engine.mask(&text, &spans, &policy, "s1", &ctx()).unwrap();

        assert_eq!(out.mapping.len(), 30);
        assert!(out.text.starts_with("[PATIENT_A] [PATIENT_B]"));
        assert!(out.text.ends_with("[PATIENT_AD]"));
    }

    #[test]
    fn test_state_persists_across_calls() {
        let (engine, vault) = engine();
        let policy = Policy::default();
        engine
            .mask("John", &[person(0, 4)], &policy, "s1", &ctx())
            .unwrap();

        let spans = [person(0, 4), person(9, 13)];
        let out = engine
            .mask("Jane and John", &spans, &policy, "s1", &ctx())
            .unwrap();

        assert_eq!(out.text, "[PATIENT_B] and [PATIENT_A]");
        assert_eq!(vault.get_map("s1", &ctx()).unwrap().unwrap().len(), 2);
    }

    #[test]
    fn test_map_saved_even_without_entities() {
        let (engine, vault) = engine();
        let policy = Policy::default();
        let out = engine
            .mask("nothing here", &[], &policy, "s1", &ctx())
            .unwrap();

        assert_eq!(out.text, "nothing here");
        let stored = vault.get_map("s1", &ctx()).unwrap().unwrap();
        assert_eq!(stored.owner_id, "user-1");
    }

    #[test]
    fn test_overlapping_spans_resolved() {
        let (engine, _) = engine();
        let text = "Seen on 01/01/2025.";
        let spans = vec![
            DetectedSpan::new("DATE_TIME", 8, 18, 0.9),
            DetectedSpan::new("DATE_TIME", 5, 18, 0.5),
        ];
        let policy = Policy::default();
        let out = engine.mask(text, &spans, &policy, "s1", &ctx()).unwrap();

        assert_eq!(out.text, "Seen [DATE_A].");
        assert_eq!(out.mapping.get("[DATE_A]"), Some("on 01/01/2025"));
    }

    #[test]
    fn test_out_of_bounds_span_is_fatal() {
        let (engine, vault) = engine();
        let policy = Policy::default();
        let err = engine
            .mask("John", &[person(0, 10)], &policy, "s1", &ctx())
            .unwrap_err();

        assert!(matches!(
            err,
            AegisError::Contract(ContractViolation::SpanOutOfBounds { .. })
        ));
        assert!(vault.get_map("s1", &ctx()).unwrap().is_none());
    }

    #[test]
    fn test_multibyte_text() {
        let (engine, _) = engine();
        let text = "Pró ABC-123 done";
        let spans = [DetectedSpan::new("PROTOCOL_ID", 5, 12, 0.9)];
        let policy = Policy::default();
        let out = engine.mask(text, &spans, &policy, "s1", &ctx()).unwrap();

        assert_eq!(out.text, "Pró [PROTOCOL_ID_A] done");
    }

    #[test]
    fn test_foreign_session_rejected() {
        let (engine, _) = engine();
        let policy = Policy::default();
        engine
            .mask("John", &[person(0, 4)], &policy, "s1", &ctx())
            .unwrap();

        let attacker = UserContext::new("attacker");
        let err = engine
            .mask("John", &[person(0, 4)], &policy, "s1", &attacker)
            .unwrap_err();

        assert!(matches!(
            err,
            AegisError::Authorization(AuthError::NotOwner { .. })
        ));
    }

    #[test]
    fn test_missing_identity_rejected() {
        let (engine, _) = engine();
        let policy = Policy::default();
        let anonymous = UserContext::new("");
        let err = engine
            .mask("text", &[], &policy, "s1", &anonymous)
            .unwrap_err();

        assert!(matches!(
            err,
            AegisError::Contract(ContractViolation::MissingIdentity)
        ));
    }

    #[test]
    fn test_normalize_entity_type() {
        assert_eq!(normalize_entity_type("PERSON"), "PATIENT");
        assert_eq!(normalize_entity_type("DATE_TIME"), "DATE");
        assert_eq!(normalize_entity_type("EMAIL_ADDRESS"), "EMAIL");
        assert_eq!(normalize_entity_type("PHONE_NUMBER"), "PHONE");
        assert_eq!(normalize_entity_type("IP_ADDRESS"), "IP");
        assert_eq!(normalize_entity_type("SECRET_KEY"), "SECRET_KEY");
        assert_eq!(normalize_entity_type("LOCATION"), "LOCATION");
        assert_eq!(normalize_entity_type("MRN"), "MRN");
    }
}
