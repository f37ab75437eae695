//! Typed errors for the privacy filter.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can tell a
//! request that must be blocked apart from one that is safe to retry.

use thiserror::Error;

/// Boxed error raised by a span detector.
pub type DetectorFailure = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for sanitize / desanitize operations.
#[derive(Debug, Error)]
pub enum AegisError {
    /// Entity detection failed; the text was not scanned
    #[error("scan failed: {0}")]
    Scan(#[from] ScanError),

    /// Vault storage failed
    #[error("vault error: {0}")]
    Vault(#[from] VaultError),

    /// Requester may not touch the session
    #[error("authorization error: {0}")]
    Authorization(#[from] AuthError),

    /// Caller bug: bad input that will never succeed on retry
    #[error("contract violation: {0}")]
    Contract(#[from] ContractViolation),
}

impl AegisError {
    /// Whether repeating the same call could succeed. The text must not be
    /// forwarded either way.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AegisError::Vault(VaultError::LockPoisoned)
                | AegisError::Scan(ScanError::Detection(_))
        )
    }

    /// Terminal failures: the request has to be rejected outright.
    pub fn must_block(&self) -> bool {
        !self.is_retryable()
    }
}

/// Errors raised at the span-detector boundary.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The detector raised while analysing text
    #[error("scan operation failed: {0}")]
    Detection(#[source] DetectorFailure),

    /// The detector could not be constructed
    #[error("scanner initialization failed: {0}")]
    Initialization(String),
}

/// Storage errors from a [`crate::vault::Vault`].
#[derive(Debug, Error)]
pub enum VaultError {
    /// Operation attempted without an identity
    #[error("user context is required for vault operations")]
    MissingContext,

    /// A writer panicked while holding the storage lock
    #[error("vault storage lock poisoned")]
    LockPoisoned,
}

/// Authorization failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Requester is not the owner of the session and lacks the admin permission
    #[error("{subject} may not {capability} for session {session_id}")]
    NotOwner {
        subject: String,
        capability: &'static str,
        session_id: String,
    },
}

/// Programmer errors: invalid arguments that no retry can fix.
#[derive(Debug, Error, PartialEq)]
pub enum ContractViolation {
    /// Suffix counters are 0-based
    #[error("suffix index must be non-negative, got {0}")]
    NegativeSuffixIndex(i64),

    /// Span lies outside the text
    #[error("span [{start}, {end}) out of bounds for text of length {len}")]
    SpanOutOfBounds {
        start: usize,
        end: usize,
        len: usize,
    },

    /// Span offsets split a UTF-8 character
    #[error("span [{start}, {end}) does not fall on character boundaries")]
    SpanNotCharBoundary { start: usize, end: usize },

    /// Token does not match `[PREFIX(_SUFFIX)?]`
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Confidence threshold outside [0, 1]
    #[error("confidence score must be within [0, 1], got {0}")]
    InvalidConfidence(f64),

    /// Identity context is empty
    #[error("user context is required")]
    MissingIdentity,
}

/// Result type alias for facade, masking and re-identification.
pub type AegisResult<T> = std::result::Result<T, AegisError>;

/// Result type alias for scanning.
pub type ScanResult<T> = std::result::Result<T, ScanError>;

/// Result type alias for vault operations.
pub type VaultResult<T> = std::result::Result<T, VaultError>;
