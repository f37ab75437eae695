//! Aegis - privacy filter between applications and LLM endpoints
//!
//! Outbound text is scanned for sensitive entities and redacted; reversible
//! tokens are kept in a short-lived, identity-bound vault so the response
//! can be re-identified for the same user.
//!
//! # Architecture
//!
//! ```text
//! text ──► Scanner ──► MaskingEngine ──► redacted text ──► LLM
//!            │              │
//!      SpanDetector       Vault (TTL + LRU, owner-bound maps)
//!                           │
//! reply ◄── Reidentifier ◄──┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use aegis::{Aegis, MemoryVault, UserContext};
//! use aegis::testing::TermDetector;
//!
//! let detector = TermDetector::new().with_term("John Doe", "PERSON");
//! let aegis = Aegis::new(Arc::new(detector), Arc::new(MemoryVault::default()));
//! let user = UserContext::new("user-1");
//!
//! let out = aegis.sanitize("Call John Doe", &user, Some("s1"), None)?;
//! assert_eq!(out.text, "Call [PATIENT_A]");
//!
//! let reply = aegis.desanitize("[PATIENT_A] called back", "s1", &user)?;
//! assert_eq!(reply, "John Doe called back");
//! # Ok::<(), aegis::AegisError>(())
//! ```

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod filter;
pub mod masking;
pub mod reidentify;
pub mod scanner;
pub mod testing;
pub mod token;
pub mod types;
pub mod vault;

pub use auth::{Actor, AuthSettings, Capability, UserContext};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{Config, ReidentifyFailure};
pub use error::{
    AegisError, AegisResult, AuthError, ContractViolation, DetectorFailure, ScanError, ScanResult,
    VaultError, VaultResult,
};
pub use filter::Aegis;
pub use masking::{MaskOutput, MaskingEngine};
pub use reidentify::Reidentifier;
pub use scanner::{shared_detector, DetectionRequest, PatternDetector, Scanner, SpanDetector};
pub use types::{DetectedSpan, Policy, RedactionMode, TokenMapping};
pub use vault::{MemoryVault, TtlCache, Vault};
