use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::ContractViolation;

/// Recall-biased default: redact more rather than leak more.
pub const DEFAULT_CONFIDENCE_SCORE: f64 = 0.40;

/// How a detected span is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedactionMode {
    /// Generic, irreversible token: `[PATIENT]`
    Mask,
    /// Unique, reversible token stored in the vault: `[PATIENT_A]`
    #[default]
    Replace,
    /// Deterministic fake value of the same kind: `Jane Doe`
    Synthetic,
    /// Hex SHA-256 of the entity text
    Hash,
    /// Any mode name this build does not know; treated as MASK
    #[serde(other)]
    Unrecognized,
}

impl RedactionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mask => "MASK",
            Self::Replace => "REPLACE",
            Self::Synthetic => "SYNTHETIC",
            Self::Hash => "HASH",
            Self::Unrecognized => "UNRECOGNIZED",
        }
    }
}

impl std::str::FromStr for RedactionMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "MASK" => Self::Mask,
            "REPLACE" => Self::Replace,
            "SYNTHETIC" => Self::Synthetic,
            "HASH" => Self::Hash,
            _ => Self::Unrecognized,
        })
    }
}

/// Per-request redaction policy. Immutable once built; pass it explicitly.
///
/// ```
/// use aegis::{Policy, RedactionMode};
///
/// let policy = Policy::builder()
///     .mode(RedactionMode::Mask)
///     .allow_list(vec!["Acme".to_string()])
///     .build();
/// assert_eq!(policy.confidence_score, 0.40);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[serde(default)]
pub struct Policy {
    /// Literal strings never redacted, even when detected
    #[builder(default)]
    pub allow_list: Vec<String>,

    /// Entity type labels the detector should report
    #[builder(default = default_entity_types())]
    pub entity_types: Vec<String>,

    #[builder(default)]
    pub mode: RedactionMode,

    /// Minimum detector score, in [0, 1]
    #[builder(default = DEFAULT_CONFIDENCE_SCORE)]
    pub confidence_score: f64,
}

impl Default for Policy {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Policy {
    /// Reject thresholds outside [0, 1] (including NaN).
    pub fn validate(&self) -> Result<(), ContractViolation> {
        if !(0.0..=1.0).contains(&self.confidence_score) {
            return Err(ContractViolation::InvalidConfidence(self.confidence_score));
        }
        Ok(())
    }

    pub fn allows(&self, entity_text: &str) -> bool {
        self.allow_list.iter().any(|term| term == entity_text)
    }

    pub fn wants(&self, entity_type: &str) -> bool {
        self.entity_types.iter().any(|t| t == entity_type)
    }
}

fn default_entity_types() -> Vec<String> {
    [
        "PERSON",
        "EMAIL_ADDRESS",
        "PHONE_NUMBER",
        "IP_ADDRESS",
        "DATE_TIME",
        "LOCATION",
        "SECRET_KEY",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
