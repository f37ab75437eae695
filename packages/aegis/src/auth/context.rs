use serde::{Deserialize, Serialize};

use crate::error::ContractViolation;

/// The identity a request runs as. Built by the integration layer after
/// authentication; the core only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    /// Stable subject identifier (becomes `owner_id` on new sessions)
    pub subject: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl UserContext {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            permissions: Vec::new(),
        }
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// A context with a blank subject is as good as none.
    pub fn require(&self) -> Result<&Self, ContractViolation> {
        if self.subject.trim().is_empty() {
            return Err(ContractViolation::MissingIdentity);
        }
        Ok(self)
    }
}
