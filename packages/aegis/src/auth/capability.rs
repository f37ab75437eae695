/// Things an identity can ask to do with somebody's session.
///
/// Each requires the requester to own the session or hold the configured
/// administrative permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Append new tokens to an existing session map
    ExtendSession,

    /// Restore real values from a session map
    RevealSession,

    /// Delete a session map before it expires
    ForgetSession,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ExtendSession => "extend session",
            Capability::RevealSession => "reveal session",
            Capability::ForgetSession => "forget session",
        }
    }
}
