use super::{Capability, UserContext};
use crate::error::AuthError;
use crate::types::TokenMapping;

/// Default permission that may reveal or extend any session.
pub const DEFAULT_ADMIN_PERMISSION: &str = "Compliance_Admin";

/// Entry point for authorization checks
///
/// Usage:
/// ```
/// use aegis::auth::{Actor, AuthSettings, Capability, UserContext};
/// use aegis::TokenMapping;
///
/// let settings = AuthSettings::default();
/// let mapping = TokenMapping::new("s1", "owner-1", chrono::Duration::hours(1));
///
/// let owner = UserContext::new("owner-1");
/// assert!(Actor::new(&owner)
///     .can(Capability::RevealSession)
///     .check(&mapping, &settings)
///     .is_ok());
/// ```
pub struct Actor<'a> {
    context: &'a UserContext,
}

impl<'a> Actor<'a> {
    pub fn new(context: &'a UserContext) -> Self {
        Self { context }
    }

    /// Specify what capability the actor needs
    pub fn can(self, capability: Capability) -> CapabilityBuilder<'a> {
        CapabilityBuilder {
            context: self.context,
            capability,
        }
    }
}

/// Builder after specifying capability
pub struct CapabilityBuilder<'a> {
    context: &'a UserContext,
    capability: Capability,
}

impl CapabilityBuilder<'_> {
    /// Perform the authorization check against a stored session map
    pub fn check<D>(self, mapping: &TokenMapping, deps: &D) -> Result<(), AuthError>
    where
        D: HasAuthContext,
    {
        check_session_access(self.context, self.capability, mapping, deps)
    }
}

/// Trait for dependencies that can perform auth checks
pub trait HasAuthContext: Send + Sync {
    fn admin_permission(&self) -> &str;
}

/// Authorization settings carried by the engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub admin_permission: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            admin_permission: DEFAULT_ADMIN_PERMISSION.to_string(),
        }
    }
}

impl AuthSettings {
    pub fn new(admin_permission: impl Into<String>) -> Self {
        Self {
            admin_permission: admin_permission.into(),
        }
    }
}

impl HasAuthContext for AuthSettings {
    fn admin_permission(&self) -> &str {
        &self.admin_permission
    }
}

/// Owner of the map, or anyone holding the admin permission.
fn check_session_access<D>(
    context: &UserContext,
    capability: Capability,
    mapping: &TokenMapping,
    deps: &D,
) -> Result<(), AuthError>
where
    D: HasAuthContext,
{
    if mapping.is_owned_by(&context.subject) {
        return Ok(());
    }

    if context.has_permission(deps.admin_permission()) {
        tracing::info!(
            session_id = %mapping.session_id,
            subject = %context.subject,
            capability = capability.as_str(),
            "Administrative access to foreign session"
        );
        return Ok(());
    }

    Err(AuthError::NotOwner {
        subject: context.subject.clone(),
        capability: capability.as_str(),
        session_id: mapping.session_id.clone(),
    })
}
