//! Identity-bound access control for session maps
//!
//! Provides a fluent API for authorization checks in engine code:
//!
//! ```rust
//! use aegis::auth::{Actor, AuthSettings, Capability, UserContext};
//! # use aegis::TokenMapping;
//! # let mapping = TokenMapping::new("s1", "user-1", chrono::Duration::hours(1));
//! # let ctx = UserContext::new("user-1");
//!
//! Actor::new(&ctx)
//!     .can(Capability::RevealSession)
//!     .check(&mapping, &AuthSettings::default())?;
//! # Ok::<(), aegis::AuthError>(())
//! ```
//!
//! The requester's identity is compared with the stored owner instead of
//! trusting an `authorized` flag computed upstream.

mod builder;
mod capability;
mod context;

pub use builder::{Actor, AuthSettings, CapabilityBuilder, HasAuthContext, DEFAULT_ADMIN_PERMISSION};
pub use capability::Capability;
pub use context::UserContext;
