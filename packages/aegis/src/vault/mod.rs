//! Ephemeral, identity-scoped storage for session token maps.
//!
//! The vault exclusively owns persisted [`TokenMapping`]s. Engines load a
//! copy, mutate it for the duration of one call, and write it back through
//! [`Vault::save_map`]. The load-mutate-save sequence is not atomic: two
//! concurrent `mask()` calls on the same session are last-write-wins. An
//! implementation backed by a shared cache service needs compare-and-swap or
//! per-session locking on top of this trait.

mod cache;
mod memory;

pub use cache::TtlCache;
pub use memory::{MemoryVault, DEFAULT_MAX_SIZE, DEFAULT_TTL};

use crate::auth::UserContext;
use crate::error::VaultResult;
use crate::types::TokenMapping;

/// Storage for session maps. Every operation runs as an identity; a blank
/// identity fails with [`crate::VaultError::MissingContext`].
pub trait Vault: Send + Sync {
    /// Save or overwrite the map for `mapping.session_id`.
    fn save_map(&self, mapping: TokenMapping, context: &UserContext) -> VaultResult<()>;

    /// `None` when the session is absent, expired or evicted.
    fn get_map(&self, session_id: &str, context: &UserContext) -> VaultResult<Option<TokenMapping>>;

    /// Deleting a missing session is a no-op.
    fn delete_map(&self, session_id: &str, context: &UserContext) -> VaultResult<()>;
}
