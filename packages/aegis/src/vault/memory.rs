//! In-process vault over a TTL/LRU cache.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::{TtlCache, Vault};
use crate::auth::UserContext;
use crate::clock::{Clock, MonotonicClock};
use crate::error::{VaultError, VaultResult};
use crate::types::TokenMapping;

/// One hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

pub const DEFAULT_MAX_SIZE: usize = 10_000;

/// In-memory vault. Data is gone on restart.
pub struct MemoryVault {
    storage: Mutex<TtlCache<TokenMapping>>,
}

impl Default for MemoryVault {
    fn default() -> Self {
        let max_size = NonZeroUsize::new(DEFAULT_MAX_SIZE).unwrap_or(NonZeroUsize::MIN);
        Self::new(DEFAULT_TTL, max_size)
    }
}

impl MemoryVault {
    pub fn new(ttl: Duration, max_size: NonZeroUsize) -> Self {
        Self::with_clock(ttl, max_size, Arc::new(MonotonicClock::new()))
    }

    /// Build with an injected clock (tests drive expiry by hand).
    pub fn with_clock(ttl: Duration, max_size: NonZeroUsize, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage: Mutex::new(TtlCache::new(max_size, ttl, clock)),
        }
    }

    pub fn ttl(&self) -> VaultResult<Duration> {
        Ok(self.lock()?.ttl())
    }

    pub fn max_size(&self) -> VaultResult<usize> {
        Ok(self.lock()?.capacity())
    }

    /// Number of live sessions.
    pub fn len(&self) -> VaultResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> VaultResult<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> VaultResult<MutexGuard<'_, TtlCache<TokenMapping>>> {
        self.storage.lock().map_err(|_| VaultError::LockPoisoned)
    }
}

fn require_context(context: &UserContext) -> VaultResult<()> {
    context
        .require()
        .map(|_| ())
        .map_err(|_| VaultError::MissingContext)
}

impl Vault for MemoryVault {
    fn save_map(&self, mapping: TokenMapping, context: &UserContext) -> VaultResult<()> {
        require_context(context)?;
        tracing::debug!(
            session_id = %mapping.session_id,
            entries = mapping.len(),
            "Saving token map"
        );
        self.lock()?.insert(mapping.session_id.clone(), mapping);
        Ok(())
    }

    fn get_map(
        &self,
        session_id: &str,
        context: &UserContext,
    ) -> VaultResult<Option<TokenMapping>> {
        require_context(context)?;
        Ok(self.lock()?.get(session_id))
    }

    fn delete_map(&self, session_id: &str, context: &UserContext) -> VaultResult<()> {
        require_context(context)?;
        if self.lock()?.remove(session_id).is_some() {
            tracing::debug!(session_id = %session_id, "Deleted token map");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn ctx() -> UserContext {
        UserContext::new("test-user")
    }

    fn mapping(session_id: &str) -> TokenMapping {
        TokenMapping::new(session_id, "test-user", chrono::Duration::hours(1))
    }

    fn vault_with_clock(ttl_secs: u64, max_size: usize) -> (MemoryVault, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let vault = MemoryVault::with_clock(
            Duration::from_secs(ttl_secs),
            NonZeroUsize::new(max_size).unwrap(),
            clock.clone(),
        );
        (vault, clock)
    }

    #[test]
    fn test_initialization_defaults() {
        let vault = MemoryVault::default();
        assert_eq!(vault.max_size().unwrap(), 10_000);
        assert_eq!(vault.ttl().unwrap(), Duration::from_secs(3600));
        assert!(vault.is_empty().unwrap());
    }

    #[test]
    fn test_save_and_get_map() {
        let vault = MemoryVault::default();
        let mut m = mapping("sess_1");
        m.insert("[PATIENT_A]", "John").unwrap();

        vault.save_map(m.clone(), &ctx()).unwrap();
        assert_eq!(vault.get_map("sess_1", &ctx()).unwrap(), Some(m));
    }

    #[test]
    fn test_get_nonexistent_map() {
        let vault = MemoryVault::default();
        assert_eq!(vault.get_map("nonexistent", &ctx()).unwrap(), None);
    }

    #[test]
    fn test_ttl_expiry() {
        let (vault, clock) = vault_with_clock(10, 100);
        vault.save_map(mapping("sess_1"), &ctx()).unwrap();

        clock.advance(Duration::from_secs(5));
        assert!(vault.get_map("sess_1", &ctx()).unwrap().is_some());

        clock.advance(Duration::from_secs(6));
        assert!(vault.get_map("sess_1", &ctx()).unwrap().is_none());
    }

    #[test]
    fn test_delete_map() {
        let vault = MemoryVault::default();
        vault.save_map(mapping("sess_1"), &ctx()).unwrap();
        vault.delete_map("sess_1", &ctx()).unwrap();
        assert!(vault.get_map("sess_1", &ctx()).unwrap().is_none());
    }

    #[test]
    fn test_delete_nonexistent_map() {
        let vault = MemoryVault::default();
        assert!(vault.delete_map("nonexistent", &ctx()).is_ok());
    }

    #[test]
    fn test_max_size_eviction() {
        let (vault, _clock) = vault_with_clock(60, 2);
        vault.save_map(mapping("1"), &ctx()).unwrap();
        vault.save_map(mapping("2"), &ctx()).unwrap();

        assert!(vault.get_map("1", &ctx()).unwrap().is_some());
        assert!(vault.get_map("2", &ctx()).unwrap().is_some());

        vault.save_map(mapping("3"), &ctx()).unwrap();
        assert!(vault.get_map("3", &ctx()).unwrap().is_some());
        assert!(vault.get_map("2", &ctx()).unwrap().is_some());
        assert!(vault.get_map("1", &ctx()).unwrap().is_none());
    }

    #[test]
    fn test_missing_context_rejected() {
        let vault = MemoryVault::default();
        let nobody = UserContext::new("");

        assert!(matches!(
            vault.save_map(mapping("s1"), &nobody),
            Err(VaultError::MissingContext)
        ));
        assert!(matches!(
            vault.get_map("s1", &nobody),
            Err(VaultError::MissingContext)
        ));
        assert!(matches!(
            vault.delete_map("s1", &nobody),
            Err(VaultError::MissingContext)
        ));
    }
}
