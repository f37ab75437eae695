//! Bounded, time-evicting cache keyed by session id.
//!
//! Expiry is checked lazily: reads discard stale entries, writes purge them
//! before enforcing capacity. Once full, the least recently used live entry
//! is evicted to admit a new key.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;

struct Entry<V> {
    value: V,
    expires_at: Duration,
}

pub struct TtlCache<V> {
    entries: LruCache<String, Entry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(capacity: NonZeroUsize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: LruCache::new(capacity),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Insert or overwrite. Restarts the entry's TTL.
    pub fn insert(&mut self, key: String, value: V) {
        let now = self.clock.now();
        self.purge_expired(now);

        self.entries.put(
            key,
            Entry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Fetch a live entry and mark it most recently used.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let entry = self.entries.get(key)?;
        if entry.expires_at <= now {
            self.entries.pop(key);
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.pop(key).map(|entry| entry.value)
    }

    /// Live entries only.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .iter()
            .filter(|(_, e)| e.expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_expired(&mut self, now: Duration) {
        let stale: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.expires_at <= now)
            .map(|(k, _)| k.clone())
            .collect();
        for key in stale {
            self.entries.pop(&key);
        }
    }
}
