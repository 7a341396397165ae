//! In-memory TTL store.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use cachet_core::traits::CacheStore;

/// Stored value with its expiry.
#[derive(Clone)]
struct StoreEntry {
    value: Vec<u8>,
    inserted_at: Instant,
    ttl: Duration,
}

impl StoreEntry {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

/// In-memory key-value store with per-entry TTLs.
///
/// Thread-safe. Expired entries are invisible to `get` and are dropped by
/// `cleanup_expired` or when the same key is written again.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoreEntry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Returns the remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|e| !e.is_expired())
            .map(|e| e.ttl.saturating_sub(e.inserted_at.elapsed()))
    }

    /// Clears all entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Removes all expired entries, returning how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired());
        before - entries.len()
    }

    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        let entries = self.entries.read();
        let expired = entries.values().filter(|e| e.is_expired()).count();
        StoreStats {
            total_entries: entries.len(),
            expired_entries: expired,
            valid_entries: entries.len().saturating_sub(expired),
            total_bytes: entries.values().map(|e| e.value.len()).sum(),
        }
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let entries = self.entries.read();
        entries.get(key).and_then(|e| {
            if e.is_expired() {
                None
            } else {
                Some(e.value.clone())
            }
        })
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        debug!(key, ttl_secs = ttl.as_secs_f64(), bytes = value.len(), "Storing cache entry");
        self.entries.write().insert(
            key.to_string(),
            StoreEntry {
                value,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    fn delete(&self, key: &str) {
        if self.entries.write().remove(key).is_some() {
            debug!(key, "Deleted cache entry");
        }
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.len())
            .finish()
    }
}

/// Store statistics.
#[derive(Clone, Debug, Serialize)]
pub struct StoreStats {
    /// Entries held, expired or not.
    pub total_entries: usize,
    /// Entries past their TTL that have not been cleaned up yet.
    pub expired_entries: usize,
    /// Entries still readable.
    pub valid_entries: usize,
    /// Sum of stored value sizes in bytes.
    pub total_bytes: usize,
}
