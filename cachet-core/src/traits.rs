//! Common traits for Cachet.
//!
//! These are the seams a host application plugs its own infrastructure into:
//! a key-value cache backend and a leveled log sink.

use std::time::Duration;

use crate::types::LogLevel;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE BACKEND TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for the key-value store cached objects are written to.
///
/// Implementations might use:
/// - In-memory storage (the default, see `cachet-store`)
/// - Redis / Memcached (for production)
///
/// Values are opaque bytes; serializing the cached object is the caller's job.
pub trait CacheStore: Send + Sync {
    /// Fetches a live entry, if any.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Stores `value` under `key`, expiring after `ttl`.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration);

    /// Removes the entry under `key`. Missing keys are ignored.
    fn delete(&self, key: &str);
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOG SINK TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for diagnostic output about caching decisions.
pub trait LogSink: Send + Sync {
    /// Records an already prefixed message at the given level.
    fn log(&self, level: LogLevel, message: &str);
}
