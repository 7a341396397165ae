//! Configuration defaults for Cachet.
//!
//! Every option a caller leaves unset falls back to one of these values.

// ═══════════════════════════════════════════════════════════════════════════════
// TTL DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default time-to-live for cache entries, in seconds (one week).
pub const DEFAULT_TTL_SECONDS: u64 = 604_800;

/// Jitter is off unless a type opts in.
pub const DEFAULT_TTL_RANDOMIZATION: bool = false;

/// Lower bound (inclusive) of the default jitter multiplier.
pub const DEFAULT_TTL_RANDOMIZATION_LOW: f64 = 1.0;

/// Upper bound (exclusive) of the default jitter multiplier.
pub const DEFAULT_TTL_RANDOMIZATION_HIGH: f64 = 2.0;

// ═══════════════════════════════════════════════════════════════════════════════
// COLLECTION DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Collection-fetch responses are not synchronized by default.
pub const DEFAULT_COLLECTION_SYNCHRONIZE: bool = false;

/// The collection-fetch argument cached by default (`find(:all)` style queries).
pub const DEFAULT_COLLECTION_ARGUMENT: &str = "all";

// ═══════════════════════════════════════════════════════════════════════════════
// LOGGING & KEYS
// ═══════════════════════════════════════════════════════════════════════════════

/// Caching is enabled by default.
pub const DEFAULT_ENABLED: bool = true;

/// Prefix prepended to every message sent to a configured log sink.
pub const LOGGER_PREFIX: &str = "[cachet]";

/// Separator between the namespace and the arguments of a cache key.
pub const CACHE_KEY_SEPARATOR: &str = "/";
