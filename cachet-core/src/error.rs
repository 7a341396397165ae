//! Error types for Cachet.
//!
//! Nothing in Cachet is fatal: every error is caused by caller-supplied data
//! (a bad option file, an inverted scale, a failing TTL callback) and is
//! surfaced at the call that used it.

use thiserror::Error;

/// Result type alias using `CachetError`.
pub type Result<T> = std::result::Result<T, CachetError>;

/// Main error type for all Cachet operations.
#[derive(Debug, Error)]
pub enum CachetError {
    // ═══════════════════════════════════════════════════════════════════════════
    // TTL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// A resolved TTL cannot be expressed as a duration.
    #[error("Invalid TTL: {seconds} seconds is not a non-negative finite duration")]
    InvalidTtl { seconds: f64 },

    /// Jitter bounds are inverted or not finite.
    #[error("Invalid TTL randomization scale: [{low}, {high})")]
    InvalidScale { low: f64, high: f64 },

    /// A per-object TTL callback failed.
    #[error("TTL callback failed: {0}")]
    TtlCallback(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// An option file could not be parsed.
    #[error("Configuration error in {path}: {reason}")]
    ConfigError {
        /// File the options were read from.
        path: String,
        /// Parser message, with line and column.
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION & STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CachetError {
    /// Returns true if this error comes from a TTL that could not be resolved.
    pub fn is_ttl_error(&self) -> bool {
        matches!(
            self,
            CachetError::InvalidTtl { .. }
                | CachetError::InvalidScale { .. }
                | CachetError::TtlCallback(_)
        )
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            CachetError::InvalidTtl { .. } | CachetError::InvalidScale { .. }
        )
    }
}
