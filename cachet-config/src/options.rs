//! Sparse option overrides.
//!
//! [`ConfigOptions`] is what a caller (or an option file) supplies: every field
//! is optional and only set fields override the defaults. Keys Cachet does not
//! recognize are kept in `extra` and handed through untouched.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use cachet_core::error::{CachetError, Result};
use cachet_core::types::CollectionArgument;

use crate::ttl::{RandomizationScale, Ttl};

/// Caller-supplied overrides, merged over the defaults at build time.
///
/// ```rust
/// use cachet_config::ConfigOptions;
///
/// let options = ConfigOptions::from_json_str(r#"{
///     "ttl": 100,
///     "ttl_randomization": true,
///     "ttl_randomization_scale": [2, 3],
///     "owner": "billing"
/// }"#).unwrap();
///
/// assert_eq!(options.ttl, Some(100.0));
/// assert_eq!(options.extra["owner"], "billing");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOptions {
    /// Master on/off switch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Fixed base TTL in seconds. Per-object TTLs are set through the builder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<f64>,
    /// Whether to jitter resolved TTLs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_randomization: Option<bool>,
    /// Jitter multiplier bounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_randomization_scale: Option<RandomizationScale>,
    /// Whether collection-fetch entries are synchronized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_synchronize: Option<bool>,
    /// Cacheable collection-fetch argument sets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_arguments: Option<Vec<CollectionArgument>>,
    /// Cache key namespace override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_key_base: Option<String>,
    /// Unrecognized keys, passed through.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ConfigOptions {
    /// Creates an empty set of overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses overrides from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads overrides from a JSON file.
    ///
    /// A file that cannot be read is an `IoError`; one that does not parse is
    /// a `ConfigError` naming the file.
    #[instrument]
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let options: Self = serde_json::from_str(&text).map_err(|e| CachetError::ConfigError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), extra_keys = options.extra.len(), "Loaded cache options");
        Ok(options)
    }

    /// Serializes the set overrides as pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns true if nothing is overridden.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlays `other` on `self`; fields set in `other` win.
    pub fn merge(mut self, other: ConfigOptions) -> Self {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        overlay!(
            enabled,
            ttl,
            ttl_randomization,
            ttl_randomization_scale,
            collection_synchronize,
            collection_arguments,
            cache_key_base
        );
        self.extra.extend(other.extra);
        self
    }

    /// Checks the TTL and scale eagerly.
    ///
    /// Building a configuration never calls this; it exists for callers that
    /// want to fail fast on a bad option file.
    pub fn validate(&self) -> Result<()> {
        if let Some(ttl) = self.ttl {
            Ttl::<()>::fixed(ttl).validate()?;
        }
        if let Some(scale) = &self.ttl_randomization_scale {
            scale.validate()?;
        }
        Ok(())
    }

    /// Sets `enabled`.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Sets a fixed TTL in seconds.
    pub fn with_ttl(mut self, seconds: f64) -> Self {
        self.ttl = Some(seconds);
        self
    }

    /// Turns jitter on with the given bounds.
    pub fn with_randomization(mut self, scale: impl Into<RandomizationScale>) -> Self {
        self.ttl_randomization = Some(true);
        self.ttl_randomization_scale = Some(scale.into());
        self
    }

    /// Sets the cache key namespace.
    pub fn with_cache_key_base(mut self, base: impl Into<String>) -> Self {
        self.cache_key_base = Some(base.into());
        self
    }

    /// Adds an unrecognized pass-through option.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}
