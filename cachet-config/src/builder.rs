//! Builder that merges overrides over the defaults.

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use cachet_core::constants::{
    DEFAULT_COLLECTION_SYNCHRONIZE, DEFAULT_ENABLED, DEFAULT_TTL_RANDOMIZATION,
};
use cachet_core::error::Result;
use cachet_core::traits::{CacheStore, LogSink};
use cachet_core::types::CollectionArgument;

use crate::configuration::Configuration;
use crate::defaults::Defaults;
use crate::options::ConfigOptions;
use crate::ttl::{RandomizationScale, Ttl};

/// Builds a [`Configuration`] for one cached type.
///
/// Starts from the defaults; every setter and every [`options`](Self::options)
/// call overrides what came before. Nothing is validated.
pub struct ConfigurationBuilder<T> {
    type_name: String,
    enabled: bool,
    ttl: Ttl<T>,
    ttl_randomization: bool,
    ttl_randomization_scale: RandomizationScale,
    collection_synchronize: bool,
    collection_arguments: Vec<CollectionArgument>,
    cache: Arc<dyn CacheStore>,
    logger: Arc<dyn LogSink>,
    cache_key_base: Option<String>,
    extra: BTreeMap<String, serde_json::Value>,
}

impl<T> ConfigurationBuilder<T> {
    /// Starts a builder for the type called `type_name`.
    pub fn new(type_name: impl Into<String>, defaults: &Defaults) -> Self {
        Self {
            type_name: type_name.into(),
            enabled: DEFAULT_ENABLED,
            ttl: Ttl::default(),
            ttl_randomization: DEFAULT_TTL_RANDOMIZATION,
            ttl_randomization_scale: RandomizationScale::default(),
            collection_synchronize: DEFAULT_COLLECTION_SYNCHRONIZE,
            collection_arguments: vec![CollectionArgument::all()],
            cache: Arc::clone(defaults.cache()),
            logger: Arc::clone(defaults.logger()),
            cache_key_base: None,
            extra: BTreeMap::new(),
        }
    }

    /// Overlays every field set in `options`.
    pub fn options(mut self, options: ConfigOptions) -> Self {
        let ConfigOptions {
            enabled,
            ttl,
            ttl_randomization,
            ttl_randomization_scale,
            collection_synchronize,
            collection_arguments,
            cache_key_base,
            extra,
        } = options;

        if let Some(enabled) = enabled {
            self.enabled = enabled;
        }
        if let Some(ttl) = ttl {
            self.ttl = Ttl::Fixed(ttl);
        }
        if let Some(randomization) = ttl_randomization {
            self.ttl_randomization = randomization;
        }
        if let Some(scale) = ttl_randomization_scale {
            self.ttl_randomization_scale = scale;
        }
        if let Some(synchronize) = collection_synchronize {
            self.collection_synchronize = synchronize;
        }
        if let Some(arguments) = collection_arguments {
            self.collection_arguments = arguments;
        }
        if cache_key_base.is_some() {
            self.cache_key_base = cache_key_base;
        }
        self.extra.extend(extra);
        self
    }

    /// Sets whether caching starts enabled.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the base TTL.
    pub fn ttl(mut self, ttl: impl Into<Ttl<T>>) -> Self {
        self.ttl = ttl.into();
        self
    }

    /// Sets a per-object TTL.
    pub fn ttl_fn<F>(self, func: F) -> Self
    where
        F: Fn(Option<&T>) -> f64 + Send + Sync + 'static,
    {
        self.ttl(Ttl::dynamic(func))
    }

    /// Sets a per-object TTL whose callback may fail.
    pub fn try_ttl_fn<F>(self, func: F) -> Self
    where
        F: Fn(Option<&T>) -> Result<f64> + Send + Sync + 'static,
    {
        self.ttl(Ttl::try_dynamic(func))
    }

    /// Turns jitter on or off.
    pub fn ttl_randomization(mut self, enabled: bool) -> Self {
        self.ttl_randomization = enabled;
        self
    }

    /// Sets the jitter multiplier bounds.
    pub fn ttl_randomization_scale(mut self, scale: impl Into<RandomizationScale>) -> Self {
        self.ttl_randomization_scale = scale.into();
        self
    }

    /// Sets whether collection-fetch entries are synchronized.
    pub fn collection_synchronize(mut self, synchronize: bool) -> Self {
        self.collection_synchronize = synchronize;
        self
    }

    /// Sets the cacheable collection-fetch arguments.
    pub fn collection_arguments<I, A>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<CollectionArgument>,
    {
        self.collection_arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    /// Uses `cache` instead of the default store.
    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = cache;
        self
    }

    /// Uses `logger` instead of the default sink.
    pub fn logger(mut self, logger: Arc<dyn LogSink>) -> Self {
        self.logger = logger;
        self
    }

    /// Overrides the cache key namespace.
    pub fn cache_key_base(mut self, base: impl Into<String>) -> Self {
        self.cache_key_base = Some(base.into());
        self
    }

    /// Adds an unrecognized pass-through option.
    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Finishes the configuration.
    pub fn build(self) -> Configuration<T> {
        Configuration {
            type_name: self.type_name,
            enabled: AtomicBool::new(self.enabled),
            ttl: self.ttl,
            ttl_randomization: self.ttl_randomization,
            ttl_randomization_scale: self.ttl_randomization_scale,
            collection_synchronize: self.collection_synchronize,
            collection_arguments: self.collection_arguments,
            cache: self.cache,
            logger: self.logger,
            cache_key_base: self.cache_key_base,
            extra: self.extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLogger;
    use cachet_store::MemoryStore;

    #[test]
    fn test_later_calls_win() {
        let config: Configuration<()> = ConfigurationBuilder::new("User", &Defaults::new())
            .ttl(10u64)
            .options(ConfigOptions::new().with_ttl(20.0))
            .build();
        assert_eq!(config.ttl().as_fixed(), Some(20.0));

        let config: Configuration<()> = ConfigurationBuilder::new("User", &Defaults::new())
            .options(ConfigOptions::new().with_ttl(20.0))
            .ttl(10)
            .build();
        assert_eq!(config.ttl().as_fixed(), Some(10.0));
    }

    #[test]
    fn test_options_without_ttl_keep_dynamic_ttl() {
        let config = ConfigurationBuilder::new("Quote", &Defaults::new())
            .ttl_fn(|q: Option<&u64>| q.copied().unwrap_or(1) as f64)
            .options(ConfigOptions::new().with_cache_key_base("quotes"))
            .build();
        assert!(config.ttl().is_dynamic());
        assert_eq!(config.cache_key_base(), "quotes");
    }

    #[test]
    fn test_injected_collaborators_replace_defaults() {
        let defaults = Defaults::new();
        let store = Arc::new(MemoryStore::new());
        let logger = Arc::new(MemoryLogger::new());
        let config: Configuration<()> = ConfigurationBuilder::new("User", &defaults)
            .cache(store.clone())
            .logger(logger.clone())
            .build();

        assert!(!Arc::ptr_eq(config.cache(), defaults.cache()));
        config.log(cachet_core::LogLevel::Info, "hello");
        assert_eq!(logger.lines().len(), 1);
    }

    #[test]
    fn test_collection_arguments_from_strs() {
        let config: Configuration<()> = ConfigurationBuilder::new("User", &Defaults::new())
            .collection_arguments(["all", "active"])
            .collection_synchronize(true)
            .build();
        let names: Vec<&str> = config
            .collection_arguments()
            .iter()
            .map(CollectionArgument::as_str)
            .collect();
        assert_eq!(names, vec!["all", "active"]);
        assert!(config.collection_synchronize());
    }
}
