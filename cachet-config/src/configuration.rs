//! Per-type cache configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use cachet_core::constants::{CACHE_KEY_SEPARATOR, LOGGER_PREFIX};
use cachet_core::error::Result;
use cachet_core::traits::{CacheStore, LogSink};
use cachet_core::types::{CollectionArgument, LogLevel};

use crate::builder::ConfigurationBuilder;
use crate::defaults::Defaults;
use crate::options::ConfigOptions;
use crate::ttl::{to_duration, RandomizationScale, Ttl};

/// Caching behaviour for objects of type `T`.
///
/// One configuration is built per cached type when the type is registered and
/// shared (usually behind an `Arc`) for the life of the process. Everything but
/// the enabled flag is fixed at build time.
///
/// # Thread Safety
///
/// `enable`/`disable` may race with readers on other threads; readers see the
/// toggle eventually. TTL resolution draws from the thread-local generator and
/// needs no locking.
///
/// ```rust
/// use cachet_config::{build_configuration, ConfigOptions, Configuration, Defaults};
///
/// let defaults = Defaults::new();
/// let options = ConfigOptions::new().with_ttl(100.0).with_randomization(2.0..3.0);
/// let config: Configuration<()> = build_configuration("Report", &defaults, options);
///
/// let ttl = config.resolve_ttl_secs(None).unwrap();
/// assert!((200.0..300.0).contains(&ttl));
/// ```
pub struct Configuration<T> {
    pub(crate) type_name: String,
    pub(crate) enabled: AtomicBool,
    pub(crate) ttl: Ttl<T>,
    pub(crate) ttl_randomization: bool,
    pub(crate) ttl_randomization_scale: RandomizationScale,
    pub(crate) collection_synchronize: bool,
    pub(crate) collection_arguments: Vec<CollectionArgument>,
    pub(crate) cache: Arc<dyn CacheStore>,
    pub(crate) logger: Arc<dyn LogSink>,
    pub(crate) cache_key_base: Option<String>,
    pub(crate) extra: BTreeMap<String, serde_json::Value>,
}

impl<T> Configuration<T> {
    /// Starts a builder for the type called `type_name`.
    pub fn builder(type_name: impl Into<String>, defaults: &Defaults) -> ConfigurationBuilder<T> {
        ConfigurationBuilder::new(type_name, defaults)
    }

    /// Starts a builder named after `T` itself.
    pub fn builder_for_type(defaults: &Defaults) -> ConfigurationBuilder<T> {
        ConfigurationBuilder::new(std::any::type_name::<T>(), defaults)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TTL RESOLUTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Resolves the TTL for `object` in seconds.
    ///
    /// The base comes from the fixed value or the per-object callback. With
    /// randomization on, it is multiplied by a factor drawn uniformly from the
    /// scale. Bounds are not checked: an inverted scale or a negative TTL
    /// yields a negative result here.
    pub fn resolve_ttl_secs(&self, object: Option<&T>) -> Result<f64> {
        let base = self.ttl.base_secs(object)?;
        if !self.ttl_randomization {
            return Ok(base);
        }
        Ok(self
            .ttl_randomization_scale
            .jitter_with(base, &mut rand::thread_rng()))
    }

    /// Resolves the TTL for `object` as a `Duration`.
    ///
    /// Fails with `InvalidTtl` when the resolved value is negative or not
    /// finite, and with whatever a failing TTL callback returned.
    pub fn resolve_ttl(&self, object: Option<&T>) -> Result<Duration> {
        to_duration(self.resolve_ttl_secs(object)?)
    }

    /// TTL for caching one object.
    pub fn ttl_for(&self, object: &T) -> Result<Duration> {
        self.resolve_ttl(Some(object))
    }

    /// TTL for a collection-fetch entry, which has no single object.
    pub fn collection_ttl(&self) -> Result<Duration> {
        self.resolve_ttl(None)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ENABLE / DISABLE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Turns caching on.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    /// Turns caching off.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    /// Returns true if caching is on.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Name of the cached type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The base TTL.
    pub fn ttl(&self) -> &Ttl<T> {
        &self.ttl
    }

    /// Whether jitter is applied.
    pub fn ttl_randomization(&self) -> bool {
        self.ttl_randomization
    }

    /// Jitter multiplier bounds.
    pub fn ttl_randomization_scale(&self) -> RandomizationScale {
        self.ttl_randomization_scale
    }

    /// Whether collection-fetch entries are synchronized.
    pub fn collection_synchronize(&self) -> bool {
        self.collection_synchronize
    }

    /// Cacheable collection-fetch arguments, in configured order.
    pub fn collection_arguments(&self) -> &[CollectionArgument] {
        &self.collection_arguments
    }

    /// Returns true if collection fetches with `argument` may be cached.
    pub fn is_collection_cacheable(&self, argument: &str) -> bool {
        self.collection_arguments
            .iter()
            .any(|a| a.as_str() == argument)
    }

    /// The cache backend.
    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// The log sink.
    pub fn logger(&self) -> &Arc<dyn LogSink> {
        &self.logger
    }

    /// Cache key namespace: the override if set, else the type name.
    pub fn cache_key_base(&self) -> &str {
        self.cache_key_base.as_deref().unwrap_or(&self.type_name)
    }

    /// Unrecognized options, as supplied.
    pub fn extra(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.extra
    }

    /// One unrecognized option.
    pub fn extra_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(key)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // KEYS & LOGGING
    // ═══════════════════════════════════════════════════════════════════════════

    /// Builds the cache key for `arguments` under this type's namespace.
    ///
    /// The namespace is lower-cased and `::` path separators become `/`, so
    /// `Billing::Invoice` with arguments `[7]` gives `billing/invoice/7`.
    pub fn cache_key<I>(&self, arguments: I) -> String
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        let mut key = self
            .cache_key_base()
            .replace("::", CACHE_KEY_SEPARATOR)
            .to_lowercase();
        for argument in arguments {
            key.push_str(CACHE_KEY_SEPARATOR);
            key.push_str(&argument.to_string());
        }
        key
    }

    /// Sends `message` to the log sink, prefixed with `[cachet]`.
    pub fn log(&self, level: LogLevel, message: &str) {
        self.logger
            .log(level, &format!("{LOGGER_PREFIX} {message}"));
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STORE ACCESS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Reads `key` from the cache. Always misses while caching is disabled.
    pub fn read(&self, key: &str) -> Option<Vec<u8>> {
        if !self.is_enabled() {
            return None;
        }
        let value = self.cache.get(key);
        if value.is_some() {
            self.log(LogLevel::Debug, &format!("READ {key}"));
        }
        value
    }

    /// Writes `value` under `key` with the TTL resolved for `object`.
    ///
    /// Returns `Ok(false)` without touching the cache while caching is
    /// disabled. TTL resolution errors are returned before anything is written.
    pub fn write(&self, key: &str, value: Vec<u8>, object: Option<&T>) -> Result<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }
        let ttl = self.resolve_ttl(object)?;
        debug!(key, ttl_secs = ttl.as_secs_f64(), "Writing cache entry");
        self.cache.set(key, value, ttl);
        self.log(LogLevel::Debug, &format!("WRITE {key}"));
        Ok(true)
    }

    /// Removes `key` from the cache, whether or not caching is enabled.
    pub fn invalidate(&self, key: &str) {
        self.cache.delete(key);
        self.log(LogLevel::Debug, &format!("DELETE {key}"));
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION & EXPORT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Checks a fixed TTL and the scale eagerly.
    ///
    /// Construction never validates; call this to fail fast at registration.
    pub fn validate(&self) -> Result<()> {
        self.ttl.validate()?;
        self.ttl_randomization_scale.validate()
    }

    /// Snapshot of the data options. A dynamic TTL has no data form and is
    /// left out.
    pub fn to_options(&self) -> ConfigOptions {
        ConfigOptions {
            enabled: Some(self.is_enabled()),
            ttl: self.ttl.as_fixed(),
            ttl_randomization: Some(self.ttl_randomization),
            ttl_randomization_scale: Some(self.ttl_randomization_scale),
            collection_synchronize: Some(self.collection_synchronize),
            collection_arguments: Some(self.collection_arguments.clone()),
            cache_key_base: Some(self.cache_key_base().to_string()),
            extra: self.extra.clone(),
        }
    }
}

impl<T> fmt::Debug for Configuration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("type_name", &self.type_name)
            .field("enabled", &self.is_enabled())
            .field("ttl", &self.ttl)
            .field("ttl_randomization", &self.ttl_randomization)
            .field("ttl_randomization_scale", &self.ttl_randomization_scale)
            .field("collection_synchronize", &self.collection_synchronize)
            .field("collection_arguments", &self.collection_arguments)
            .field("cache_key_base", &self.cache_key_base)
            .field("extra", &self.extra)
            .finish_non_exhaustive()
    }
}

/// Merges `overrides` over the defaults for the type called `type_name`.
///
/// Unknown keys are kept; nothing is validated. `ConfigOptions` only carries
/// data, so a custom cache store, log sink or per-object TTL callback goes
/// through [`Configuration::builder`] instead.
pub fn build_configuration<T>(
    type_name: impl Into<String>,
    defaults: &Defaults,
    overrides: ConfigOptions,
) -> Configuration<T> {
    ConfigurationBuilder::new(type_name, defaults)
        .options(overrides)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLogger;
    use cachet_core::CachetError;
    use proptest::prelude::*;
    use test_case::test_case;

    struct Blob {
        size: u64,
    }

    fn defaults() -> Defaults {
        Defaults::new()
    }

    #[test]
    fn test_build_with_empty_overrides_uses_defaults() {
        let config: Configuration<Blob> = build_configuration("Blob", &defaults(), ConfigOptions::new());

        assert!(config.is_enabled());
        assert_eq!(config.ttl().as_fixed(), Some(604_800.0));
        assert!(!config.ttl_randomization());
        assert_eq!(config.ttl_randomization_scale(), RandomizationScale::new(1.0, 2.0));
        assert!(!config.collection_synchronize());
        assert_eq!(config.collection_arguments(), &[CollectionArgument::all()]);
        assert_eq!(config.cache_key_base(), "Blob");
        assert!(config.extra().is_empty());
    }

    #[test]
    fn test_fixed_ttl_without_randomization_is_exact() {
        let config: Configuration<Blob> = build_configuration("Blob", &defaults(), ConfigOptions::new());
        assert_eq!(config.resolve_ttl_secs(None).unwrap(), 604_800.0);
        assert_eq!(config.collection_ttl().unwrap(), Duration::from_secs(604_800));
    }

    #[test]
    fn test_randomized_ttl_scenario() {
        let options = ConfigOptions::new().with_ttl(100.0).with_randomization(2.0..3.0);
        let config: Configuration<Blob> = build_configuration("Blob", &defaults(), options);

        for _ in 0..10_000 {
            let ttl = config.resolve_ttl_secs(None).unwrap();
            assert!((200.0..300.0).contains(&ttl), "ttl {ttl} outside [200, 300)");
        }
    }

    #[test]
    fn test_randomized_ttl_is_not_constant() {
        let options = ConfigOptions::new().with_ttl(100.0).with_randomization(1.0..2.0);
        let config: Configuration<Blob> = build_configuration("Blob", &defaults(), options);

        let samples: Vec<f64> = (0..100).map(|_| config.resolve_ttl_secs(None).unwrap()).collect();
        assert!(samples.iter().any(|s| *s != samples[0]));
    }

    #[test]
    fn test_dynamic_ttl_scenario() {
        let config = Configuration::builder("Blob", &defaults())
            .ttl_fn(|blob: Option<&Blob>| blob.map_or(0.0, |b| b.size as f64))
            .build();

        assert_eq!(config.resolve_ttl_secs(Some(&Blob { size: 42 })).unwrap(), 42.0);
        assert_eq!(config.ttl_for(&Blob { size: 42 }).unwrap(), Duration::from_secs(42));
    }

    #[test]
    fn test_dynamic_ttl_with_randomization() {
        let config = Configuration::builder("Blob", &defaults())
            .ttl_fn(|blob: Option<&Blob>| blob.map_or(0.0, |b| b.size as f64))
            .ttl_randomization(true)
            .ttl_randomization_scale(RandomizationScale::new(0.5, 1.0))
            .build();

        for _ in 0..1_000 {
            let ttl = config.resolve_ttl_secs(Some(&Blob { size: 40 })).unwrap();
            assert!((20.0..40.0).contains(&ttl));
        }
    }

    #[test]
    fn test_failing_callback_propagates() {
        let config = Configuration::builder("Blob", &defaults())
            .try_ttl_fn(|blob: Option<&Blob>| match blob {
                Some(b) => Ok(b.size as f64),
                None => Err(CachetError::TtlCallback("collections are not cached".into())),
            })
            .build();

        assert!(config.resolve_ttl(Some(&Blob { size: 5 })).is_ok());
        let err = config.collection_ttl().unwrap_err();
        assert!(matches!(err, CachetError::TtlCallback(_)));
    }

    #[test]
    fn test_inverted_scale_is_not_validated_at_build() {
        let options = ConfigOptions::new().with_ttl(100.0).with_randomization(RandomizationScale::new(-2.0, -1.0));
        let config: Configuration<Blob> = build_configuration("Blob", &defaults(), options);

        let raw = config.resolve_ttl_secs(None).unwrap();
        assert!(raw < 0.0);
        assert!(matches!(config.resolve_ttl(None), Err(CachetError::InvalidTtl { .. })));
    }

    #[test]
    fn test_validate_is_opt_in() {
        let options = ConfigOptions::new().with_ttl(10.0).with_randomization(RandomizationScale::new(3.0, 2.0));
        let config: Configuration<Blob> = build_configuration("Blob", &defaults(), options);
        assert!(matches!(config.validate(), Err(CachetError::InvalidScale { .. })));

        let negative: Configuration<Blob> =
            build_configuration("Blob", &defaults(), ConfigOptions::new().with_ttl(-1.0));
        assert!(matches!(negative.validate(), Err(CachetError::InvalidTtl { .. })));

        let fine: Configuration<Blob> = build_configuration("Blob", &defaults(), ConfigOptions::new());
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn test_enable_disable_idempotent() {
        let config: Configuration<Blob> = build_configuration("Blob", &defaults(), ConfigOptions::new());

        config.disable();
        config.disable();
        assert!(!config.is_enabled());

        config.enable();
        config.enable();
        assert!(config.is_enabled());

        config.disable();
        assert!(!config.is_enabled());
    }

    #[test]
    fn test_toggle_visible_across_threads() {
        let config: Arc<Configuration<Blob>> =
            Arc::new(build_configuration("Blob", &defaults(), ConfigOptions::new()));

        let writer = Arc::clone(&config);
        std::thread::spawn(move || writer.disable()).join().unwrap();
        assert!(!config.is_enabled());
    }

    #[test]
    fn test_unknown_keys_are_kept() {
        let options = ConfigOptions::from_json_str(r#"{"race_condition_ttl": 10}"#).unwrap();
        let config: Configuration<Blob> = build_configuration("Blob", &defaults(), options);
        assert_eq!(config.extra_value("race_condition_ttl"), Some(&serde_json::json!(10)));
        assert!(config.extra_value("missing").is_none());
    }

    #[test_case("Blob", None, &["1"], "blob/1" ; "type name")]
    #[test_case("Billing::Invoice", None, &["7"], "billing/invoice/7" ; "nested type name")]
    #[test_case("Blob", Some("Assets"), &["all", "2"], "assets/all/2" ; "override")]
    #[test_case("Blob", None, &[], "blob" ; "no arguments")]
    fn test_cache_key(type_name: &str, base: Option<&str>, args: &[&str], expected: &str) {
        let mut builder = Configuration::<Blob>::builder(type_name, &defaults());
        if let Some(base) = base {
            builder = builder.cache_key_base(base);
        }
        assert_eq!(builder.build().cache_key(args), expected);
    }

    #[test]
    fn test_builder_for_type_uses_type_path() {
        let config = Configuration::<Blob>::builder_for_type(&defaults()).build();
        assert!(config.type_name().ends_with("Blob"));
        assert!(config.cache_key(["1"]).ends_with("/blob/1"));
    }

    #[test]
    fn test_collection_cacheable() {
        let config: Configuration<Blob> = build_configuration("Blob", &defaults(), ConfigOptions::new());
        assert!(config.is_collection_cacheable("all"));
        assert!(!config.is_collection_cacheable("first"));
    }

    #[test]
    fn test_log_is_prefixed() {
        let logger = Arc::new(MemoryLogger::new());
        let config: Configuration<Blob> = Configuration::builder("Blob", &defaults())
            .logger(logger.clone())
            .build();

        config.log(LogLevel::Info, "warming");
        assert_eq!(logger.lines(), vec![(LogLevel::Info, "[cachet] warming".to_string())]);
    }

    #[test]
    fn test_write_read_invalidate() {
        let logger = Arc::new(MemoryLogger::new());
        let config = Configuration::builder("Blob", &defaults())
            .ttl_fn(|blob: Option<&Blob>| blob.map_or(60.0, |b| b.size as f64))
            .logger(logger.clone())
            .build();

        let key = config.cache_key([1]);
        assert!(config.write(&key, b"payload".to_vec(), Some(&Blob { size: 30 })).unwrap());
        assert_eq!(config.read(&key).unwrap(), b"payload");

        config.invalidate(&key);
        assert!(config.read(&key).is_none());

        let messages = logger.messages_at_least(LogLevel::Debug);
        assert_eq!(messages, vec!["[cachet] WRITE blob/1", "[cachet] READ blob/1", "[cachet] DELETE blob/1"]);
    }

    #[test]
    fn test_disabled_configuration_skips_cache() {
        let config: Configuration<Blob> = build_configuration("Blob", &defaults(), ConfigOptions::new().with_enabled(false));

        assert!(!config.write("blob/1", vec![1], None).unwrap());
        assert!(config.cache().get("blob/1").is_none());

        config.cache().set("blob/1", vec![1], Duration::from_secs(60));
        assert!(config.read("blob/1").is_none());

        config.enable();
        assert_eq!(config.read("blob/1").unwrap(), vec![1]);
    }

    #[test]
    fn test_write_does_not_store_on_invalid_ttl() {
        let config: Configuration<Blob> =
            build_configuration("Blob", &defaults(), ConfigOptions::new().with_ttl(-1.0));
        assert!(config.write("blob/1", vec![1], None).is_err());
        assert!(config.cache().get("blob/1").is_none());
    }

    #[test]
    fn test_types_share_the_default_store() {
        let shared = defaults();
        let blobs: Configuration<Blob> = build_configuration("Blob", &shared, ConfigOptions::new());
        let users: Configuration<String> = build_configuration("User", &shared, ConfigOptions::new());

        blobs.write("blob/1", vec![9], None).unwrap();
        assert_eq!(users.cache().get("blob/1").unwrap(), vec![9]);
    }

    #[test]
    fn test_to_options_round_trips_data() {
        let options = ConfigOptions::new()
            .with_ttl(30.0)
            .with_randomization(1.0..1.5)
            .with_extra("owner", "search".into());
        let config: Configuration<Blob> = build_configuration("Blob", &defaults(), options);

        let snapshot = config.to_options();
        assert_eq!(snapshot.ttl, Some(30.0));
        assert_eq!(snapshot.ttl_randomization, Some(true));
        assert_eq!(snapshot.cache_key_base.as_deref(), Some("Blob"));

        let rebuilt: Configuration<Blob> = build_configuration("Other", &defaults(), snapshot);
        assert_eq!(rebuilt.cache_key_base(), "Blob");
        assert_eq!(rebuilt.ttl_randomization_scale(), RandomizationScale::new(1.0, 1.5));
        assert_eq!(rebuilt.extra_value("owner"), Some(&serde_json::json!("search")));
    }

    proptest! {
        #[test]
        fn prop_fixed_ttl_is_returned_exactly(ttl in 0u32..=u32::MAX) {
            let options = ConfigOptions::new().with_ttl(ttl as f64);
            let config: Configuration<Blob> = build_configuration("Blob", &Defaults::new(), options);
            prop_assert_eq!(config.resolve_ttl_secs(None).unwrap(), ttl as f64);
            prop_assert_eq!(config.resolve_ttl(None).unwrap(), Duration::from_secs(ttl as u64));
        }

        #[test]
        fn prop_dynamic_ttl_equals_callback(size in 0u64..1_000_000) {
            let config = Configuration::builder("Blob", &Defaults::new())
                .ttl_fn(|blob: Option<&Blob>| blob.map_or(0.0, |b| (b.size * 2) as f64))
                .build();
            prop_assert_eq!(config.resolve_ttl_secs(Some(&Blob { size })).unwrap(), (size * 2) as f64);
        }

        #[test]
        fn prop_randomized_ttl_within_scaled_bounds(
            ttl in 1u32..1_000_000,
            low in 0.0f64..4.0,
            width in 0.01f64..4.0,
        ) {
            let high = low + width;
            let options = ConfigOptions::new()
                .with_ttl(ttl as f64)
                .with_randomization(RandomizationScale::new(low, high));
            let config: Configuration<Blob> = build_configuration("Blob", &Defaults::new(), options);

            let t = ttl as f64;
            for _ in 0..50 {
                let resolved = config.resolve_ttl_secs(None).unwrap();
                prop_assert!(resolved >= t * low * (1.0 - 1e-12));
                prop_assert!(resolved <= t * high * (1.0 + 1e-12));
            }
        }
    }
}
