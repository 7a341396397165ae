//! # Cachet Config
//!
//! Per-type configuration for a read-through object cache.
//!
//! Each cached type gets one [`Configuration`], built by merging sparse
//! [`ConfigOptions`] over the defaults:
//!
//! - **TTL**: a fixed number of seconds or a function of the cached object
//! - **Jitter**: optional random scaling of the TTL within a [`RandomizationScale`]
//! - **Collaborators**: the cache store and log sink, falling back to [`Defaults`]
//! - **Collections**: which collection-fetch arguments are cacheable
//!
//! ## Example
//!
//! ```rust
//! use cachet_config::{Configuration, ConfigOptions, Defaults};
//!
//! struct Session { expires_in: u64 }
//!
//! let defaults = Defaults::new();
//! let config = Configuration::builder("Session", &defaults)
//!     .ttl_fn(|s: Option<&Session>| s.map_or(300.0, |s| s.expires_in as f64))
//!     .options(ConfigOptions::new().with_cache_key_base("sessions"))
//!     .build();
//!
//! let ttl = config.ttl_for(&Session { expires_in: 42 }).unwrap();
//! assert_eq!(ttl.as_secs(), 42);
//! assert_eq!(config.cache_key(["abc"]), "sessions/abc");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod builder;
mod configuration;
mod defaults;
mod logger;
mod options;
mod ttl;

pub use builder::ConfigurationBuilder;
pub use configuration::{build_configuration, Configuration};
pub use defaults::Defaults;
pub use logger::{MemoryLogger, NullLogger, TracingLogger};
pub use options::ConfigOptions;
pub use ttl::{to_duration, RandomizationScale, Ttl, TtlFn};

// Re-export the seams and shared types from core
pub use cachet_core::error::{CachetError, Result};
pub use cachet_core::traits::{CacheStore, LogSink};
pub use cachet_core::types::{CollectionArgument, LogLevel};
