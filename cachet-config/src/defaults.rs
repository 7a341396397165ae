//! Shared fallback collaborators.
//!
//! The application entry point creates one [`Defaults`] and hands it to every
//! configuration it builds, so types that do not choose their own store share
//! a single in-memory store for the life of the process.

use std::fmt;
use std::sync::Arc;

use cachet_core::traits::{CacheStore, LogSink};
use cachet_store::MemoryStore;

use crate::logger::NullLogger;

/// Cache store and log sink used when a configuration does not pick its own.
#[derive(Clone)]
pub struct Defaults {
    cache: Arc<dyn CacheStore>,
    logger: Arc<dyn LogSink>,
}

impl Defaults {
    /// A fresh in-memory store and a no-op logger.
    pub fn new() -> Self {
        Self {
            cache: Arc::new(MemoryStore::new()),
            logger: Arc::new(NullLogger),
        }
    }

    /// Replaces the fallback store, e.g. with the host framework's cache.
    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = cache;
        self
    }

    /// Replaces the fallback logger, e.g. with the host framework's logger.
    pub fn with_logger(mut self, logger: Arc<dyn LogSink>) -> Self {
        self.logger = logger;
        self
    }

    /// The fallback store.
    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// The fallback logger.
    pub fn logger(&self) -> &Arc<dyn LogSink> {
        &self.logger
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Defaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Defaults").finish_non_exhaustive()
    }
}
