//! In-process TTL store for Cachet.
//!
//! The default cache backend every configuration falls back to when the host
//! application does not inject its own.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod memory;

pub use memory::{MemoryStore, StoreStats};

// Re-export the trait from core
pub use cachet_core::traits::CacheStore;
