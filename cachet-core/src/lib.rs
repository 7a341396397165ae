//! # Cachet Core
//!
//! Core types, errors, and traits shared by every Cachet crate.
//!
//! - **Errors**: a single error enum with classification helpers
//! - **Constants**: configuration defaults and the log prefix
//! - **Traits**: the cache backend and log sink seams
//! - **Types**: log levels and collection-fetch arguments
//!
//! ## Example
//!
//! ```rust
//! use cachet_core::{CollectionArgument, LogLevel, DEFAULT_TTL_SECONDS};
//!
//! let all = CollectionArgument::all();
//! assert_eq!(all.as_str(), "all");
//! assert_eq!(DEFAULT_TTL_SECONDS, 604_800);
//! assert!(LogLevel::Warn > LogLevel::Debug);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{CachetError, Result};
pub use traits::*;
pub use types::*;
