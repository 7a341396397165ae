//! Shared value types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_COLLECTION_ARGUMENT;

/// Severity of a message sent to a [`LogSink`](crate::traits::LogSink).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose diagnostics (cache reads and writes).
    Debug,
    /// Notable events.
    Info,
    /// Recoverable problems.
    Warn,
    /// Failures.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

/// Name of a collection-fetch argument set (`all`, `first`, `active`, ...).
///
/// The ORM layer compares the shape of a collection query against the
/// configured arguments to decide whether its result may be cached.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionArgument(String);

impl CollectionArgument {
    /// Creates an argument from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The default argument, `all`.
    pub fn all() -> Self {
        Self::new(DEFAULT_COLLECTION_ARGUMENT)
    }

    /// Returns the argument name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CollectionArgument {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for CollectionArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CollectionArgument {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for CollectionArgument {
    fn from(name: String) -> Self {
        Self(name)
    }
}
