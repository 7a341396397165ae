//! Log sinks a configuration can write to.

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use cachet_core::traits::LogSink;
use cachet_core::types::LogLevel;

/// Discards everything. The default sink.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullLogger;

impl LogSink for NullLogger {
    fn log(&self, _level: LogLevel, _message: &str) {}
}

/// Forwards messages to `tracing` under the `cachet` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl LogSink for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => debug!(target: "cachet", "{message}"),
            LogLevel::Info => info!(target: "cachet", "{message}"),
            LogLevel::Warn => warn!(target: "cachet", "{message}"),
            LogLevel::Error => error!(target: "cachet", "{message}"),
        }
    }
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    /// Creates an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything logged so far.
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().clone()
    }

    /// Returns the messages logged at `level` or above.
    pub fn messages_at_least(&self, level: LogLevel) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|(l, _)| *l >= level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Drops everything logged so far.
    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl LogSink for MemoryLogger {
    fn log(&self, level: LogLevel, message: &str) {
        self.lines.lock().push((level, message.to_string()));
    }
}
