//! Leveled operational messages.
//!
//! Components receive an [`EventLog`] instead of reaching for a global
//! logger. [`TracingEventLog`] forwards to `tracing`, [`MemoryEventLog`]
//! keeps the entries for inspection.

use parking_lot::Mutex;
use std::fmt::Display;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Info,
    Error,
    Success,
}

impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Info => f.write_str("INFO"),
            Level::Error => f.write_str("ERROR"),
            Level::Success => f.write_str("SUCCESS"),
        }
    }
}

pub trait EventLog: Send + Sync + 'static {
    fn emit(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }

    fn success(&self, message: &str) {
        self.emit(Level::Success, message);
    }
}

impl<T: EventLog + ?Sized> EventLog for Arc<T> {
    fn emit(&self, level: Level, message: &str) {
        (**self).emit(level, message);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventLog;

impl EventLog for TracingEventLog {
    fn emit(&self, level: Level, message: &str) {
        match level {
            Level::Info => tracing::info!("{message}"),
            Level::Error => tracing::error!("{message}"),
            Level::Success => tracing::info!(outcome = "success", "{message}"),
        }
    }
}

/// An entry captured by [`MemoryEventLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct MemoryEventLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Returns the messages emitted at `level`, oldest first.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl EventLog for MemoryEventLog {
    fn emit(&self, level: Level, message: &str) {
        self.entries.lock().push(LogEntry {
            level,
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_log_keeps_order_and_levels() {
        let log = MemoryEventLog::new();
        log.info("first");
        log.error("second");
        log.success("third");

        let levels: Vec<_> = log.entries().iter().map(|e| e.level).collect();
        assert_eq!(levels, [Level::Info, Level::Error, Level::Success]);
        assert_eq!(log.messages(Level::Error), ["second"]);

        log.clear();
        assert!(log.entries().is_empty());
    }

    #[test]
    fn shared_log_forwards_through_arc() {
        let log = Arc::new(MemoryEventLog::new());
        let dyn_log: Arc<dyn EventLog> = log.clone();
        dyn_log.success("created");

        assert_eq!(log.messages(Level::Success), ["created"]);
    }
}
