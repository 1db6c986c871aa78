//! Destinations for operator log entries.

use std::sync::{Arc, Mutex, PoisonError};

use crate::types::{LogEntry, Severity};

/// Where operator-visible log entries go.
///
/// The relay task and action handlers append concurrently, so implementations
/// must serialize appends: one entry is never interleaved with another.
pub trait LogSink: Send + Sync {
    fn append(&self, entry: LogEntry);

    fn info(&self, message: &str) {
        self.append(LogEntry::info(message));
    }

    fn error(&self, message: &str) {
        self.append(LogEntry::error(message));
    }
}

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    fn append(&self, entry: LogEntry) {
        (**self).append(entry);
    }
}

/// Keeps every entry in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|e| e.message.clone()).collect()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.lock().iter().filter(|e| e.severity == severity).count()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LogSink for MemorySink {
    fn append(&self, entry: LogEntry) {
        self.lock().push(entry);
    }
}
