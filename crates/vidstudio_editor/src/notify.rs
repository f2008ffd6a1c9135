// SPDX-License-Identifier: MIT OR Apache-2.0
//! User-facing notifications.
//!
//! The editor reports every outcome through a [`NotificationSink`]. The
//! headless sinks either forward to `tracing` or keep a bounded log that
//! tests and the session runner can read back.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    /// An edit went through
    Success,
    /// Neutral notice, including no-op requests
    Info,
    /// Something failed
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// A recorded notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Message text
    pub message: String,
    /// Severity
    pub severity: Severity,
    /// Unix timestamp in seconds
    pub timestamp: u64,
}

/// Receives user-facing messages
pub trait NotificationSink {
    /// Show a message
    fn notify(&self, message: &str, severity: Severity);
}

/// Sink that writes notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Success | Severity::Info => tracing::info!(%severity, "{message}"),
            Severity::Error => tracing::warn!(%severity, "{message}"),
        }
    }
}

/// Bounded in-memory log of notifications.
///
/// Clones share the same buffer, so one handle can be given to the editor
/// and another kept for reading.
#[derive(Debug, Clone)]
pub struct NotificationLog {
    entries: Arc<Mutex<VecDeque<Notification>>>,
    capacity: usize,
}

impl NotificationLog {
    /// Create a log keeping at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Copy of all entries, oldest first
    pub fn entries(&self) -> Vec<Notification> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Most recent entry
    pub fn last(&self) -> Option<Notification> {
        self.entries.lock().back().cloned()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Entries with a given severity
    pub fn with_severity(&self, severity: Severity) -> Vec<Notification> {
        self.entries
            .lock()
            .iter()
            .filter(|n| n.severity == severity)
            .cloned()
            .collect()
    }

    /// Drop all entries
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for NotificationLog {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_NOTIFICATION_CAPACITY)
    }
}

impl NotificationSink for NotificationLog {
    fn notify(&self, message: &str, severity: Severity) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let mut entries = self.entries.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(Notification {
            message: message.to_string(),
            severity,
            timestamp,
        });
    }
}

impl<A: NotificationSink, B: NotificationSink> NotificationSink for (A, B) {
    fn notify(&self, message: &str, severity: Severity) {
        self.0.notify(message, severity);
        self.1.notify(message, severity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_records_in_order() {
        let log = NotificationLog::new(8);
        log.notify("Clip added", Severity::Success);
        log.notify("Nothing to undo", Severity::Info);

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "Clip added");
        assert_eq!(log.last().unwrap().severity, Severity::Info);
    }

    #[test]
    fn test_log_is_bounded() {
        let log = NotificationLog::new(3);
        for i in 0..5 {
            log.notify(&format!("message {i}"), Severity::Info);
        }
        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].message, "message 2");
    }

    #[test]
    fn test_clones_share_buffer() {
        let log = NotificationLog::new(4);
        let handle = log.clone();
        let sink: Box<dyn NotificationSink> = Box::new((TracingSink, log));
        sink.notify("Save failed", Severity::Error);
        assert_eq!(handle.with_severity(Severity::Error).len(), 1);
        assert!(handle.with_severity(Severity::Success).is_empty());
    }
}
