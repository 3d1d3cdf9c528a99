// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use chrono::Utc;
use std::sync::Mutex;

/// A captured log line waiting to be pushed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    /// Capture time in nanoseconds since the Unix epoch.
    pub timestamp_nanos: i64,
    /// The line exactly as it was written.
    pub value: Vec<u8>,
}

impl LogEntry {
    #[must_use]
    pub fn new(timestamp_nanos: i64, value: impl Into<Vec<u8>>) -> Self {
        LogEntry {
            timestamp_nanos,
            value: value.into(),
        }
    }

    /// Stamps `value` with the current wall-clock time.
    #[must_use]
    pub fn now(value: &[u8]) -> Self {
        LogEntry::new(Utc::now().timestamp_nanos_opt().unwrap_or_default(), value)
    }
}

/// In-memory, ordered buffer of log entries that decides when a flush is due.
///
/// The lock guards only the vector and its length check. A batch that reaches
/// the threshold is swapped out for an empty vector before the lock is
/// released, so callers never hold the lock while talking to the backend.
#[derive(Debug, Default)]
pub struct EntryBuffer {
    entries: Mutex<Vec<LogEntry>>,
    // 0 disables automatic flushing
    threshold: usize,
}

impl EntryBuffer {
    #[must_use]
    pub fn new(threshold: usize) -> Self {
        EntryBuffer {
            entries: Mutex::new(Vec::new()),
            threshold,
        }
    }

    /// Appends `entry` and returns the detached batch if the threshold was reached.
    pub fn append(&self, entry: LogEntry) -> Option<Vec<LogEntry>> {
        #[allow(clippy::expect_used)]
        let mut entries = self.entries.lock().expect("lock poisoned");
        entries.push(entry);
        self.detach_if_full(&mut entries)
    }

    /// Like [`EntryBuffer::append`], but takes the timestamp while holding the
    /// lock so entries of one batch are in capture order.
    pub fn capture(&self, value: &[u8]) -> Option<Vec<LogEntry>> {
        #[allow(clippy::expect_used)]
        let mut entries = self.entries.lock().expect("lock poisoned");
        entries.push(LogEntry::now(value));
        self.detach_if_full(&mut entries)
    }

    /// Detaches everything currently buffered, regardless of the threshold.
    pub fn drain(&self) -> Vec<LogEntry> {
        #[allow(clippy::expect_used)]
        let mut entries = self.entries.lock().expect("lock poisoned");
        std::mem::take(&mut *entries)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        #[allow(clippy::expect_used)]
        let entries = self.entries.lock().expect("lock poisoned");
        entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn detach_if_full(&self, entries: &mut Vec<LogEntry>) -> Option<Vec<LogEntry>> {
        if self.threshold > 0 && entries.len() >= self.threshold {
            Some(std::mem::take(entries))
        } else {
            None
        }
    }
}
