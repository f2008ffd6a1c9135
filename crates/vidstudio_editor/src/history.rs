// SPDX-License-Identifier: MIT OR Apache-2.0
//! Linear undo/redo history of timeline snapshots.
//!
//! Every entry is a serialized copy of the [`TimelineState`], so later
//! edits to the live timeline can never reach back into a stored entry.
//! Pushing while the cursor is behind the newest entry drops everything
//! after the cursor first.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use vidstudio_timeline::TimelineState;

/// Default maximum undo history depth
pub const MAX_HISTORY: usize = 100;

/// History errors
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Serialized state data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Serialized timeline state
    pub data: Vec<u8>,
    /// Timestamp when snapshot was taken
    pub timestamp: u64,
    /// Size in bytes
    pub size: usize,
}

impl StateSnapshot {
    /// Create a new state snapshot
    pub fn new(data: Vec<u8>) -> Self {
        let size = data.len();
        Self {
            data,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            size,
        }
    }

    /// Create from serializable value
    pub fn from_value<T: Serialize>(value: &T) -> Result<Self> {
        let data = bincode::serialize(value)?;
        Ok(Self::new(data))
    }

    /// Deserialize to value
    pub fn to_value<T: for<'de> Deserialize<'de>>(&self) -> Result<T> {
        Ok(bincode::deserialize(&self.data)?)
    }
}

/// One point in the history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Human-readable description of the edit that produced this state
    pub description: String,
    /// Timeline state after the edit
    pub snapshot: StateSnapshot,
}

impl HistoryEntry {
    /// Decode the stored timeline state
    pub fn state(&self) -> Result<TimelineState> {
        self.snapshot.to_value()
    }
}

/// History statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Entries stored
    pub entries: usize,
    /// Steps available to undo
    pub undo_count: usize,
    /// Steps available to redo
    pub redo_count: usize,
    /// Total memory used by history (bytes)
    pub memory_used: usize,
    /// Maximum history depth
    pub max_depth: usize,
}

/// Undo/redo history manager
#[derive(Debug)]
pub struct History {
    entries: Vec<HistoryEntry>,
    /// Index of the current entry; `None` while empty
    cursor: Option<usize>,
    max_depth: usize,
    memory_used: usize,
}

impl History {
    /// Create a new history manager
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            max_depth: max_depth.max(1),
            memory_used: 0,
        }
    }

    /// Record the state after an edit
    pub fn snapshot(&mut self, state: &TimelineState, description: impl Into<String>) -> Result<()> {
        let snapshot = StateSnapshot::from_value(state)?;

        // Branch: drop everything after the cursor
        let keep = self.cursor.map_or(0, |c| c + 1);
        for dropped in self.entries.drain(keep..) {
            self.memory_used = self.memory_used.saturating_sub(dropped.snapshot.size);
        }

        self.memory_used += snapshot.size;
        self.entries.push(HistoryEntry {
            description: description.into(),
            snapshot,
        });

        // Enforce history limit
        while self.entries.len() > self.max_depth {
            let old = self.entries.remove(0);
            self.memory_used = self.memory_used.saturating_sub(old.snapshot.size);
        }

        self.cursor = Some(self.entries.len() - 1);
        Ok(())
    }

    /// Step back one entry and return its state
    pub fn undo(&mut self) -> Result<TimelineState> {
        let cursor = match self.cursor {
            Some(c) if c > 0 => c - 1,
            _ => return Err(HistoryError::NothingToUndo),
        };
        let state = self.entries[cursor].state()?;
        self.cursor = Some(cursor);
        Ok(state)
    }

    /// Step forward one entry and return its state
    pub fn redo(&mut self) -> Result<TimelineState> {
        let cursor = match self.cursor {
            Some(c) if c + 1 < self.entries.len() => c + 1,
            _ => return Err(HistoryError::NothingToRedo),
        };
        let state = self.entries[cursor].state()?;
        self.cursor = Some(cursor);
        Ok(state)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.entries.len())
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the current entry
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The current entry
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    /// Stored entries, oldest first
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
        self.memory_used = 0;
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        let (undo_count, redo_count) = match self.cursor {
            Some(c) => (c, self.entries.len() - c - 1),
            None => (0, 0),
        };
        HistoryStats {
            entries: self.entries.len(),
            undo_count,
            redo_count,
            memory_used: self.memory_used,
            max_depth: self.max_depth,
        }
    }

    /// Description of the edit an undo would revert
    pub fn undo_description(&self) -> Option<&str> {
        self.can_undo()
            .then(|| self.current().map(|e| e.description.as_str()))
            .flatten()
    }

    /// Description of the edit a redo would reapply
    pub fn redo_description(&self) -> Option<&str> {
        if !self.can_redo() {
            return None;
        }
        let next = self.cursor.map_or(0, |c| c + 1);
        self.entries.get(next).map(|e| e.description.as_str())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidstudio_timeline::{Clip, MediaId};

    fn state(clips: usize, tracks: usize) -> TimelineState {
        TimelineState {
            clips: (0..clips)
                .map(|i| Clip::new(MediaId::new(), format!("clip {i}"), 0, 5.0))
                .collect(),
            track_count: tracks,
        }
    }

    #[test]
    fn test_empty_history() {
        let mut history = History::new();
        assert!(history.is_empty());
        assert!(matches!(history.undo(), Err(HistoryError::NothingToUndo)));
        assert!(matches!(history.redo(), Err(HistoryError::NothingToRedo)));
    }

    #[test]
    fn test_cursor_tracks_newest_entry() {
        let mut history = History::new();
        for i in 1..=4 {
            history.snapshot(&state(i, 1), "Add clip").unwrap();
            assert_eq!(history.len(), i);
            assert_eq!(history.cursor(), Some(i - 1));
        }
    }

    #[test]
    fn test_single_entry_cannot_undo() {
        let mut history = History::new();
        history.snapshot(&state(1, 1), "Add clip").unwrap();
        assert!(!history.can_undo());
        assert!(matches!(history.undo(), Err(HistoryError::NothingToUndo)));
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut history = History::new();
        let a = state(1, 1);
        let b = state(2, 2);
        history.snapshot(&a, "A").unwrap();
        history.snapshot(&b, "B").unwrap();

        assert_eq!(history.undo().unwrap(), a);
        assert_eq!(history.redo().unwrap(), b);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_push_after_undo_truncates_branch() {
        let mut history = History::new();
        let (a, b, c, d) = (state(1, 1), state(2, 1), state(3, 1), state(1, 2));
        history.snapshot(&a, "A").unwrap();
        history.snapshot(&b, "B").unwrap();
        history.snapshot(&c, "C").unwrap();

        history.undo().unwrap();
        assert_eq!(history.cursor(), Some(1));
        history.snapshot(&d, "D").unwrap();

        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), Some(2));
        assert!(matches!(history.redo(), Err(HistoryError::NothingToRedo)));
        assert_eq!(history.undo().unwrap(), b);
        assert_eq!(history.redo().unwrap(), d);
    }

    #[test]
    fn test_snapshot_is_a_value_copy() {
        let mut history = History::new();
        let mut live = state(1, 1);
        history.snapshot(&live, "A").unwrap();
        let stored = live.clone();

        live.clips[0].name = "renamed".to_string();
        live.track_count = 7;
        history.snapshot(&live, "B").unwrap();

        assert_eq!(history.undo().unwrap(), stored);
    }

    #[test]
    fn test_depth_limit_drops_oldest() {
        let mut history = History::with_max_depth(3);
        for i in 1..=5 {
            history.snapshot(&state(i, 1), format!("step {i}")).unwrap();
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), Some(2));
        assert_eq!(history.entries()[0].description, "step 3");
        assert_eq!(history.stats().undo_count, 2);
    }

    #[test]
    fn test_descriptions() {
        let mut history = History::new();
        history.snapshot(&state(1, 1), "Add clip").unwrap();
        history.snapshot(&state(1, 2), "Add track").unwrap();
        assert_eq!(history.undo_description(), Some("Add track"));
        assert_eq!(history.redo_description(), None);

        history.undo().unwrap();
        assert_eq!(history.undo_description(), None);
        assert_eq!(history.redo_description(), Some("Add track"));
    }

    #[test]
    fn test_stats_memory() {
        let mut history = History::new();
        history.snapshot(&state(2, 1), "A").unwrap();
        let stats = history.stats();
        assert_eq!(stats.entries, 1);
        assert!(stats.memory_used > 0);
        history.clear();
        assert_eq!(history.stats().memory_used, 0);
        assert_eq!(history.cursor(), None);
    }
}
