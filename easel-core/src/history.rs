//! Bounded undo/redo history.
//!
//! Each save archives the *previous* canvas state; the live state is held
//! by the document, not the history. Undo and redo only move the index and
//! hand back the entry it lands on — entries themselves are immutable once
//! archived. A save while the index sits mid-history truncates the redo
//! tail, so redone states past the index are unreachable after a new save.
//!
//! Capacity is 50 archived states per document. When the 51st entry would
//! be archived, the oldest is discarded.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::snapshot::Snapshot;

/// Maximum archived states per document.
pub const HISTORY_LIMIT: usize = 50;

/// Undo/redo boundary errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// The index is already at the reachable edge of the history.
    #[error("no history available in that direction")]
    NoHistory,
}

/// Archived canvas states with a movable position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    entries: Vec<Snapshot>,
    index: usize,
}

impl History {
    /// Fresh history with no archived states.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate from persisted parts.
    ///
    /// The index is clamped into the entry range so a corrupt record can
    /// never index out of bounds.
    pub fn from_parts(entries: Vec<Snapshot>, index: usize) -> Self {
        let index = index.min(entries.len().saturating_sub(1));
        Self { entries, index }
    }

    /// Archived entries, oldest first.
    pub fn entries(&self) -> &[Snapshot] {
        &self.entries
    }

    /// Current position within the entries.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of archived states.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been archived yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Archive the state being replaced by a save.
    ///
    /// An empty `previous` (first save of a document) is skipped entirely:
    /// neither entries nor index change. Otherwise the redo tail past the
    /// index is dropped, `previous` is appended, the oldest entries beyond
    /// [`HISTORY_LIMIT`] are discarded, and the index moves to the new end.
    pub fn record(&mut self, previous: &Snapshot) {
        if previous.is_empty() {
            return;
        }

        self.entries.truncate(self.index + 1);
        self.entries.push(previous.clone());

        if self.entries.len() > HISTORY_LIMIT {
            let excess = self.entries.len() - HISTORY_LIMIT;
            self.entries.drain(..excess);
        }

        self.index = self.entries.len() - 1;
    }

    /// Step back one state.
    ///
    /// Fails with [`HistoryError::NoHistory`] when the index is already at
    /// the floor; the entry at index 0 is the floor and is never returned
    /// by undo.
    pub fn undo(&mut self) -> Result<Snapshot, HistoryError> {
        if self.entries.is_empty() || self.index == 0 {
            return Err(HistoryError::NoHistory);
        }
        self.index -= 1;
        Ok(self.entries[self.index].clone())
    }

    /// Step forward one state.
    ///
    /// Fails with [`HistoryError::NoHistory`] at the newest entry.
    pub fn redo(&mut self) -> Result<Snapshot, HistoryError> {
        if self.entries.is_empty() || self.index + 1 >= self.entries.len() {
            return Err(HistoryError::NoHistory);
        }
        self.index += 1;
        Ok(self.entries[self.index].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snap(n: u64) -> Snapshot {
        Snapshot::new(json!({"state": n}))
    }

    #[test]
    fn test_first_save_archives_nothing() {
        let mut history = History::new();
        history.record(&Snapshot::empty());
        assert!(history.is_empty());
        assert_eq!(history.index(), 0);
    }

    #[test]
    fn test_null_previous_archives_nothing() {
        let mut history = History::new();
        history.record(&Snapshot::new(serde_json::Value::Null));
        assert!(history.is_empty());
    }

    #[test]
    fn test_second_save_archives_first_state() {
        let mut history = History::new();
        history.record(&Snapshot::empty()); // save 1
        history.record(&snap(1)); // save 2 archives S1

        assert_eq!(history.entries(), &[snap(1)]);
        assert_eq!(history.index(), 0);
    }

    #[test]
    fn test_undo_fails_at_floor() {
        let mut history = History::new();
        assert_eq!(history.undo(), Err(HistoryError::NoHistory));

        // Two saves leave a single entry at index 0 — still nothing to undo to
        history.record(&Snapshot::empty());
        history.record(&snap(1));
        assert_eq!(history.undo(), Err(HistoryError::NoHistory));
    }

    #[test]
    fn test_redo_fails_at_newest() {
        let mut history = History::new();
        assert_eq!(history.redo(), Err(HistoryError::NoHistory));

        history.record(&snap(1));
        history.record(&snap(2));
        assert_eq!(history.redo(), Err(HistoryError::NoHistory));
    }

    #[test]
    fn test_undo_walks_back() {
        let mut history = History::new();
        // Saves of S1..S4: archives S1, S2, S3
        history.record(&Snapshot::empty());
        for n in 1..=3 {
            history.record(&snap(n));
        }
        assert_eq!(history.entries().len(), 3);
        assert_eq!(history.index(), 2);

        assert_eq!(history.undo(), Ok(snap(2)));
        assert_eq!(history.undo(), Ok(snap(1)));
        assert_eq!(history.undo(), Err(HistoryError::NoHistory));
    }

    #[test]
    fn test_undo_then_redo_returns_to_same_entry() {
        let mut history = History::new();
        history.record(&Snapshot::empty());
        for n in 1..=3 {
            history.record(&snap(n));
        }

        assert_eq!(history.undo(), Ok(snap(2)));
        assert_eq!(history.undo(), Ok(snap(1)));
        assert_eq!(history.redo(), Ok(snap(2)));
        assert_eq!(history.redo(), Ok(snap(3)));
        assert_eq!(history.redo(), Err(HistoryError::NoHistory));
    }

    #[test]
    fn test_undo_redo_leave_entries_untouched() {
        let mut history = History::new();
        history.record(&snap(1));
        history.record(&snap(2));
        history.record(&snap(3));
        let before = history.entries().to_vec();

        let _ = history.undo();
        let _ = history.undo();
        let _ = history.redo();

        assert_eq!(history.entries(), before.as_slice());
    }

    #[test]
    fn test_save_after_undo_truncates_redo_tail() {
        let mut history = History::new();
        history.record(&snap(1));
        history.record(&snap(2));
        history.record(&snap(3));
        assert_eq!(history.index(), 2);

        let restored = history.undo().unwrap();
        assert_eq!(restored, snap(2));

        // Saving from the restored state: the tail past the index is gone
        // and the restored state is archived again at the end.
        history.record(&restored);
        assert_eq!(history.entries(), &[snap(1), snap(2), snap(2)]);
        assert_eq!(history.index(), 2);
        assert_eq!(history.redo(), Err(HistoryError::NoHistory));
    }

    #[test]
    fn test_capacity_holds_fifty() {
        let mut history = History::new();
        history.record(&Snapshot::empty());
        // Saves of S1..S51 archive S1..S50 — exactly at capacity
        for n in 1..=50 {
            history.record(&snap(n));
        }
        assert_eq!(history.len(), 50);
        assert_eq!(history.entries()[0], snap(1));
        assert_eq!(history.index(), 49);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = History::new();
        history.record(&Snapshot::empty());
        for n in 1..=51 {
            history.record(&snap(n));
        }
        assert_eq!(history.len(), 50);
        assert_eq!(history.entries()[0], snap(2));
        assert_eq!(history.entries()[49], snap(51));
        assert_eq!(history.index(), 49);
    }

    #[test]
    fn test_from_parts_clamps_index() {
        let history = History::from_parts(vec![snap(1), snap(2)], 99);
        assert_eq!(history.index(), 1);

        let empty = History::from_parts(Vec::new(), 7);
        assert_eq!(empty.index(), 0);
    }

    #[test]
    fn test_serde_round_trip() {
        let mut history = History::new();
        history.record(&snap(1));
        history.record(&snap(2));
        let _ = history.undo();

        let text = serde_json::to_string(&history).unwrap();
        let back: History = serde_json::from_str(&text).unwrap();
        assert_eq!(back, history);
    }
}
