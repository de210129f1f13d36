//! Canvas document: metadata, live snapshot, and history.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::history::{History, HistoryError};
use crate::snapshot::Snapshot;

/// Document identifier.
pub type DocumentId = Uuid;

/// Default canvas size in pixels.
pub const DEFAULT_CANVAS_WIDTH: u32 = 1920;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1080;

/// A design document.
///
/// `current` is the live canvas state; `history` holds archived states for
/// undo/redo. `version` increases on every save and only on saves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub version: u64,
    /// Seconds since epoch of the last mutation.
    pub updated_at: u64,
    pub current: Snapshot,
    pub history: History,
}

impl Document {
    /// New empty document with a fresh id and default canvas size.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title)
    }

    /// New empty document with a caller-chosen id.
    pub fn with_id(id: DocumentId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            version: 0,
            updated_at: epoch_secs(),
            current: Snapshot::empty(),
            history: History::new(),
        }
    }

    /// Replace the live state with a saved snapshot.
    ///
    /// Archives the outgoing state (unless it was empty) and bumps the
    /// version.
    pub fn save(&mut self, snapshot: Snapshot) {
        self.history.record(&self.current);
        self.current = snapshot;
        self.version += 1;
        self.updated_at = epoch_secs();
        log::debug!("doc {} saved, version {}", self.id, self.version);
    }

    /// Restore the previous archived state.
    pub fn undo(&mut self) -> Result<Snapshot, HistoryError> {
        let restored = self.history.undo()?;
        self.current = restored.clone();
        self.updated_at = epoch_secs();
        Ok(restored)
    }

    /// Re-apply the next archived state after an undo.
    pub fn redo(&mut self) -> Result<Snapshot, HistoryError> {
        let restored = self.history.redo()?;
        self.current = restored.clone();
        self.updated_at = epoch_secs();
        Ok(restored)
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snap(n: u64) -> Snapshot {
        Snapshot::new(json!({"state": n}))
    }

    #[test]
    fn test_new_document_defaults() {
        let doc = Document::new("Untitled");
        assert_eq!(doc.title, "Untitled");
        assert_eq!(doc.width, 1920);
        assert_eq!(doc.height, 1080);
        assert_eq!(doc.version, 0);
        assert!(doc.current.is_empty());
        assert!(doc.history.is_empty());
    }

    #[test]
    fn test_save_bumps_version() {
        let mut doc = Document::new("test");
        doc.save(snap(1));
        doc.save(snap(2));
        assert_eq!(doc.version, 2);
        assert_eq!(doc.current, snap(2));
    }

    #[test]
    fn test_first_save_leaves_history_empty() {
        let mut doc = Document::new("test");
        doc.save(snap(1));
        assert!(doc.history.is_empty());
    }

    #[test]
    fn test_undo_restores_archived_state() {
        let mut doc = Document::new("test");
        doc.save(snap(1));
        doc.save(snap(2));
        doc.save(snap(3));

        // History is [S1, S2] at index 1; undo lands on S1
        let restored = doc.undo().unwrap();
        assert_eq!(restored, snap(1));
        assert_eq!(doc.current, snap(1));
    }

    #[test]
    fn test_undo_does_not_bump_version() {
        let mut doc = Document::new("test");
        doc.save(snap(1));
        doc.save(snap(2));
        doc.save(snap(3));
        let version = doc.version;

        doc.undo().unwrap();
        assert_eq!(doc.version, version);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut doc = Document::new("test");
        for n in 1..=4 {
            doc.save(snap(n));
        }

        // History [S1, S2, S3] at index 2
        assert_eq!(doc.undo().unwrap(), snap(2));
        assert_eq!(doc.undo().unwrap(), snap(1));
        assert_eq!(doc.redo().unwrap(), snap(2));
        assert_eq!(doc.current, snap(2));
    }

    #[test]
    fn test_undo_empty_document_fails() {
        let mut doc = Document::new("test");
        assert_eq!(doc.undo(), Err(HistoryError::NoHistory));
        assert_eq!(doc.redo(), Err(HistoryError::NoHistory));
    }
}
