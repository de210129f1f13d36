//! Persistence for Easel documents and uploaded assets.
//!
//! Two trait seams keep the collaboration layer storage-agnostic:
//! [`DocumentStore`] for canvas documents (in-memory or RocksDB) and
//! [`AssetStore`] for uploaded media (local filesystem). Documents are
//! persisted whole as [`DocumentRecord`]s — snapshot, history, and
//! metadata together, last write wins.

pub mod assets;
pub mod memory;
pub mod rocks;

use easel_core::{Document, DocumentId, History, Snapshot};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use assets::FsAssetStore;
pub use memory::MemoryStore;
pub use rocks::{RocksStore, StoreConfig};

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("document not found: {0}")]
    NotFound(DocumentId),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("compression error: {0}")]
    Compression(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for StoreError {
    fn from(e: rocksdb::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Persisted form of a [`Document`].
///
/// The history is flattened into entries and index so the record has no
/// behavior of its own; rehydration clamps the index back into range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub version: u64,
    pub updated_at: u64,
    pub current: Snapshot,
    pub history_entries: Vec<Snapshot>,
    pub history_index: usize,
}

impl DocumentRecord {
    /// Capture a document for persistence.
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id,
            title: doc.title.clone(),
            width: doc.width,
            height: doc.height,
            version: doc.version,
            updated_at: doc.updated_at,
            current: doc.current.clone(),
            history_entries: doc.history.entries().to_vec(),
            history_index: doc.history.index(),
        }
    }

    /// Rehydrate the live document.
    pub fn into_document(self) -> Document {
        Document {
            id: self.id,
            title: self.title,
            width: self.width,
            height: self.height,
            version: self.version,
            updated_at: self.updated_at,
            current: self.current,
            history: History::from_parts(self.history_entries, self.history_index),
        }
    }
}

/// Document persistence seam.
pub trait DocumentStore: Send + Sync {
    /// Fetch a record, `None` when the document was never persisted.
    fn get(&self, id: DocumentId) -> Result<Option<DocumentRecord>, StoreError>;

    /// Write a record, replacing any previous version.
    fn put(&self, record: &DocumentRecord) -> Result<(), StoreError>;

    /// Remove a record. Deleting an absent document is a no-op.
    fn delete(&self, id: DocumentId) -> Result<(), StoreError>;

    /// All persisted document ids.
    fn list(&self) -> Result<Vec<DocumentId>, StoreError>;
}

/// Uploaded-media persistence seam.
pub trait AssetStore: Send + Sync {
    /// Store raw bytes under a fresh name; returns the public URL.
    fn store(&self, bytes: &[u8], content_type: &str) -> Result<String, StoreError>;

    /// Remove a previously stored asset. Missing assets are a no-op.
    fn delete(&self, url: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_round_trips_document() {
        let mut doc = Document::new("poster");
        doc.save(Snapshot::new(json!({"layers": [1]})));
        doc.save(Snapshot::new(json!({"layers": [1, 2]})));
        doc.save(Snapshot::new(json!({"layers": [1, 2, 3]})));
        doc.undo().unwrap();

        let record = DocumentRecord::from_document(&doc);
        let back = record.into_document();

        assert_eq!(back.id, doc.id);
        assert_eq!(back.version, doc.version);
        assert_eq!(back.current, doc.current);
        assert_eq!(back.history, doc.history);
    }
}
