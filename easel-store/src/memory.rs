//! In-memory document store for tests and persistence-free deployments.

use std::collections::HashMap;
use std::sync::RwLock;

use easel_core::DocumentId;

use crate::{DocumentRecord, DocumentStore, StoreError};

/// HashMap-backed store. Contents are lost on drop.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<DocumentId, DocumentRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        read(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, id: DocumentId) -> Result<Option<DocumentRecord>, StoreError> {
        Ok(read(&self.records).get(&id).cloned())
    }

    fn put(&self, record: &DocumentRecord) -> Result<(), StoreError> {
        write(&self.records).insert(record.id, record.clone());
        Ok(())
    }

    fn delete(&self, id: DocumentId) -> Result<(), StoreError> {
        write(&self.records).remove(&id);
        Ok(())
    }

    fn list(&self) -> Result<Vec<DocumentId>, StoreError> {
        Ok(read(&self.records).keys().copied().collect())
    }
}

// A poisoned lock only means a writer panicked mid-insert on a HashMap of
// owned values; the map itself is still consistent, so recover the guard.
fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}
