//! Per-document session coordination.
//!
//! The coordinator owns the live [`Document`]s, one `Mutex` each, so saves
//! and undo/redo on the same document serialize while different documents
//! proceed in parallel. Every mutation is persisted through the
//! [`DocumentStore`] seam before the result is visible to collaborators;
//! the store is last-write-wins, ordering between concurrent savers of the
//! same document comes from the per-document lock.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use easel_core::{Document, DocumentId, HistoryError, Snapshot};
use easel_store::{DocumentRecord, DocumentStore, StoreError};
use serde_json::Value;
use thiserror::Error;

use crate::protocol::ChannelMessage;
use crate::relay::{ConnectionHandle, ConnectionId, Relay};

/// Coordination errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Point-in-time view of a document and its room.
#[derive(Debug, Clone)]
pub struct DocumentState {
    pub snapshot: Snapshot,
    pub version: u64,
    pub members: usize,
}

/// Composes the history engine, the relay, and the document store.
pub struct SessionCoordinator {
    relay: Arc<Relay>,
    store: Arc<dyn DocumentStore>,
    documents: RwLock<HashMap<DocumentId, Arc<Mutex<Document>>>>,
}

impl SessionCoordinator {
    pub fn new(relay: Arc<Relay>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            relay,
            store,
            documents: RwLock::new(HashMap::new()),
        }
    }

    pub fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }

    /// Save a new canvas state.
    ///
    /// Loads (or creates) the document, archives the outgoing state
    /// through its history, persists, then fans `canvas_update` out to the
    /// other room members — the saver already has this state.
    /// Returns the new version.
    pub async fn save(
        &self,
        doc_id: DocumentId,
        snapshot: Snapshot,
        changes: Vec<Value>,
        sender: Option<String>,
        from: Option<ConnectionId>,
    ) -> Result<u64, SessionError> {
        let entry = self.document_or_create(doc_id).await?;
        let version = {
            let mut doc = entry.lock().await;
            doc.save(snapshot);
            self.store.put(&DocumentRecord::from_document(&doc))?;
            doc.version
        };

        self.relay
            .broadcast(doc_id, &ChannelMessage::canvas_update(changes, sender), from)
            .await;
        Ok(version)
    }

    /// Step the document back one state. The restored snapshot goes to
    /// the requester only; nothing is broadcast.
    pub async fn undo(&self, doc_id: DocumentId) -> Result<Snapshot, SessionError> {
        let entry = self.document(doc_id).await?;
        let mut doc = entry.lock().await;
        let restored = doc.undo()?;
        self.store.put(&DocumentRecord::from_document(&doc))?;
        log::debug!("doc {doc_id} undo to history index {}", doc.history.index());
        Ok(restored)
    }

    /// Step the document forward one state after an undo.
    pub async fn redo(&self, doc_id: DocumentId) -> Result<Snapshot, SessionError> {
        let entry = self.document(doc_id).await?;
        let mut doc = entry.lock().await;
        let restored = doc.redo()?;
        self.store.put(&DocumentRecord::from_document(&doc))?;
        log::debug!("doc {doc_id} redo to history index {}", doc.history.index());
        Ok(restored)
    }

    /// Add a connection to the document's room.
    pub async fn join(&self, doc_id: DocumentId, handle: ConnectionHandle) {
        self.relay.join(doc_id, handle).await;
    }

    /// Remove a connection from the document's room.
    pub async fn leave(&self, doc_id: DocumentId, conn_id: ConnectionId) {
        self.relay.leave(doc_id, conn_id).await;
    }

    /// Route a client message.
    ///
    /// Editing and presence events are relayed verbatim to the other
    /// members; `ping` is answered with a direct `pong` (the returned
    /// message goes back to the sender only). Server-emitted kinds coming
    /// from a client are ignored.
    pub async fn route(
        &self,
        doc_id: DocumentId,
        from: ConnectionId,
        msg: ChannelMessage,
    ) -> Option<ChannelMessage> {
        match msg {
            ChannelMessage::Ping => Some(ChannelMessage::Pong),
            ChannelMessage::CanvasUpdate { .. }
            | ChannelMessage::CursorMove { .. }
            | ChannelMessage::SelectionChange { .. } => {
                self.relay.broadcast(doc_id, &msg, Some(from)).await;
                None
            }
            other => {
                log::debug!(
                    "ignoring {} from connection {from} (server-emitted kind)",
                    other.kind()
                );
                None
            }
        }
    }

    /// Current snapshot, version, and live member count.
    pub async fn state(&self, doc_id: DocumentId) -> Result<DocumentState, SessionError> {
        let entry = self.document(doc_id).await?;
        let (snapshot, version) = {
            let doc = entry.lock().await;
            (doc.current.clone(), doc.version)
        };
        Ok(DocumentState {
            snapshot,
            version,
            members: self.relay.member_count(doc_id).await,
        })
    }

    /// Drop a document from the cache and the store.
    pub async fn delete(&self, doc_id: DocumentId) -> Result<(), SessionError> {
        self.documents.write().await.remove(&doc_id);
        self.store.delete(doc_id)?;
        log::info!("doc {doc_id} deleted");
        Ok(())
    }

    /// Live document handle, loading from the store on first touch.
    async fn document(&self, doc_id: DocumentId) -> Result<Arc<Mutex<Document>>, SessionError> {
        match self.lookup(doc_id, false).await? {
            Some(entry) => Ok(entry),
            None => Err(SessionError::NotFound(doc_id)),
        }
    }

    /// Like [`Self::document`] but creates a fresh document when neither
    /// the cache nor the store knows the id.
    async fn document_or_create(
        &self,
        doc_id: DocumentId,
    ) -> Result<Arc<Mutex<Document>>, SessionError> {
        match self.lookup(doc_id, true).await? {
            Some(entry) => Ok(entry),
            None => Err(SessionError::NotFound(doc_id)),
        }
    }

    async fn lookup(
        &self,
        doc_id: DocumentId,
        create: bool,
    ) -> Result<Option<Arc<Mutex<Document>>>, SessionError> {
        // Fast path: read lock
        {
            let documents = self.documents.read().await;
            if let Some(entry) = documents.get(&doc_id) {
                return Ok(Some(entry.clone()));
            }
        }

        let mut documents = self.documents.write().await;
        // Double-check after acquiring write lock
        if let Some(entry) = documents.get(&doc_id) {
            return Ok(Some(entry.clone()));
        }

        let doc = match self.store.get(doc_id)? {
            Some(record) => record.into_document(),
            None if create => {
                log::info!("doc {doc_id} created");
                Document::with_id(doc_id, "Untitled")
            }
            None => return Ok(None),
        };

        let entry = Arc::new(Mutex::new(doc));
        documents.insert(doc_id, entry.clone());
        Ok(Some(entry))
    }
}
