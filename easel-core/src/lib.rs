//! Core document model for the Easel canvas editor.
//!
//! A document's canvas content is an opaque JSON [`Snapshot`] — the backend
//! never interprets layer structure, it stores and replays whole states.
//! Undo/redo is a bounded [`History`] of archived snapshots with a movable
//! index; [`Document`] ties snapshot, history, and metadata together.

pub mod document;
pub mod history;
pub mod snapshot;

pub use document::{Document, DocumentId, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};
pub use history::{History, HistoryError, HISTORY_LIMIT};
pub use snapshot::Snapshot;
