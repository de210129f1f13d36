//! Realtime collaboration for the Easel canvas editor.
//!
//! Architecture:
//! ```text
//! Client A ──┐
//!             ├── CollabServer (ws://.../ws/{doc_id})
//! Client B ──┘          │
//!                        ▼
//!              SessionCoordinator ── Document (history engine)
//!                   │         │
//!                   │         └── DocumentStore (memory / RocksDB)
//!                   ▼
//!                 Relay ── per-connection outboxes
//!                   │
//!        ┌──────────┼──────────┐
//!        ▼          ▼          ▼
//!    Client A   Client B   Client C
//! ```
//!
//! The relay fans editing and presence events out to every other member of
//! a document room; the coordinator serializes saves and undo/redo per
//! document and persists through the store seam. Messages are JSON text
//! frames — the browser editor is the primary client.

pub mod client;
pub mod protocol;
pub mod relay;
pub mod server;
pub mod session;

pub use client::{ClientError, CollabClient};
pub use protocol::{ChannelMessage, ProtocolError};
pub use relay::{ConnectionHandle, ConnectionId, Relay, RelayStats};
pub use server::{CollabServer, ServerConfig, ServerError};
pub use session::{DocumentState, SessionCoordinator, SessionError};
