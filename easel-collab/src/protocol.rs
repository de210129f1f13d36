//! Wire protocol for collaboration channels.
//!
//! Messages travel as JSON text frames, discriminated by a `"type"` field:
//!
//! - `canvas_update`, `cursor_move`, `selection_change` — client events,
//!   relayed verbatim to the other members of the room
//! - `ping` / `pong` — liveness, answered directly to the sender
//! - `member_joined` / `member_left` — server-emitted membership changes
//!
//! Payloads inside `changes` and `selected` are opaque to the backend; the
//! editor frontends agree on their schema among themselves.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Codec errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to encode message: {0}")]
    Encode(String),

    #[error("malformed message: {0}")]
    Malformed(String),
}

/// A collaboration channel message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelMessage {
    /// Canvas content changed; `changes` is an opaque edit list.
    CanvasUpdate {
        #[serde(default)]
        changes: Vec<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<String>,
    },

    /// A collaborator's cursor moved.
    CursorMove {
        x: f64,
        y: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<String>,
    },

    /// A collaborator's selection changed.
    SelectionChange {
        #[serde(default)]
        selected: Vec<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<String>,
    },

    /// Liveness probe from a client.
    Ping,

    /// Direct reply to a ping.
    Pong,

    /// A member joined the room; `count` includes the joiner.
    MemberJoined { count: usize },

    /// A member left the room; `count` is the remaining size.
    MemberLeft { count: usize },
}

impl ChannelMessage {
    pub fn canvas_update(changes: Vec<Value>, sender: Option<String>) -> Self {
        Self::CanvasUpdate { changes, sender }
    }

    pub fn cursor_move(x: f64, y: f64, user: Option<String>) -> Self {
        Self::CursorMove { x, y, user }
    }

    pub fn selection_change(selected: Vec<Value>, user: Option<String>) -> Self {
        Self::SelectionChange { selected, user }
    }

    pub fn member_joined(count: usize) -> Self {
        Self::MemberJoined { count }
    }

    pub fn member_left(count: usize) -> Self {
        Self::MemberLeft { count }
    }

    /// Message kind for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CanvasUpdate { .. } => "canvas_update",
            Self::CursorMove { .. } => "cursor_move",
            Self::SelectionChange { .. } => "selection_change",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::MemberJoined { .. } => "member_joined",
            Self::MemberLeft { .. } => "member_left",
        }
    }

    /// Encode to a JSON text frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Decode from a JSON text frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}
