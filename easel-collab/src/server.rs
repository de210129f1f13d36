//! WebSocket front end for collaboration sessions.
//!
//! Clients connect to `ws://host/ws/{document_id}`; the path is the room
//! key, checked during the handshake. Each connection gets one task and
//! one bounded outbox. The loop selects between socket input (decoded and
//! routed through the coordinator) and outbox output (relayed messages
//! from other members). Every exit path funnels to a single `leave`, so
//! the room sees exactly one departure per connection.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

use easel_core::DocumentId;
use thiserror::Error;

use crate::protocol::{ChannelMessage, ProtocolError};
use crate::relay::ConnectionHandle;
use crate::session::SessionCoordinator;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: String,
    /// Outbox capacity per connection (messages buffered before a slow
    /// consumer starts losing them)
    pub outbox_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:9090".to_string(),
            outbox_capacity: 256,
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// The collaboration server.
pub struct CollabServer {
    config: ServerConfig,
    coordinator: Arc<SessionCoordinator>,
}

impl CollabServer {
    pub fn new(config: ServerConfig, coordinator: Arc<SessionCoordinator>) -> Self {
        Self { config, coordinator }
    }

    pub fn coordinator(&self) -> &Arc<SessionCoordinator> {
        &self.coordinator
    }

    /// Get the configured bind address.
    pub fn bind_addr(&self) -> &str {
        &self.config.bind_addr
    }

    /// Start listening for WebSocket connections.
    ///
    /// Runs the accept loop; call from an async runtime.
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        log::info!("collab server listening on {}", self.config.bind_addr);

        loop {
            let (stream, addr) = listener.accept().await?;
            log::debug!("new TCP connection from {addr}");

            let coordinator = self.coordinator.clone();
            let outbox_capacity = self.config.outbox_capacity;

            tokio::spawn(async move {
                if let Err(e) =
                    Self::handle_connection(stream, addr, coordinator, outbox_capacity).await
                {
                    log::error!("connection error from {addr}: {e}");
                }
            });
        }
    }

    /// Handle a single WebSocket connection for its whole lifetime.
    async fn handle_connection(
        stream: TcpStream,
        addr: SocketAddr,
        coordinator: Arc<SessionCoordinator>,
        outbox_capacity: usize,
    ) -> Result<(), ServerError> {
        // The handshake carries the room: /ws/{document_id}
        let mut doc_id: Option<DocumentId> = None;
        let ws_stream = tokio_tungstenite::accept_hdr_async(
            stream,
            |req: &Request, resp: Response| match parse_document_path(req.uri().path()) {
                Some(id) => {
                    doc_id = Some(id);
                    Ok(resp)
                }
                None => {
                    let mut reject =
                        ErrorResponse::new(Some("expected path /ws/{document_id}".into()));
                    *reject.status_mut() = StatusCode::BAD_REQUEST;
                    Err(reject)
                }
            },
        )
        .await?;

        let doc_id = match doc_id {
            Some(id) => id,
            // Handshake was rejected; nothing joined, nothing to clean up
            None => return Ok(()),
        };

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let conn_id = Uuid::new_v4();
        let (outbox_tx, mut outbox_rx) = mpsc::channel::<ChannelMessage>(outbox_capacity);

        coordinator
            .join(doc_id, ConnectionHandle::new(conn_id, outbox_tx))
            .await;
        log::info!("connection {conn_id} from {addr} on doc {doc_id}");

        let result: Result<(), ServerError> = loop {
            tokio::select! {
                // Incoming WebSocket frame
                frame = ws_receiver.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            match ChannelMessage::decode(text.as_str()) {
                                Ok(msg) => {
                                    log::trace!("{} from {conn_id} on doc {doc_id}", msg.kind());
                                    if let Some(reply) = coordinator.route(doc_id, conn_id, msg).await {
                                        let encoded = reply.encode()?;
                                        if ws_sender.send(Message::text(encoded)).await.is_err() {
                                            break Ok(());
                                        }
                                    }
                                }
                                Err(e) => {
                                    log::warn!("malformed message from {conn_id}: {e}");
                                }
                            }
                        }

                        Some(Ok(Message::Ping(data))) => {
                            if ws_sender.send(Message::Pong(data)).await.is_err() {
                                break Ok(());
                            }
                        }

                        Some(Ok(Message::Close(_))) | None => {
                            log::info!("connection {conn_id} closed");
                            break Ok(());
                        }

                        Some(Err(e)) => {
                            log::debug!("websocket error from {conn_id}: {e}");
                            break Ok(());
                        }

                        _ => {}
                    }
                }

                // Relayed message from another member
                msg = outbox_rx.recv() => {
                    match msg {
                        Some(msg) => {
                            let encoded = msg.encode()?;
                            if ws_sender.send(Message::text(encoded)).await.is_err() {
                                break Ok(());
                            }
                        }
                        // Relay reaped us; the room is already cleaned up
                        None => break Ok(()),
                    }
                }
            }
        };

        coordinator.leave(doc_id, conn_id).await;
        log::info!("connection {conn_id} left doc {doc_id}");
        result
    }
}

/// Extract the document id from a `/ws/{document_id}` request path.
fn parse_document_path(path: &str) -> Option<DocumentId> {
    let rest = path.strip_prefix("/ws/")?;
    Uuid::parse_str(rest.trim_end_matches('/')).ok()
}
