//! Native collaboration client.
//!
//! Connects to a document room and exposes two halves: a typed `send` for
//! outgoing messages and an event receiver for everything the server
//! relays in. Used by the integration tests and by native tooling; the
//! browser editor speaks the same wire protocol directly.

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use easel_core::DocumentId;
use futures_util::{SinkExt, StreamExt};

use crate::protocol::ChannelMessage;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("connection closed")]
    Closed,
}

/// A connected room member.
pub struct CollabClient {
    outgoing: mpsc::Sender<ChannelMessage>,
    events: Option<mpsc::Receiver<ChannelMessage>>,
}

impl CollabClient {
    /// Connect to a document room on `base_url` (e.g. `ws://127.0.0.1:9090`).
    pub async fn connect(base_url: &str, doc_id: DocumentId) -> Result<Self, ClientError> {
        let url = room_url(base_url, doc_id);
        let (ws_stream, _) = connect_async(url.as_str()).await?;
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        let (outgoing, mut outgoing_rx) = mpsc::channel::<ChannelMessage>(64);
        let (event_tx, event_rx) = mpsc::channel::<ChannelMessage>(64);

        // Writer: typed messages out. Ends when the client is dropped.
        tokio::spawn(async move {
            while let Some(msg) = outgoing_rx.recv().await {
                let encoded = match msg.encode() {
                    Ok(text) => text,
                    Err(e) => {
                        log::warn!("failed to encode outgoing message: {e}");
                        continue;
                    }
                };
                if ws_sender.send(Message::text(encoded)).await.is_err() {
                    break;
                }
            }
            let _ = ws_sender.send(Message::Close(None)).await;
        });

        // Reader: decoded frames in. Ends when the server closes.
        tokio::spawn(async move {
            while let Some(frame) = ws_receiver.next().await {
                match frame {
                    Ok(Message::Text(text)) => match ChannelMessage::decode(text.as_str()) {
                        Ok(msg) => {
                            if event_tx.send(msg).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => log::warn!("undecodable frame from server: {e}"),
                    },
                    Ok(Message::Close(_)) | Err(_) => break,
                    _ => {}
                }
            }
        });

        Ok(Self {
            outgoing,
            events: Some(event_rx),
        })
    }

    /// Send a message to the room.
    pub async fn send(&self, msg: ChannelMessage) -> Result<(), ClientError> {
        self.outgoing.send(msg).await.map_err(|_| ClientError::Closed)
    }

    /// Take the incoming event receiver. Yields `None` after the first call.
    pub fn take_event_rx(&mut self) -> Option<mpsc::Receiver<ChannelMessage>> {
        self.events.take()
    }
}

fn room_url(base_url: &str, doc_id: DocumentId) -> String {
    format!("{}/ws/{doc_id}", base_url.trim_end_matches('/'))
}
