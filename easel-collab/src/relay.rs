//! Room-based fan-out of collaboration messages.
//!
//! Each open document is a room keyed by its id. Members are connection
//! handles wrapping a bounded outbox owned by the transport task; the
//! relay only ever `try_send`s, so one slow consumer cannot stall a
//! broadcast. A full outbox costs that connection one message (counted in
//! stats); a closed outbox means the transport is gone, and the connection
//! is reaped with the same cleanup a voluntary leave gets.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::RwLock;
use uuid::Uuid;

use easel_core::DocumentId;

use crate::protocol::ChannelMessage;

/// Connection identifier, assigned by the transport on accept.
pub type ConnectionId = Uuid;

/// Delivery failure. Handled inside the relay, never propagated past it.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("outbox closed for connection {0}")]
    ChannelSendFailure(ConnectionId),
}

/// A room member's delivery endpoint.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    outbox: mpsc::Sender<ChannelMessage>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, outbox: mpsc::Sender<ChannelMessage>) -> Self {
        Self { id, outbox }
    }
}

/// Relay statistics snapshot.
#[derive(Debug, Clone, Default)]
pub struct RelayStats {
    pub messages_sent: u64,
    pub messages_dropped: u64,
    pub active_rooms: usize,
}

/// Lock-free counters for the delivery hot path.
#[derive(Default)]
struct AtomicRelayStats {
    messages_sent: AtomicU64,
    messages_dropped: AtomicU64,
}

/// Room registry and message fan-out.
pub struct Relay {
    rooms: RwLock<HashMap<DocumentId, HashMap<ConnectionId, ConnectionHandle>>>,
    atomic_stats: AtomicRelayStats,
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}

impl Relay {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            atomic_stats: AtomicRelayStats::default(),
        }
    }

    /// Add a connection to a document's room, creating the room on first
    /// join. The other members are told via `member_joined` with the new
    /// room size. Re-joining is idempotent and notifies nobody.
    pub async fn join(&self, doc_id: DocumentId, handle: ConnectionHandle) {
        let conn_id = handle.id;
        let (already_member, count, others) = {
            let mut rooms = self.rooms.write().await;
            let room = rooms.entry(doc_id).or_default();
            let already_member = room.insert(conn_id, handle).is_some();
            let others: Vec<ConnectionHandle> = room
                .values()
                .filter(|h| h.id != conn_id)
                .cloned()
                .collect();
            (already_member, room.len(), others)
        };

        if already_member {
            log::debug!("connection {conn_id} re-joined doc {doc_id}");
            return;
        }

        log::info!("connection {conn_id} joined doc {doc_id} ({count} members)");
        let failed = self.deliver(&others, &ChannelMessage::member_joined(count));
        self.reap(doc_id, failed).await;
    }

    /// Remove a connection from a document's room. The remaining members
    /// are told via `member_left`; an empty room is dropped. Leaving a
    /// room the connection never joined is a no-op.
    pub async fn leave(&self, doc_id: DocumentId, conn_id: ConnectionId) {
        let Some((count, survivors)) = self.remove_member(doc_id, conn_id).await else {
            return;
        };

        log::info!("connection {conn_id} left doc {doc_id} ({count} members remain)");
        let failed = self.deliver(&survivors, &ChannelMessage::member_left(count));
        self.reap(doc_id, failed).await;
    }

    /// Fan a message out to every room member except `exclude`.
    ///
    /// An unknown room is a silent no-op. Dead connections discovered
    /// during delivery are reaped before this returns.
    pub async fn broadcast(
        &self,
        doc_id: DocumentId,
        msg: &ChannelMessage,
        exclude: Option<ConnectionId>,
    ) {
        let targets: Vec<ConnectionHandle> = {
            let rooms = self.rooms.read().await;
            match rooms.get(&doc_id) {
                Some(room) => room
                    .values()
                    .filter(|h| Some(h.id) != exclude)
                    .cloned()
                    .collect(),
                None => return,
            }
        };

        let failed = self.deliver(&targets, msg);
        self.reap(doc_id, failed).await;
    }

    /// Room size, 0 for unknown rooms.
    pub async fn member_count(&self, doc_id: DocumentId) -> usize {
        self.rooms
            .read()
            .await
            .get(&doc_id)
            .map_or(0, |room| room.len())
    }

    /// Number of rooms with at least one member.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Statistics snapshot.
    pub async fn stats(&self) -> RelayStats {
        RelayStats {
            messages_sent: self.atomic_stats.messages_sent.load(Ordering::Relaxed),
            messages_dropped: self.atomic_stats.messages_dropped.load(Ordering::Relaxed),
            active_rooms: self.rooms.read().await.len(),
        }
    }

    /// Deliver to each target, returning the connections whose outbox is
    /// closed. A full outbox drops this one message for that connection
    /// but the connection stays a member.
    fn deliver(&self, targets: &[ConnectionHandle], msg: &ChannelMessage) -> Vec<ConnectionId> {
        let mut failed = Vec::new();
        for handle in targets {
            match self.deliver_one(handle, msg.clone()) {
                Ok(()) => {}
                Err(RelayError::ChannelSendFailure(id)) => failed.push(id),
            }
        }
        failed
    }

    fn deliver_one(&self, handle: &ConnectionHandle, msg: ChannelMessage) -> Result<(), RelayError> {
        match handle.outbox.try_send(msg) {
            Ok(()) => {
                self.atomic_stats.messages_sent.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(msg)) => {
                self.atomic_stats
                    .messages_dropped
                    .fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "outbox full for connection {}, dropping {}",
                    handle.id,
                    msg.kind()
                );
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(RelayError::ChannelSendFailure(handle.id)),
        }
    }

    /// Remove `conn_id` from the room; returns the remaining count and
    /// survivor handles, or `None` if the connection was not a member.
    /// Drops the room when it empties.
    async fn remove_member(
        &self,
        doc_id: DocumentId,
        conn_id: ConnectionId,
    ) -> Option<(usize, Vec<ConnectionHandle>)> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(&doc_id)?;
        room.remove(&conn_id)?;

        if room.is_empty() {
            rooms.remove(&doc_id);
            log::info!("room {doc_id} removed (empty)");
            return Some((0, Vec::new()));
        }
        Some((room.len(), room.values().cloned().collect()))
    }

    /// Remove connections whose outbox closed mid-delivery.
    ///
    /// Each removal notifies the survivors, which can itself surface more
    /// dead connections; the queue terminates because every connection is
    /// removed at most once.
    async fn reap(&self, doc_id: DocumentId, dead: Vec<ConnectionId>) {
        let mut queue: VecDeque<ConnectionId> = dead.into();
        let mut seen: HashSet<ConnectionId> = queue.iter().copied().collect();

        while let Some(conn_id) = queue.pop_front() {
            let Some((count, survivors)) = self.remove_member(doc_id, conn_id).await else {
                continue;
            };
            log::warn!("connection {conn_id} reaped from doc {doc_id} (outbox closed)");

            let failed = self.deliver(&survivors, &ChannelMessage::member_left(count));
            for id in failed {
                if seen.insert(id) {
                    queue.push_back(id);
                }
            }
        }
    }
}
