//! Live connection registry.
//!
//! Maps connection IDs to the outbound queue drained by each socket's writer
//! task. Queues are bounded: a peer that stops reading loses messages once
//! its queue is full instead of growing it without limit.

use std::collections::HashMap;

use numduel_core::ConnId;
use numduel_proto::ServerMessage;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Messages queued per socket before further sends are dropped.
pub const OUTBOX_CAPACITY: usize = 64;

/// Outbound queue for one socket.
pub type Outbox = mpsc::Receiver<ServerMessage>;

/// Open connections and their outbound queues.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    senders: HashMap<ConnId, mpsc::Sender<ServerMessage>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `conn_id` and return the receiving end of its queue.
    ///
    /// Returns `None` if the ID is already taken.
    pub fn register(&mut self, conn_id: ConnId) -> Option<Outbox> {
        if self.senders.contains_key(&conn_id) {
            return None;
        }
        let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);
        self.senders.insert(conn_id, tx);
        Some(rx)
    }

    /// Forget `conn_id`. Dropping the sender lets the writer task finish.
    pub fn unregister(&mut self, conn_id: ConnId) -> bool {
        self.senders.remove(&conn_id).is_some()
    }

    /// Queue `message` for `conn_id`. Returns `false` if the connection is
    /// unknown, its writer already stopped, or its queue is full.
    pub fn send(&self, conn_id: ConnId, message: ServerMessage) -> bool {
        let Some(tx) = self.senders.get(&conn_id) else {
            return false;
        };
        match tx.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(conn_id, capacity = OUTBOX_CAPACITY, "outbox full");
                false
            },
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    /// True if no connection is registered.
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}
