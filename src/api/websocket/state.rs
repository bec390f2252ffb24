//! WebSocket application state

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::hub::{outbox, BroadcastHub, Outbox, OutboxReceiver};
use crate::types::ConnectionId;

/// Shared application state for WebSocket connections
pub struct AppState {
    /// The presence and broadcast core
    pub hub: Arc<BroadcastHub>,

    /// Source of connection identities
    next_connection_id: AtomicU64,

    /// Capacity of each connection's outbox
    outbox_capacity: usize,
}

impl AppState {
    /// Create a new AppState around the given hub
    pub fn new(hub: Arc<BroadcastHub>, outbox_capacity: usize) -> Self {
        Self {
            hub,
            next_connection_id: AtomicU64::new(1),
            outbox_capacity: outbox_capacity.max(1),
        }
    }

    /// Allocate the identity for a new connection
    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId::new(self.next_connection_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Create the outbound queue for a new connection
    pub fn outbox(&self) -> (Outbox, OutboxReceiver) {
        outbox(self.outbox_capacity)
    }
}
