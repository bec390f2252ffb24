//! Per-connection outbound queue
//!
//! A bounded channel plus one roster slot. When the channel is full, chat
//! and typing events are lost for that recipient, but a `users_update` is
//! parked in the slot instead (replacing any older parked roster). The
//! receiver hands out the parked roster once the channel has drained, so a
//! lagging client still converges on who is online.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::{
    self,
    error::{TryRecvError, TrySendError},
};

use crate::protocol::ServerEvent;

type RosterSlot = Arc<Mutex<Option<Vec<String>>>>;

/// Create an outbox pair with the given capacity
pub fn outbox(capacity: usize) -> (Outbox, OutboxReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    let pending_roster = RosterSlot::default();
    (
        Outbox {
            tx,
            pending_roster: Arc::clone(&pending_roster),
        },
        OutboxReceiver { rx, pending_roster },
    )
}

/// Outcome of [`Outbox::push`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    Queued,
    /// Queue full; the roster waits in the slot
    RosterDeferred,
    /// Queue full; the event is lost for this recipient
    Dropped,
    /// Receiver gone
    Closed,
}

/// Sending half of a connection's outbound queue
#[derive(Clone, Debug)]
pub struct Outbox {
    tx: mpsc::Sender<Arc<ServerEvent>>,
    pending_roster: RosterSlot,
}

impl Outbox {
    /// Enqueue without waiting
    pub fn push(&self, event: Arc<ServerEvent>) -> Enqueued {
        if !matches!(*event, ServerEvent::UsersUpdate(_)) {
            return match self.tx.try_send(event) {
                Ok(()) => Enqueued::Queued,
                Err(TrySendError::Full(_)) => Enqueued::Dropped,
                Err(TrySendError::Closed(_)) => Enqueued::Closed,
            };
        }

        // Slot lock held across the send so the receiver never hands out a
        // parked roster older than one already queued
        let mut slot = self.pending_roster.lock();
        match self.tx.try_send(event) {
            Ok(()) => {
                *slot = None;
                Enqueued::Queued
            }
            Err(TrySendError::Full(event)) => {
                if let ServerEvent::UsersUpdate(roster) = &*event {
                    *slot = Some(roster.clone());
                }
                Enqueued::RosterDeferred
            }
            Err(TrySendError::Closed(_)) => Enqueued::Closed,
        }
    }
}

/// Receiving half of a connection's outbound queue
#[derive(Debug)]
pub struct OutboxReceiver {
    rx: mpsc::Receiver<Arc<ServerEvent>>,
    pending_roster: RosterSlot,
}

impl OutboxReceiver {
    /// Next event, waiting if none is queued. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Arc<ServerEvent>> {
        match self.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Disconnected) => None,
            // A roster is only parked while the queue is full, so waiting
            // on the channel cannot miss one
            Err(TryRecvError::Empty) => self.rx.recv().await,
        }
    }

    /// Next event if one is ready
    pub fn try_recv(&mut self) -> Result<Arc<ServerEvent>, TryRecvError> {
        match self.rx.try_recv() {
            Err(TryRecvError::Empty) => match self.pending_roster.lock().take() {
                Some(roster) => Ok(Arc::new(ServerEvent::UsersUpdate(roster))),
                None => Err(TryRecvError::Empty),
            },
            other => other,
        }
    }
}
