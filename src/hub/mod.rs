//! Broadcast Hub - connection lifecycle and event fan-out
//!
//! The hub owns the [`IdentityRegistry`] and the set of recipient outboxes.
//! Every inbound transport event maps to one method here. None of them
//! returns an error: unauthorized or invalid input is dropped and only
//! logged at debug level.
//!
//! # Delivery
//!
//! Each connection has its own bounded outbox drained by a writer task.
//! Fan-out copies the outbox senders out of the recipient map, releases the
//! lock, then enqueues with `try_send`. Enqueueing never waits: a full
//! outbox loses that event for that recipient only, except roster updates,
//! which are parked and delivered once the outbox drains (see [`Outbox`]).
//!
//! Connect and disconnect handling is serialized end to end so roster
//! updates are enqueued in the order the registry changed.

mod outbox;

pub use outbox::{outbox, Enqueued, Outbox, OutboxReceiver};

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::protocol::{ClientEvent, SendMessagePayload, ServerEvent};
use crate::registry::IdentityRegistry;
use crate::types::{ChatMessage, ConnectionId, Member};
use crate::validation::{is_truthy, sanitize_text, validate_image};

/// Presence and broadcast core
pub struct BroadcastHub {
    registry: IdentityRegistry,
    recipients: RwLock<HashMap<ConnectionId, Outbox>>,
    lifecycle: Mutex<()>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::with_registry(IdentityRegistry::new())
    }

    pub fn with_registry(registry: IdentityRegistry) -> Self {
        Self {
            registry,
            recipients: RwLock::new(HashMap::new()),
            lifecycle: Mutex::new(()),
        }
    }

    /// A new connection came online
    ///
    /// The connection receives `init_user` first, then everyone (itself
    /// included) receives the updated roster. Returns the assigned name.
    pub fn on_connect(&self, id: ConnectionId, outbox: Outbox) -> String {
        let _lifecycle = self.lifecycle.lock();

        let (user, roster) = self.registry.register_with_snapshot(id);
        info!(connection = %id, user = %user, online = roster.len(), "user connected");

        enqueue(id, &outbox, Arc::new(ServerEvent::InitUser { user: user.clone() }));
        self.recipients.write().insert(id, outbox);
        self.broadcast(ServerEvent::UsersUpdate(roster), None);

        user
    }

    /// A connection went away
    ///
    /// Safe to call more than once. Remaining connections always receive
    /// the current roster.
    pub fn on_disconnect(&self, id: ConnectionId) {
        let _lifecycle = self.lifecycle.lock();

        self.recipients.write().remove(&id);
        let (removed, roster) = self.registry.remove_with_snapshot(id);
        match removed {
            Some(user) => {
                info!(connection = %id, user = %user, online = roster.len(), "user disconnected")
            }
            None => debug!(connection = %id, "disconnect for unregistered connection"),
        }

        self.broadcast(ServerEvent::UsersUpdate(roster), None);
    }

    /// `send_message` from a connection
    ///
    /// Text wins when both `msg` and `image` are present.
    pub fn on_message(&self, id: ConnectionId, payload: &SendMessagePayload) {
        let Some(user) = self.registry.lookup(id) else {
            debug!(connection = %id, "dropping message from unregistered connection");
            return;
        };

        if let Some(msg) = payload.msg.as_ref().and_then(sanitize_text) {
            self.relay(id, ChatMessage::Text { user, msg });
            return;
        }

        let Some(image) = payload.image.as_ref().filter(|value| is_truthy(value)) else {
            debug!(connection = %id, "dropping empty message");
            return;
        };

        match validate_image(image) {
            Ok(data) => {
                let image = data.to_string();
                self.relay(id, ChatMessage::Image { user, image });
            }
            Err(reason) => debug!(connection = %id, %reason, "dropping image"),
        }
    }

    /// `typing` from a connection; registered senders only
    pub fn on_typing(&self, id: ConnectionId) {
        match self.registry.lookup(id) {
            Some(user) => {
                self.broadcast(ServerEvent::UserTyping { user }, Some(id));
            }
            None => debug!(connection = %id, "dropping typing from unregistered connection"),
        }
    }

    /// `stop_typing` from a connection
    ///
    /// Unlike `typing`, the sender's registration is not checked.
    pub fn on_stop_typing(&self, id: ConnectionId) {
        self.broadcast(ServerEvent::UserStopTyping, Some(id));
    }

    /// Route a parsed client event
    pub fn dispatch(&self, id: ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::SendMessage(payload) => self.on_message(id, &payload),
            ClientEvent::Typing => self.on_typing(id),
            ClientEvent::StopTyping => self.on_stop_typing(id),
        }
    }

    /// Current roster in join order
    pub fn roster(&self) -> Vec<String> {
        self.registry.snapshot()
    }

    /// Online members with join times
    pub fn members(&self) -> Vec<Member> {
        self.registry.members()
    }

    pub fn online_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of attached outboxes
    pub fn recipient_count(&self) -> usize {
        self.recipients.read().len()
    }

    fn relay(&self, id: ConnectionId, message: ChatMessage) {
        let kind = match message {
            ChatMessage::Text { .. } => "text",
            ChatMessage::Image { .. } => "image",
        };
        debug!(connection = %id, user = message.author(), kind, "relaying message");
        self.broadcast(ServerEvent::ReceiveMessage(message), None);
    }

    /// Enqueue an event for every recipient except `exclude`.
    /// Returns how many outboxes accepted it.
    fn broadcast(&self, event: ServerEvent, exclude: Option<ConnectionId>) -> usize {
        let targets: Vec<(ConnectionId, Outbox)> = self
            .recipients
            .read()
            .iter()
            .filter(|(id, _)| Some(**id) != exclude)
            .map(|(id, outbox)| (*id, outbox.clone()))
            .collect();

        let event = Arc::new(event);
        let mut delivered = 0;
        for (id, outbox) in &targets {
            if enqueue(*id, outbox, Arc::clone(&event)) {
                delivered += 1;
            }
        }
        delivered
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

fn enqueue(id: ConnectionId, outbox: &Outbox, event: Arc<ServerEvent>) -> bool {
    match outbox.push(event) {
        Enqueued::Queued => true,
        Enqueued::RosterDeferred => {
            debug!(connection = %id, "outbox full, roster parked");
            true
        }
        Enqueued::Dropped => {
            warn!(connection = %id, "outbox full, dropping event");
            false
        }
        // Writer already gone; disconnect cleanup will follow
        Enqueued::Closed => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn connect(hub: &BroadcastHub, raw: u64) -> (ConnectionId, OutboxReceiver, String) {
        let id = ConnectionId::new(raw);
        let (tx, rx) = outbox(64);
        let user = hub.on_connect(id, tx);
        (id, rx, user)
    }

    fn drain(rx: &mut OutboxReceiver) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push((*event).clone());
        }
        events
    }

    fn messages(events: &[ServerEvent]) -> Vec<&ChatMessage> {
        events
            .iter()
            .filter_map(|event| match event {
                ServerEvent::ReceiveMessage(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_connect_sends_identity_then_roster() {
        let hub = BroadcastHub::new();
        let (_, mut rx, user) = connect(&hub, 1);

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                ServerEvent::InitUser { user: user.clone() },
                ServerEvent::UsersUpdate(vec![user]),
            ]
        );
    }

    #[test]
    fn test_roster_broadcast_reaches_existing_connections() {
        let hub = BroadcastHub::new();
        let (_, mut rx_a, user_a) = connect(&hub, 1);
        drain(&mut rx_a);

        let (_, _rx_b, user_b) = connect(&hub, 2);
        let events = drain(&mut rx_a);
        assert_eq!(events, vec![ServerEvent::UsersUpdate(vec![user_a, user_b])]);
    }

    #[test]
    fn test_disconnect_updates_remaining_only() {
        let hub = BroadcastHub::new();
        let (_, mut rx_a, user_a) = connect(&hub, 1);
        let (id_b, mut rx_b, _) = connect(&hub, 2);
        drain(&mut rx_a);
        drain(&mut rx_b);

        hub.on_disconnect(id_b);

        assert_eq!(drain(&mut rx_a), vec![ServerEvent::UsersUpdate(vec![user_a])]);
        assert!(drain(&mut rx_b).is_empty());
        assert_eq!(hub.online_count(), 1);
        assert_eq!(hub.recipient_count(), 1);
    }

    #[test]
    fn test_duplicate_disconnect_is_noop() {
        let hub = BroadcastHub::new();
        let (id_a, _rx_a, _) = connect(&hub, 1);
        let (_, mut rx_b, user_b) = connect(&hub, 2);

        hub.on_disconnect(id_a);
        hub.on_disconnect(id_a);
        drain(&mut rx_b);

        assert_eq!(hub.roster(), vec![user_b]);
    }

    #[test]
    fn test_text_message_broadcast_to_all() {
        let hub = BroadcastHub::new();
        let (id_a, mut rx_a, user_a) = connect(&hub, 1);
        let (_, mut rx_b, _) = connect(&hub, 2);
        drain(&mut rx_a);
        drain(&mut rx_b);

        hub.on_message(id_a, &SendMessagePayload::text("<b>hi</b>"));

        let expected = ServerEvent::ReceiveMessage(ChatMessage::Text {
            user: user_a,
            msg: "&lt;b&gt;hi&lt;/b&gt;".to_string(),
        });
        assert_eq!(drain(&mut rx_a), vec![expected.clone()]);
        assert_eq!(drain(&mut rx_b), vec![expected]);
    }

    #[test]
    fn test_image_message_relayed_unchanged() {
        let hub = BroadcastHub::new();
        let (id, mut rx, user) = connect(&hub, 1);
        drain(&mut rx);

        hub.on_message(id, &SendMessagePayload::image("data:image/webp;base64,UklGRg=="));

        assert_eq!(
            drain(&mut rx),
            vec![ServerEvent::ReceiveMessage(ChatMessage::Image {
                user,
                image: "data:image/webp;base64,UklGRg==".to_string(),
            })]
        );
    }

    #[test]
    fn test_unregistered_sender_dropped() {
        let hub = BroadcastHub::new();
        let (_, mut rx, _) = connect(&hub, 1);
        drain(&mut rx);

        hub.on_message(ConnectionId::new(99), &SendMessagePayload::text("hello"));
        hub.on_typing(ConnectionId::new(99));

        assert!(messages(&drain(&mut rx)).is_empty());
    }

    #[test]
    fn test_text_takes_priority_over_image() {
        let hub = BroadcastHub::new();
        let (id, mut rx, user) = connect(&hub, 1);
        drain(&mut rx);

        let payload = SendMessagePayload {
            msg: Some(json!("caption")),
            image: Some(json!("data:image/png;base64,AAAA")),
        };
        hub.on_message(id, &payload);

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![ServerEvent::ReceiveMessage(ChatMessage::Text {
                user,
                msg: "caption".to_string(),
            })]
        );
    }

    #[test]
    fn test_empty_text_falls_back_to_image() {
        let hub = BroadcastHub::new();
        let (id, mut rx, _) = connect(&hub, 1);
        drain(&mut rx);

        let payload = SendMessagePayload {
            msg: Some(json!("")),
            image: Some(json!("data:image/png;base64,AAAA")),
        };
        hub.on_message(id, &payload);

        let events = drain(&mut rx);
        assert!(matches!(
            messages(&events).as_slice(),
            [ChatMessage::Image { .. }]
        ));
    }

    #[test]
    fn test_invalid_payloads_dropped() {
        let hub = BroadcastHub::new();
        let (id, mut rx, _) = connect(&hub, 1);
        drain(&mut rx);

        hub.on_message(id, &SendMessagePayload::default());
        hub.on_message(id, &SendMessagePayload::image("data:image/gif;base64,AAAA"));
        hub.on_message(id, &SendMessagePayload::image("data:text/plain;base64,AAAA"));
        hub.on_message(
            id,
            &SendMessagePayload {
                msg: None,
                image: Some(json!(12345)),
            },
        );

        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_typing_excludes_sender() {
        let hub = BroadcastHub::new();
        let (id_a, mut rx_a, user_a) = connect(&hub, 1);
        let (_, mut rx_b, _) = connect(&hub, 2);
        let (_, mut rx_c, _) = connect(&hub, 3);
        drain(&mut rx_a);
        drain(&mut rx_b);
        drain(&mut rx_c);

        hub.on_typing(id_a);

        let expected = ServerEvent::UserTyping { user: user_a };
        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(drain(&mut rx_b), vec![expected.clone()]);
        assert_eq!(drain(&mut rx_c), vec![expected]);
    }

    #[test]
    fn test_stop_typing_skips_registration_check() {
        let hub = BroadcastHub::new();
        let (_, mut rx, _) = connect(&hub, 1);
        drain(&mut rx);

        hub.on_stop_typing(ConnectionId::new(42));

        assert_eq!(drain(&mut rx), vec![ServerEvent::UserStopTyping]);
    }

    #[test]
    fn test_dispatch_routes_events() {
        let hub = BroadcastHub::new();
        let (id_a, _rx_a, _) = connect(&hub, 1);
        let (_, mut rx_b, _) = connect(&hub, 2);
        drain(&mut rx_b);

        hub.dispatch(id_a, ClientEvent::Typing);
        hub.dispatch(id_a, ClientEvent::StopTyping);
        hub.dispatch(id_a, ClientEvent::SendMessage(SendMessagePayload::text("yo")));

        let events = drain(&mut rx_b);
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], ServerEvent::UserTyping { .. }));
        assert_eq!(events[1], ServerEvent::UserStopTyping);
        assert!(matches!(events[2], ServerEvent::ReceiveMessage(ChatMessage::Text { .. })));
    }

    #[test]
    fn test_full_outbox_does_not_block_others() {
        let hub = BroadcastHub::new();
        let slow_id = ConnectionId::new(1);
        let (slow_tx, mut slow_rx) = outbox(2);
        hub.on_connect(slow_id, slow_tx);
        let (id_fast, mut rx_fast, _) = connect(&hub, 2);
        drain(&mut rx_fast);

        // init_user and the first roster already fill the slow outbox
        for i in 0..10 {
            hub.on_message(id_fast, &SendMessagePayload::text(format!("msg {}", i)));
        }

        assert_eq!(messages(&drain(&mut rx_fast)).len(), 10);

        let slow_events = drain(&mut slow_rx);
        assert_eq!(slow_events.len(), 3);
        assert!(messages(&slow_events).is_empty());
        assert_eq!(slow_events[2], ServerEvent::UsersUpdate(hub.roster()));
    }

    #[test]
    fn test_full_outbox_still_converges_on_roster() {
        let hub = BroadcastHub::new();
        let (slow_tx, mut slow_rx) = outbox(2);
        let slow_user = hub.on_connect(ConnectionId::new(1), slow_tx);
        let (_, _rx_b, user_b) = connect(&hub, 2);
        let (id_c, _rx_c, _) = connect(&hub, 3);
        hub.on_disconnect(id_c);

        let events = drain(&mut slow_rx);
        assert_eq!(
            events,
            vec![
                ServerEvent::InitUser {
                    user: slow_user.clone()
                },
                ServerEvent::UsersUpdate(vec![slow_user.clone()]),
                ServerEvent::UsersUpdate(vec![slow_user, user_b]),
            ]
        );
    }

    #[test]
    fn test_closed_outbox_ignored() {
        let hub = BroadcastHub::new();
        let (id_a, rx_a, _) = connect(&hub, 1);
        let (_, mut rx_b, _) = connect(&hub, 2);
        drop(rx_a);
        drain(&mut rx_b);

        hub.on_message(id_a, &SendMessagePayload::text("still here"));

        assert_eq!(messages(&drain(&mut rx_b)).len(), 1);
    }
}
