//! WebSocket connection handler

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use super::state::AppState;
use crate::hub::{BroadcastHub, OutboxReceiver};
use crate::protocol::ClientEvent;
use crate::types::ConnectionId;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let id = state.next_connection_id();
    let (tx, rx) = state.outbox();
    let (sink, mut stream) = socket.split();

    let mut writer = tokio::spawn(write_outbox(id, sink, rx));
    state.hub.on_connect(id, tx);

    loop {
        tokio::select! {
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => handle_text(&state.hub, id, &text),
                    Some(Ok(Message::Close(_))) | None => break, // Client disconnected
                    Some(Ok(_)) => {} // Binary and control frames carry no events
                    Some(Err(e)) => {
                        debug!(connection = %id, error = %e, "websocket read failed");
                        break;
                    }
                }
            }

            // Writer stopped: the socket can no longer be written to
            _ = &mut writer => break,
        }
    }

    state.hub.on_disconnect(id);
    writer.abort();
}

/// Drain a connection's outbox into its socket
async fn write_outbox(
    id: ConnectionId,
    mut sink: futures::stream::SplitSink<WebSocket, Message>,
    mut rx: OutboxReceiver,
) {
    while let Some(event) = rx.recv().await {
        let json = match serde_json::to_string(&*event) {
            Ok(json) => json,
            Err(e) => {
                warn!(connection = %id, error = %e, "failed to serialize event");
                continue;
            }
        };

        if sink.send(Message::Text(json)).await.is_err() {
            debug!(connection = %id, "websocket write failed");
            break;
        }
    }

    let _ = sink.close().await;
}

/// Parse a text frame and hand it to the hub; unparseable frames are dropped
fn handle_text(hub: &BroadcastHub, id: ConnectionId, text: &str) {
    match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => hub.dispatch(id, event),
        Err(e) => debug!(connection = %id, error = %e, "dropping unparseable frame"),
    }
}
