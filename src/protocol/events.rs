//! Wire events exchanged over the WebSocket connection
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`.
//! Events without a payload omit `data`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::ChatMessage;

/// Events sent by clients
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Text or image message for everyone
    SendMessage(SendMessagePayload),

    /// Sender started typing
    Typing,

    /// Sender stopped typing
    StopTyping,
}

/// Payload of `send_message`
///
/// Fields stay loosely typed so that wrong types reach the validator
/// instead of failing the whole frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SendMessagePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Value>,
}

impl SendMessagePayload {
    pub fn text(msg: impl Into<String>) -> Self {
        Self {
            msg: Some(Value::String(msg.into())),
            image: None,
        }
    }

    pub fn image(data_uri: impl Into<String>) -> Self {
        Self {
            msg: None,
            image: Some(Value::String(data_uri.into())),
        }
    }
}

/// Events sent by the server
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Identity assignment, only to the new connection
    InitUser { user: String },

    /// Full roster after every join/leave
    UsersUpdate(Vec<String>),

    /// A relayed chat message
    ReceiveMessage(ChatMessage),

    /// Someone else is typing
    UserTyping { user: String },

    /// Someone else stopped typing
    UserStopTyping,
}
