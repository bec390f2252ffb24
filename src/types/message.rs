//! Chat messages relayed between clients

use serde::{Deserialize, Serialize};

/// A relayed chat message. Transient: nothing keeps it after broadcast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatMessage {
    /// HTML-escaped, length-capped text
    Text { user: String, msg: String },

    /// A validated `data:image/...;base64,` URI, relayed unchanged
    Image { user: String, image: String },
}

impl ChatMessage {
    /// Display name of the author
    pub fn author(&self) -> &str {
        match self {
            ChatMessage::Text { user, .. } | ChatMessage::Image { user, .. } => user,
        }
    }
}
