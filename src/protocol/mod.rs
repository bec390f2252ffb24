//! Protocol types for the chat WebSocket
//!
//! This module contains the inbound and outbound wire events.

mod events;

pub use events::{ClientEvent, SendMessagePayload, ServerEvent};
