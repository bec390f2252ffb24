//! Data types shared by the registry, hub and transport
//!
//! This module contains the core data structures used throughout the relay.

mod connection;
mod message;

pub use connection::{ConnectionId, Member};
pub use message::ChatMessage;
