//! WebSocket module for the chat connection
//!
//! Provides the WebSocket endpoint at `/ws`. Each connection gets an
//! identity, an outbox drained by its own writer task, and a reader loop
//! that feeds client events to the hub.

pub mod handler;
pub mod state;

pub use handler::ws_handler;
pub use state::AppState;
