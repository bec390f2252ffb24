//! API module for HTTP and WebSocket endpoints
//!
//! This module provides the chat WebSocket and a small read-only HTTP API.

pub mod http;
pub mod websocket;
