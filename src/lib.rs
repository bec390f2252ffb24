//! Chat Relay
//!
//! A real-time chat relay: clients hold a WebSocket open, receive a
//! server-assigned display name, and exchange text messages, images and
//! typing indicators with everyone else who is connected.
//!
//! # Features
//!
//! - **Server Authority**: display names are generated and owned by the server
//! - **Safe Text**: messages are HTML-escaped and capped at 1000 characters
//! - **Image Relay**: png/jpeg/webp data URIs up to ~5 MiB, relayed as-is
//! - **Independent Delivery**: one bounded outbox per connection, no sender waits on a slow peer
//!
//! # Modules
//!
//! - `types`: Core data structures (ConnectionId, Member, ChatMessage)
//! - `protocol`: Inbound and outbound wire events
//! - `registry`: Identity registry, the source of truth for who is online
//! - `validation`: Text sanitization and image validation
//! - `hub`: Connection lifecycle and broadcast fan-out
//! - `api`: Axum router, WebSocket handler and HTTP endpoints
//! - `config`: Environment-based configuration
//! - `error`: Process-level error types
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chat_relay::api::http::create_router;
//! use chat_relay::api::websocket::AppState;
//! use chat_relay::{BroadcastHub, RelayConfig};
//!
//! #[tokio::main]
//! async fn main() -> chat_relay::RelayResult<()> {
//!     let config = RelayConfig::from_env()?;
//!     let hub = Arc::new(BroadcastHub::new());
//!     let app = create_router(Arc::new(AppState::new(hub, config.outbox_capacity)));
//!     let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod hub;
pub mod protocol;
pub mod registry;
pub mod types;
pub mod validation;

// Re-export commonly used items at crate root
pub use config::RelayConfig;
pub use error::{RelayError, RelayResult};
pub use hub::{BroadcastHub, Outbox, OutboxReceiver};
pub use protocol::{ClientEvent, SendMessagePayload, ServerEvent};
pub use registry::IdentityRegistry;
pub use types::{ChatMessage, ConnectionId, Member};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
