//! Chat Relay Server - Binary Entry Point
//!
//! This is the main entry point for the chat-relay binary.

use std::future::Future;
use std::sync::Arc;

use chat_relay::api::http::create_router;
use chat_relay::api::websocket::AppState;
use chat_relay::{BroadcastHub, IdentityRegistry, RelayConfig, RelayResult};
use tracing::info;

#[tokio::main]
async fn main() -> RelayResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_relay=info,tower_http=info".into()),
        )
        .init();

    let config = RelayConfig::from_env()?;

    let registry = IdentityRegistry::new().unique_names(config.unique_names);
    let hub = Arc::new(BroadcastHub::with_registry(registry));
    let state = Arc::new(AppState::new(hub, config.outbox_capacity));
    let app = create_router(state);

    let shutdown = shutdown_signal()?;
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(
        addr = %listener.local_addr()?,
        version = chat_relay::VERSION,
        unique_names = config.unique_names,
        "chat relay listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("chat relay stopped");
    Ok(())
}

/// Resolves on the first Ctrl+C / SIGTERM
fn shutdown_signal() -> RelayResult<impl Future<Output = ()>> {
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let tx = parking_lot::Mutex::new(Some(tx));

    ctrlc::set_handler(move || {
        if let Some(tx) = tx.lock().take() {
            let _ = tx.send(());
        }
    })?;

    Ok(async move {
        let _ = rx.await;
        info!("shutdown signal received");
    })
}
