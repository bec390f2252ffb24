//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::websocket::{handler::ws_handler, state::AppState};
use crate::types::Member;

/// Response body of `GET /api/users`
#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub count: usize,
    pub users: Vec<Member>,
}

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // Any origin may connect, as with the browser client
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // WebSocket endpoint
        .route("/ws", get(ws_handler))
        // Health check
        .route("/health", get(health_check))
        // Online roster
        .route("/api/users", get(list_users))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Online users with join times
async fn list_users(State(state): State<Arc<AppState>>) -> Json<UsersResponse> {
    let users = state.hub.members();
    Json(UsersResponse {
        count: users.len(),
        users,
    })
}
