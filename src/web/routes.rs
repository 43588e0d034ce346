//! API route definitions

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use super::handlers;
use super::websocket::ws_handler;
use super::AppState;

/// Create all API routes
pub fn create_routes(state: AppState) -> Router {
    let public = ServeDir::new(&state.config.public_dir);

    Router::new()
        // Health check
        .route("/api/health", get(handlers::health_check))

        // Tokens
        .route("/api/tokens", get(handlers::list_tokens))
        .route("/api/tokens", post(handlers::launch_token))
        .route("/api/tokens/:slug", get(handlers::get_token))

        // Wallet
        .route("/api/wallet", get(handlers::get_wallet))
        .route("/api/wallet/connect", post(handlers::connect_wallet))
        .route("/api/wallet/disconnect", post(handlers::disconnect_wallet))

        // Images
        .route("/api/images/tokens/:id", get(handlers::get_token_image))

        // WebSocket
        .route("/ws", get(ws_handler))

        // Static assets (placeholder.png)
        .fallback_service(public)

        // Add state to all routes
        .with_state(state)
}
