pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod state;
pub mod upstream;

use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

use handlers::{chat_handler, health_handler, method_not_allowed, metrics_handler};
use state::AppState;

/// Build the router. The chat route answers POST only; any other method gets
/// the 405 body from the original contract instead of axum's bare default.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route(
            "/api/chat",
            post(chat_handler).fallback(method_not_allowed),
        )
        .with_state(state)
}
