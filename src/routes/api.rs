use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::handlers::{health_check, ready_check};
use crate::ws::{author::create_session_handler, viewer::join_session_handler};
use crate::AppState;

/// Assemble the relay's routes: the two WebSocket endpoints plus probes.
pub fn create_app(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/create", get(create_session_handler))
        .route("/join/:session_id", get(join_session_handler))
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
