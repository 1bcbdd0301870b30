use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::debug;

use crate::models::{HealthResponse, ReadyResponse};
use crate::AppState;

/// Health check endpoint
pub async fn health_check(State(app_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        active_sessions: app_state.registry.active_sessions().await,
    })
}

/// Readiness check endpoint
pub async fn ready_check() -> Json<ReadyResponse> {
    debug!("Readiness check requested");
    Json(ReadyResponse {
        status: "ok".to_string(),
        message: "Service is ready".to_string(),
    })
}
