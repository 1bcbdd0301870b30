use serde::{Deserialize, Serialize};

/// Response for the health probe, including the live session count.
#[derive(Serialize, Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub active_sessions: usize,
}

/// Response for the readiness probe.
#[derive(Serialize, Deserialize, Debug)]
pub struct ReadyResponse {
    pub status: String,
    pub message: String,
}
