//! Health check.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use leadflow_protocols::RunPhase;

use crate::state::ApiState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Serving, but run state could not be read.
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<RunPhase>,
    pub observers: usize,
}

/// GET /health
pub async fn health_check(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    let phase = state.orchestrator.state().await.ok().map(|s| s.phase());

    Json(HealthResponse {
        status: if phase.is_some() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime().as_secs(),
        phase,
        observers: state.orchestrator.events().observer_count(),
    })
}
