//! Command and read-only state handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::Value;
use tracing::debug;

use leadflow_protocols::CommandResponse;

use crate::error::ApiResult;
use crate::state::ApiState;

/// Run any command.
///
/// POST /api/commands
///
/// Rejections are still `200 OK` with `success: false`; callers branch on
/// the body, not the status.
pub async fn run_command(
    State(state): State<Arc<ApiState>>,
    Json(body): Json<Value>,
) -> Json<CommandResponse> {
    if let Some(kind) = body.get("type").and_then(Value::as_str) {
        debug!("Command received: {}", kind);
    }
    Json(state.orchestrator.handle_value(body).await)
}

/// GET /api/state
pub async fn get_state(State(state): State<Arc<ApiState>>) -> ApiResult<Json<CommandResponse>> {
    let run = state.orchestrator.state().await?;
    Ok(Json(CommandResponse::ok().with_state(run)))
}

/// GET /api/logs
pub async fn get_logs(State(state): State<Arc<ApiState>>) -> ApiResult<Json<CommandResponse>> {
    let logs = state
        .orchestrator
        .storage()
        .logs()
        .await
        .map_err(leadflow_orchestrator::OrchestratorError::from)?;
    Ok(Json(CommandResponse::ok().with_logs(logs)))
}

/// GET /api/config
pub async fn get_config(State(state): State<Arc<ApiState>>) -> ApiResult<Json<CommandResponse>> {
    let settings = state.orchestrator.settings().await?;
    Ok(Json(CommandResponse::ok().with_config(settings)))
}
