//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use leadflow_orchestrator::OrchestratorError;
use leadflow_protocols::CommandResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Orchestrator(OrchestratorError::Storage(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Orchestrator(OrchestratorError::LeadStore(_)) => StatusCode::BAD_GATEWAY,
            Self::Orchestrator(_) => StatusCode::CONFLICT,
        }
    }
}

/// Errors keep the `{success: false, error}` shape of command replies.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(CommandResponse::failure(self.to_string()))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_protocols::LeadStoreError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(OrchestratorError::NotRunning).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(OrchestratorError::LeadStore(LeadStoreError::Status(503))).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Internal("x".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_message_passthrough() {
        let err = ApiError::from(OrchestratorError::AlreadyRunning);
        assert_eq!(err.to_string(), "Automation already in progress");
    }
}
