//! Lead Store errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeadStoreError {
    #[error("Lead store endpoint is not configured")]
    NotConfigured,

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
