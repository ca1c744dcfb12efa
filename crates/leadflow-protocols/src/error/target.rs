//! Target lifecycle errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("Target unavailable: {0}")]
    Unavailable(String),

    #[error("Target not found: {0}")]
    NotFound(String),
}
