//! Form Driver errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    /// The page-embedded agent is not reachable in the target.
    #[error("Driver not ready: {0}")]
    NotReady(String),

    /// The agent answered `{success: false}`.
    #[error("Driver rejected request: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid driver reply: {0}")]
    InvalidReply(String),

    #[error("Driver timed out after {0}s")]
    Timeout(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display() {
        let err = DriverError::Rejected("Save button not found".to_string());
        assert!(err.to_string().contains("Save button not found"));
    }

    #[test]
    fn test_timeout_display() {
        let err = DriverError::Timeout(30);
        assert_eq!(err.to_string(), "Driver timed out after 30s");
    }
}
