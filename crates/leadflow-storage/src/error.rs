//! Storage errors.

use thiserror::Error;

/// Storage error types.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Key cannot be used as a storage name.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Stored value no longer matches its schema.
    #[error("Corrupt entry '{key}': {message}")]
    Corrupt { key: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_display() {
        let err = StorageError::Corrupt {
            key: "automation_state".to_string(),
            message: "expected value".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("automation_state"));
        assert!(display.contains("expected value"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StorageError::from(io_err);
        assert!(err.to_string().contains("denied"));
    }
}
