//! CDP error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CdpError {
    /// Nothing answers on the debugging port.
    #[error("Chrome is not reachable at {0}")]
    Unreachable(String),

    #[error("WebSocket failure: {0}")]
    Socket(String),

    #[error("Discovery request failed: {0}")]
    Discovery(String),

    /// Chrome answered the command with an error object.
    #[error("Chrome rejected the command: {message} (code {code})")]
    Remote { code: i64, message: String },

    #[error("Malformed CDP payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Reply is missing {0}")]
    MissingField(&'static str),

    /// The evaluated expression threw.
    #[error("Page script threw: {0}")]
    Script(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("{0} timed out")]
    Timeout(String),

    #[error("Session closed")]
    SessionClosed,
}

impl CdpError {
    /// Errors seen while a page tears down its execution context.
    pub fn is_transient_during_load(&self) -> bool {
        matches!(self, Self::Script(_) | Self::Remote { .. })
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Socket(e.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        Self::Discovery(e.to_string())
    }
}

impl From<url::ParseError> for CdpError {
    fn from(e: url::ParseError) -> Self {
        Self::Discovery(format!("bad endpoint: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display() {
        let err = CdpError::Remote {
            code: -32000,
            message: "No target with given id found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Chrome rejected the command: No target with given id found (code -32000)"
        );
    }

    #[test]
    fn test_transient_errors() {
        assert!(CdpError::Script("Execution context was destroyed".into()).is_transient_during_load());
        assert!(!CdpError::SessionClosed.is_transient_during_load());
        assert!(!CdpError::Timeout("Page load".into()).is_transient_during_load());
    }

    #[test]
    fn test_from_url_parse_error() {
        let err: CdpError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, CdpError::Discovery(ref m) if m.starts_with("bad endpoint")));
    }

    #[test]
    fn test_from_serde_error() {
        let err: CdpError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, CdpError::Decode(_)));
    }
}
