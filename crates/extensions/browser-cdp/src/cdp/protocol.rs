//! CDP wire frames and the discovery documents the client reads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::CdpError;

/// Outgoing command frame.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandFrame<'a> {
    pub id: u64,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Routes the command to an attached page instead of the browser.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
}

/// Incoming frame: a reply when `id` is set, otherwise an event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingFrame {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<RemoteError>,
    pub method: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoteError {
    pub code: i64,
    pub message: String,
}

impl IncomingFrame {
    /// Settle a reply into the caller's result. A reply without a result is `null`.
    pub fn into_reply(self) -> Result<Value, CdpError> {
        match self.error {
            Some(RemoteError { code, message }) => Err(CdpError::Remote { code, message }),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// Entry of `Target.getTargets`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub target_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

impl TargetInfo {
    pub fn is_page(&self) -> bool {
        self.kind == "page"
    }
}

/// The part of `/json/version` needed to open the browser socket.
#[derive(Debug, Deserialize)]
pub struct VersionDocument {
    #[serde(rename = "Browser", default)]
    pub browser: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub ws_url: String,
}

/// Reply of `PUT /json/new`.
#[derive(Debug, Deserialize)]
pub struct CreatedTab {
    pub id: String,
    #[serde(default)]
    pub url: String,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
