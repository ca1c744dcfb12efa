//! Page session: commands routed to one attached tab.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::debug;

use super::client::Rpc;
use super::error::CdpError;

/// Bound on waiting for `document.readyState` to reach `complete`.
const LOAD_LIMIT: Duration = Duration::from_secs(30);
const LOAD_POLL: Duration = Duration::from_millis(100);

/// A flattened CDP session attached to one tab.
pub struct PageSession {
    target_id: String,
    session_id: String,
    rpc: Arc<Rpc>,
}

impl PageSession {
    pub(crate) fn new(target_id: &str, session_id: &str, rpc: Arc<Rpc>) -> Self {
        Self {
            target_id: target_id.to_string(),
            session_id: session_id.to_string(),
            rpc,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn send(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.rpc.send(method, params, Some(&self.session_id)).await
    }

    /// Enable the Page and Runtime domains.
    pub(crate) async fn prepare(&self) -> Result<(), CdpError> {
        self.send("Page.enable", None).await?;
        self.send("Runtime.enable", None).await?;
        debug!("Session {} ready on {}", self.session_id, self.target_id);
        Ok(())
    }

    /// Evaluate `expression` in the page, awaiting a returned promise.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let reply = self
            .send(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;
        evaluation_value(reply)
    }

    /// Whether the document has finished loading.
    pub async fn is_loaded(&self) -> Result<bool, CdpError> {
        let state = self.evaluate("document.readyState").await?;
        Ok(is_complete(&state))
    }

    /// Poll until the document is complete.
    ///
    /// Script and remote errors are expected while the old document unloads,
    /// so they only mean "not yet".
    pub async fn wait_for_load(&self) -> Result<(), CdpError> {
        let deadline = Instant::now() + LOAD_LIMIT;
        loop {
            match self.is_loaded().await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) if e.is_transient_during_load() => {}
                Err(e) => return Err(e),
            }
            if Instant::now() >= deadline {
                return Err(CdpError::Timeout(format!("Loading {}", self.target_id)));
            }
            tokio::time::sleep(LOAD_POLL).await;
        }
    }

    pub async fn reload(&self) -> Result<(), CdpError> {
        self.send("Page.reload", Some(json!({"ignoreCache": false})))
            .await?;
        self.wait_for_load().await
    }

    pub async fn navigate(&self, url: &str) -> Result<(), CdpError> {
        let reply = self.send("Page.navigate", Some(json!({"url": url}))).await?;
        if let Some(reason) = reply.get("errorText").and_then(Value::as_str) {
            return Err(CdpError::Navigation(format!("{}: {}", url, reason)));
        }
        self.wait_for_load().await
    }

    pub async fn bring_to_front(&self) -> Result<(), CdpError> {
        self.send("Page.bringToFront", None).await?;
        Ok(())
    }
}

fn is_complete(state: &Value) -> bool {
    state.as_str() == Some("complete")
}

/// Unwrap a `Runtime.evaluate` reply into the returned value.
fn evaluation_value(mut reply: Value) -> Result<Value, CdpError> {
    if let Some(details) = reply.get("exceptionDetails") {
        // The exception description carries the message; `text` is just "Uncaught"
        let message = details
            .pointer("/exception/description")
            .and_then(Value::as_str)
            .or_else(|| details.get("text").and_then(Value::as_str))
            .unwrap_or("unknown exception");
        return Err(CdpError::Script(message.to_string()));
    }
    Ok(reply["result"]["value"].take())
}
