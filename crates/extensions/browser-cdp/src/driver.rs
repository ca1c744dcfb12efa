//! Form Driver transport over CDP.
//!
//! The driver agent is a script living in the CRM page that exposes
//! `window.__leadflowDriver.handle(message)`. Each request is one
//! `Runtime.evaluate` with `awaitPromise`, so the reply is whatever the
//! agent's promise resolves to.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use leadflow_protocols::{
    DriverError, DriverReply, DriverRequest, FillOutcome, FormDriver, LeadRecord, LogSink,
    TargetHandle,
};

use crate::browser::CdpBrowser;
use crate::cdp::{CdpError, PageSession};

/// Global the page agent registers itself under.
pub const AGENT_GLOBAL: &str = "__leadflowDriver";

/// Expression that evaluates to true once the agent is installed.
pub fn agent_probe() -> String {
    format!(
        "typeof window.{0} === 'object' && window.{0} !== null && typeof window.{0}.handle === 'function'",
        AGENT_GLOBAL
    )
}

/// Expression dispatching `request` to the agent.
pub fn dispatch_expression(request: &DriverRequest) -> Result<String, DriverError> {
    let message = serde_json::to_string(request)
        .map_err(|e| DriverError::Transport(format!("Failed to encode request: {}", e)))?;
    Ok(format!("window.{}.handle({})", AGENT_GLOBAL, message))
}

/// [`FormDriver`] that talks to the in-page agent through CDP.
pub struct CdpFormDriver {
    browser: Arc<CdpBrowser>,
    /// Agent source injected when the page does not already host it.
    agent_script: Option<String>,
    log_sink: Option<Arc<dyn LogSink>>,
}

impl CdpFormDriver {
    pub fn new(browser: Arc<CdpBrowser>) -> Self {
        Self {
            browser,
            agent_script: None,
            log_sink: None,
        }
    }

    pub fn with_agent_script(mut self, source: impl Into<String>) -> Self {
        self.agent_script = Some(source.into());
        self
    }

    /// Forward agent-produced log lines to `sink`.
    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = Some(sink);
        self
    }

    async fn session(&self, target: &TargetHandle) -> Result<Arc<PageSession>, DriverError> {
        self.browser
            .session(target.as_str())
            .await
            .map_err(|e| DriverError::Transport(e.to_string()))
    }

    async fn agent_present(session: &PageSession) -> Result<bool, DriverError> {
        let present = session.evaluate(&agent_probe()).await.map_err(transport)?;
        Ok(present.as_bool().unwrap_or(false))
    }

    async fn ensure_agent(&self, session: &PageSession) -> Result<(), DriverError> {
        if Self::agent_present(session).await? {
            return Ok(());
        }

        let Some(script) = &self.agent_script else {
            return Err(DriverError::NotReady(
                "Driver agent not present in page and no script configured".to_string(),
            ));
        };

        info!("Injecting driver agent into target {}", session.target_id());
        session.evaluate(script).await.map_err(transport)?;

        if Self::agent_present(session).await? {
            Ok(())
        } else {
            Err(DriverError::NotReady(format!(
                "Driver script did not register window.{}",
                AGENT_GLOBAL
            )))
        }
    }

    async fn send(
        &self,
        target: &TargetHandle,
        request: &DriverRequest,
    ) -> Result<DriverReply, DriverError> {
        let session = self.session(target).await?;
        self.ensure_agent(&session).await?;

        let expression = dispatch_expression(request)?;
        let value = session.evaluate(&expression).await.map_err(transport)?;

        let mut reply: DriverReply = serde_json::from_value(value)
            .map_err(|e| DriverError::InvalidReply(e.to_string()))?;

        let logs = std::mem::take(&mut reply.logs);
        if let Some(sink) = &self.log_sink {
            for entry in logs {
                sink.log(entry.level, entry.message).await;
            }
        } else if !logs.is_empty() {
            debug!("Dropping {} driver log lines (no sink)", logs.len());
        }

        Ok(reply)
    }
}

fn transport(e: CdpError) -> DriverError {
    DriverError::Transport(e.to_string())
}

#[async_trait]
impl FormDriver for CdpFormDriver {
    async fn ping(&self, target: &TargetHandle) -> Result<(), DriverError> {
        self.send(target, &DriverRequest::Ping)
            .await?
            .into_result()
            .map(|_| ())
    }

    async fn initialize_page(&self, target: &TargetHandle) -> Result<(), DriverError> {
        self.send(target, &DriverRequest::InitializeCrm)
            .await?
            .into_result()
            .map(|_| ())
    }

    async fn fill_and_save(
        &self,
        target: &TargetHandle,
        lead: &LeadRecord,
    ) -> Result<FillOutcome, DriverError> {
        let request = DriverRequest::FillForm { lead: lead.clone() };
        Ok(self.send(target, &request).await?.into_outcome())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_expression_embeds_json() {
        let expr = dispatch_expression(&DriverRequest::Ping).unwrap();
        assert_eq!(expr, r#"window.__leadflowDriver.handle({"type":"PING"})"#);
    }

    #[test]
    fn test_dispatch_expression_escapes_lead_fields() {
        let lead = LeadRecord::new(2, "O'Brien", "\"Quoted\"");
        let expr = dispatch_expression(&DriverRequest::FillForm { lead }).unwrap();
        assert!(expr.starts_with("window.__leadflowDriver.handle({"));
        assert!(expr.contains(r#""lastName":"\"Quoted\"""#));
        assert!(expr.ends_with("})"));
    }

    #[test]
    fn test_agent_probe_names_global() {
        let probe = agent_probe();
        assert!(probe.contains("window.__leadflowDriver"));
        assert!(probe.contains("typeof window.__leadflowDriver.handle === 'function'"));
    }

    #[test]
    fn test_transport_error_mapping() {
        let err = transport(CdpError::SessionClosed);
        assert!(matches!(err, DriverError::Transport(ref m) if m == "Session closed"));
    }
}
