//! Form Driver contract.
//!
//! The driver is a page-embedded agent living inside the CRM tab. The
//! coordinator talks to it with typed messages and gets back a
//! [`DriverReply`]. Timeouts are applied by the caller, not the driver.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DriverError;
use crate::event::LogLevel;
use crate::lead::LeadRecord;
use crate::outcome::FillOutcome;
use crate::run::TargetHandle;

/// Message sent from the coordinator to the page-embedded agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverRequest {
    FillForm { lead: LeadRecord },
    InitializeCrm,
    Ping,
}

/// Log line produced by the agent while handling a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverLog {
    pub level: LogLevel,
    pub message: String,
}

/// Reply from the page-embedded agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverReply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub problems: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<DriverLog>,
}

impl DriverReply {
    fn error_text(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| "Unknown error".to_string())
    }

    /// Interpret the reply to a `FILL_FORM` request.
    pub fn into_outcome(self) -> FillOutcome {
        if self.success {
            FillOutcome::success().with_problems(self.problems)
        } else {
            FillOutcome::failure(self.error_text()).with_problems(self.problems)
        }
    }

    /// Interpret the reply to a request that has no outcome of its own.
    pub fn into_result(self) -> Result<Option<Value>, DriverError> {
        if self.success {
            Ok(self.result)
        } else {
            Err(DriverError::Rejected(self.error_text()))
        }
    }
}

/// Operations the orchestrator needs from the page-embedded agent.
#[async_trait]
pub trait FormDriver: Send + Sync {
    /// Readiness probe.
    async fn ping(&self, target: &TargetHandle) -> Result<(), DriverError>;

    /// One-time page setup (filters, toggles) at the start of a run.
    async fn initialize_page(&self, target: &TargetHandle) -> Result<(), DriverError>;

    /// Create, populate and save one CRM record.
    ///
    /// A rejected save is a [`FillOutcome::Failure`], not an `Err`; errors are
    /// reserved for transport problems.
    async fn fill_and_save(
        &self,
        target: &TargetHandle,
        lead: &LeadRecord,
    ) -> Result<FillOutcome, DriverError>;
}

/// Receiver for driver-originated log lines.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn log(&self, level: LogLevel, message: String);
}
