//! Caller-facing run-control commands.

use serde::{Deserialize, Serialize};

use crate::event::{LogEntry, LogLevel};
use crate::lead::LeadRecord;
use crate::run::{AutomationSettings, RunPhase, RunState, SettingsPatch};

/// Closed set of commands accepted by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    StartAutomation {
        leads: Vec<LeadRecord>,
    },
    StopAutomation {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    PauseAutomation,
    ResumeAutomation,
    ResetAutomation,
    GetState,
    GetConfig,
    UpdateConfig {
        config: SettingsPatch,
    },
    GetLogs,
    /// Relay a driver-side log line to observers.
    Log {
        level: LogLevel,
        message: String,
    },
    Ping,
}

impl Command {
    /// Every accepted `type` tag.
    pub const TYPES: &'static [&'static str] = &[
        "START_AUTOMATION",
        "STOP_AUTOMATION",
        "PAUSE_AUTOMATION",
        "RESUME_AUTOMATION",
        "RESET_AUTOMATION",
        "GET_STATE",
        "GET_CONFIG",
        "UPDATE_CONFIG",
        "GET_LOGS",
        "LOG",
        "PING",
    ];

    /// Whether `tag` names a command, regardless of its payload.
    pub fn is_known_type(tag: &str) -> bool {
        Self::TYPES.contains(&tag)
    }

    /// Wire name of the command, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartAutomation { .. } => "START_AUTOMATION",
            Self::StopAutomation { .. } => "STOP_AUTOMATION",
            Self::PauseAutomation => "PAUSE_AUTOMATION",
            Self::ResumeAutomation => "RESUME_AUTOMATION",
            Self::ResetAutomation => "RESET_AUTOMATION",
            Self::GetState => "GET_STATE",
            Self::GetConfig => "GET_CONFIG",
            Self::UpdateConfig { .. } => "UPDATE_CONFIG",
            Self::GetLogs => "GET_LOGS",
            Self::Log { .. } => "LOG",
            Self::Ping => "PING",
        }
    }
}

/// Reply to every [`Command`]: `{success, ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<RunState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<RunPhase>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<AutomationSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<LogEntry>>,
}

impl CommandResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_state(mut self, state: RunState) -> Self {
        self.phase = Some(state.phase());
        self.state = Some(state);
        self
    }

    pub fn with_config(mut self, config: AutomationSettings) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_logs(mut self, logs: Vec<LogEntry>) -> Self {
        self.logs = Some(logs);
        self
    }
}
