//! Command handling: every [`Command`] maps to exactly one reply.

use std::sync::Arc;

use tracing::debug;

use leadflow_protocols::{Command, CommandResponse, LeadRecord, SettingsPatch};

use crate::error::OrchestratorResult;
use crate::orchestrator::Orchestrator;

/// Reply used when a command's `type` is not recognised.
pub const UNKNOWN_COMMAND: &str = "Unknown message type";

impl Orchestrator {
    /// Handle one command. Errors become `{success: false, error}`.
    pub async fn handle(self: &Arc<Self>, command: Command) -> CommandResponse {
        debug!("Handling command {}", command.name());
        self.dispatch(command)
            .await
            .unwrap_or_else(|e| CommandResponse::failure(e.to_string()))
    }

    /// Handle a command still in its JSON form.
    ///
    /// The `type` tag is checked before the payload, so a known command with
    /// a malformed body is reported as invalid rather than unknown.
    pub async fn handle_value(self: &Arc<Self>, value: serde_json::Value) -> CommandResponse {
        let known = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .is_some_and(Command::is_known_type);
        if !known {
            return CommandResponse::failure(UNKNOWN_COMMAND);
        }

        match serde_json::from_value::<Command>(value) {
            Ok(command) => self.handle(command).await,
            Err(e) => CommandResponse::failure(format!("Invalid command: {}", e)),
        }
    }

    async fn dispatch(self: &Arc<Self>, command: Command) -> OrchestratorResult<CommandResponse> {
        let response = match command {
            Command::StartAutomation { leads } => self.handle_start(leads).await?,
            Command::StopAutomation { reason } => {
                let reason = reason.unwrap_or_else(|| "Stopped by user".to_string());
                CommandResponse::ok().with_state(self.stop(reason).await?)
            }
            Command::PauseAutomation => CommandResponse::ok().with_state(self.pause().await?),
            Command::ResumeAutomation => CommandResponse::ok().with_state(self.resume().await?),
            Command::ResetAutomation => CommandResponse::ok()
                .with_state(self.reset().await?)
                .with_message("Automation reset"),
            Command::GetState => CommandResponse::ok().with_state(self.state().await?),
            Command::GetConfig => CommandResponse::ok().with_config(self.settings().await?),
            Command::UpdateConfig { config } => {
                CommandResponse::ok().with_config(self.update_settings(&config).await?)
            }
            Command::GetLogs => CommandResponse::ok().with_logs(self.storage.logs().await?),
            Command::Log { level, message } => {
                self.events.log(level, message).await;
                CommandResponse::ok()
            }
            Command::Ping => CommandResponse::ok().with_message("PONG"),
        };
        Ok(response)
    }

    async fn handle_start(self: &Arc<Self>, leads: Vec<LeadRecord>) -> OrchestratorResult<CommandResponse> {
        let count = leads.len();
        let state = self.start(leads).await?;
        Ok(CommandResponse::ok()
            .with_state(state)
            .with_message(format!("Started automation for {} leads", count)))
    }

    /// Persist a settings patch, re-pointing the Lead Store first so an
    /// invalid endpoint is never stored.
    pub async fn update_settings(
        &self,
        patch: &SettingsPatch,
    ) -> OrchestratorResult<leadflow_protocols::AutomationSettings> {
        if let Some(endpoint) = &patch.api_url {
            self.lead_store.set_endpoint(endpoint)?;
        }
        let settings = self.storage.update_settings(patch).await?;
        self.events.info("Settings updated").await;
        Ok(settings)
    }
}
