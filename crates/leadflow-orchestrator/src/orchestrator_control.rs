//! Pause, resume, stop and reset.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use leadflow_protocols::{AutomationEvent, RunState};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::orchestrator::Orchestrator;

fn position(state: &RunState) -> String {
    format!("{}/{}", state.current_lead_index + 1, state.total_leads)
}

impl Orchestrator {
    /// Suspend a running run at its current cursor.
    ///
    /// A step already in flight finishes and records its outcome, but does
    /// not schedule the next one.
    pub async fn pause(&self) -> OrchestratorResult<RunState> {
        let (state, result) = self
            .storage
            .update_state(|s| {
                if !s.is_processing {
                    Err(OrchestratorError::NotRunning)
                } else if s.is_paused {
                    Err(OrchestratorError::AlreadyPaused)
                } else {
                    s.is_paused = true;
                    Ok(())
                }
            })
            .await?;
        result?;

        self.scheduler.cancel();
        self.keep_alive.disarm();
        self.events
            .info(format!("Automation paused at lead {}", position(&state)))
            .await;
        Ok(state)
    }

    pub async fn resume(self: &Arc<Self>) -> OrchestratorResult<RunState> {
        let (state, result) = self
            .storage
            .update_state(|s| {
                if !(s.is_processing && s.is_paused) {
                    Err(OrchestratorError::NotPaused)
                } else {
                    s.is_paused = false;
                    s.touch(Utc::now());
                    Ok(())
                }
            })
            .await?;
        result?;

        self.keep_alive.arm(self.storage.clone());
        self.events
            .info(format!("Automation resumed at lead {}", position(&state)))
            .await;
        self.schedule_step(Duration::ZERO);
        Ok(state)
    }

    /// End the run. Always succeeds, even when nothing is running.
    ///
    /// Counters are kept; a driver call still in flight has its outcome
    /// discarded when it returns.
    pub async fn stop(&self, reason: impl Into<String>) -> OrchestratorResult<RunState> {
        let reason = reason.into();
        self.scheduler.cancel();
        self.keep_alive.disarm();

        let (state, _) = self
            .storage
            .update_state(|s| {
                s.halt();
                s.stop_reason = Some(reason.clone());
                s.touch(Utc::now());
            })
            .await?;
        self.storage.clear_leads().await?;

        self.events.emit(AutomationEvent::Stopped {
            reason: reason.clone(),
        });
        self.events
            .warning(format!("Automation stopped: {}", reason))
            .await;
        Ok(state)
    }

    /// Forcibly return to a clean idle state.
    pub async fn reset(&self) -> OrchestratorResult<RunState> {
        self.scheduler.cancel();
        self.keep_alive.disarm();

        let state = RunState::default();
        self.storage.save_state(&state).await?;
        self.storage.clear_leads().await?;
        self.events.info("Automation reset").await;
        Ok(state)
    }
}
