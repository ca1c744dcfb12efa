//! Processing one lead per step.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use leadflow_protocols::validate::lead_problems;
use leadflow_protocols::{
    AutomationEvent, DriverError, FillOutcome, LeadRecord, RunState, TargetHandle,
};

use crate::error::OrchestratorResult;
use crate::orchestrator::{Orchestrator, StepResult};

impl Orchestrator {
    /// Advance the run by one lead, or finish it.
    ///
    /// Normally invoked by the scheduler; calling it directly is safe since
    /// concurrent steps queue on the step lock.
    pub async fn step(self: &Arc<Self>) -> OrchestratorResult<StepResult> {
        let _guard = self.step_lock.lock().await;

        let state = self.storage.load_state().await?;
        if !state.is_running() {
            return Ok(StepResult::Idle);
        }
        if state.is_exhausted() {
            return self.complete(&state).await;
        }

        let leads = self.storage.load_leads().await?;
        let Some(lead) = leads.get(state.current_lead_index).cloned() else {
            let reason = format!(
                "Lead queue corrupted: expected {} leads, found {}",
                state.total_leads,
                leads.len()
            );
            self.stop(reason).await?;
            return Ok(StepResult::Stopped);
        };

        let settings = self.storage.settings().await?;
        let current = state.current_lead_index + 1;
        let total = state.total_leads;
        let name = lead.display_name();

        self.events.emit(AutomationEvent::Progress {
            current,
            total,
            lead: lead.clone(),
        });
        self.events
            .info(format!("Processing lead {}/{}: {}", current, total, name))
            .await;

        let outcome = self
            .attempt(&state, &lead)
            .await
            .with_problems(lead_problems(&lead));
        let success = outcome.is_success();

        let cursor = state.current_lead_index;
        let (after, committed) = self
            .storage
            .update_state(|s| {
                let same_run = s.run_id == state.run_id
                    && s.is_processing
                    && s.current_lead_index == cursor;
                if same_run {
                    s.record_outcome(success, Utc::now());
                }
                same_run
            })
            .await?;

        if !committed {
            debug!("Run changed while {} was in flight, dropping its outcome", name);
            return Ok(StepResult::Discarded);
        }

        if success {
            if let Err(e) = self.lead_store.mark_processed(lead.row_index).await {
                self.events
                    .warning(format!(
                        "Failed to mark row {} as processed: {}",
                        lead.row_index, e
                    ))
                    .await;
            }
        }

        match outcome.reason() {
            None => self.events.success(format!("Processed: {}", name)).await,
            Some(reason) => {
                self.events
                    .error(format!("Failed: {} - {}", name, reason))
                    .await
            }
        }
        for problem in outcome.problems() {
            self.events.warning(format!("{}: {}", name, problem)).await;
        }

        self.events.emit(AutomationEvent::LeadProcessed {
            lead,
            success,
            error: outcome.reason().map(str::to_string),
            problems: outcome.problems().to_vec(),
            current: after.current_lead_index,
            total: after.total_leads,
        });

        if !after.is_processing {
            self.finish(&after).await?;
            return Ok(StepResult::Completed);
        }
        if !after.is_paused {
            self.schedule_step(settings.batch_delay());
        }

        Ok(StepResult::Processed { success })
    }

    /// Drive one lead through the CRM. Every failure becomes an outcome.
    async fn attempt(&self, state: &RunState, lead: &LeadRecord) -> FillOutcome {
        let target = match self.ensure_target(state).await {
            Ok(target) => target,
            Err(reason) => return FillOutcome::failure(reason),
        };

        if let Err(e) = self.targets.focus(&target).await {
            return FillOutcome::failure(e.to_string());
        }

        let fill = self.driver.fill_and_save(&target, lead);
        match tokio::time::timeout(self.config.fill_timeout, fill).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => FillOutcome::failure(e.to_string()),
            Err(_) => {
                FillOutcome::failure(DriverError::Timeout(self.config.fill_timeout.as_secs()).to_string())
            }
        }
    }

    /// The bound target if it is still alive, otherwise a fresh one.
    async fn ensure_target(&self, state: &RunState) -> Result<TargetHandle, String> {
        if let Some(target) = &state.target {
            if self.targets.validate(target).await {
                return Ok(target.clone());
            }
            warn!("CRM tab {} is gone, re-acquiring", target);
        }

        let target = self.targets.acquire().await.map_err(|e| e.to_string())?;
        self.events
            .warning(format!("Re-acquired CRM tab {}", target))
            .await;

        let run_id = state.run_id;
        self.storage
            .update_state(|s| {
                if s.run_id == run_id {
                    s.target = Some(target.clone());
                }
            })
            .await
            .map_err(|e| e.to_string())?;
        Ok(target)
    }

    /// Close a run whose cursor reached the end without the flags dropping.
    async fn complete(&self, state: &RunState) -> OrchestratorResult<StepResult> {
        let run_id = state.run_id;
        let (done, finished) = self
            .storage
            .update_state(|s| {
                let ours = s.run_id == run_id && s.is_processing;
                if ours {
                    s.is_processing = false;
                    s.is_paused = false;
                    s.touch(Utc::now());
                }
                ours
            })
            .await?;
        if !finished {
            return Ok(StepResult::Idle);
        }

        self.finish(&done).await?;
        Ok(StepResult::Completed)
    }

    /// Wrap up a run that has just processed its last lead.
    async fn finish(&self, done: &RunState) -> OrchestratorResult<()> {
        self.scheduler.cancel();
        self.keep_alive.disarm();
        self.storage.clear_leads().await?;

        let duration_ms = done.elapsed_ms(Utc::now());
        self.events
            .success(format!(
                "Automation complete: {} succeeded, {} failed in {}s",
                done.processed_count,
                done.failed_count,
                duration_ms / 1000
            ))
            .await;
        self.events.emit(AutomationEvent::Completed {
            processed: done.processed_count,
            failed: done.failed_count,
            duration_ms,
        });
        Ok(())
    }
}
