//! Starting a run and picking one up after a restart.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use leadflow_protocols::{AutomationEvent, DriverError, LeadRecord, RunState, TargetHandle};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::orchestrator::{Orchestrator, RecoveryAction};

impl Orchestrator {
    /// Begin a run over `leads`, in the given order.
    pub async fn start(self: &Arc<Self>, leads: Vec<LeadRecord>) -> OrchestratorResult<RunState> {
        if leads.is_empty() {
            return Err(OrchestratorError::EmptyQueue);
        }
        if !self.lead_store.is_configured() {
            return Err(OrchestratorError::NotConfigured);
        }

        let _guard = self.start_lock.lock().await;
        let attempts = self.storage.settings().await?.retry_attempts.max(1);
        self.reclaim_or_reject().await?;

        let total = leads.len();
        let fresh = RunState::begin(total, Utc::now());
        let run_id = fresh.run_id;
        self.storage.save_state(&fresh).await?;
        self.storage.save_leads(&leads).await?;
        info!("Run {:?} created for {} leads", run_id, total);

        let target = match self.targets.acquire().await {
            Ok(target) => target,
            Err(e) => {
                self.rollback(run_id).await?;
                self.events
                    .error(format!("Could not open the CRM tab: {}", e))
                    .await;
                return Err(OrchestratorError::TargetUnavailable(e.to_string()));
            }
        };

        let (_, bound) = self
            .storage
            .update_state(|state| {
                let ours = state.run_id == run_id && state.is_processing;
                if ours {
                    state.target = Some(target.clone());
                }
                ours
            })
            .await?;
        if !bound {
            return Err(OrchestratorError::Interrupted);
        }

        if let Err(e) = self.prepare_driver(&target, attempts).await {
            self.rollback(run_id).await?;
            self.events
                .error(format!("CRM initialization failed: {}", e))
                .await;
            return Err(OrchestratorError::InitializationFailed(e.to_string()));
        }

        let state = self.storage.load_state().await?;
        if state.run_id != run_id || !state.is_processing {
            return Err(OrchestratorError::Interrupted);
        }

        self.keep_alive.arm(self.storage.clone());
        self.events.emit(AutomationEvent::Started { total });
        self.events
            .info(format!("Starting automation for {} leads", total))
            .await;
        self.schedule_step(Duration::ZERO);

        Ok(state)
    }

    /// Reject a live conflicting run; clear one that is abandoned.
    async fn reclaim_or_reject(&self) -> OrchestratorResult<()> {
        let current = self.storage.load_state().await?;
        if !current.is_processing {
            return Ok(());
        }

        let stale = current.is_stale(Utc::now(), self.config.staleness_threshold);
        if !stale && self.target_alive(&current).await {
            return Err(OrchestratorError::AlreadyRunning);
        }

        self.events.warning("Clearing stale automation state").await;
        self.scheduler.cancel();
        self.keep_alive.disarm();
        self.storage.update_state(|state| state.halt()).await?;
        self.storage.clear_leads().await?;
        Ok(())
    }

    pub(crate) async fn target_alive(&self, state: &RunState) -> bool {
        match &state.target {
            Some(target) => self.targets.validate(target).await,
            None => false,
        }
    }

    /// Undo a failed start, unless something else already replaced the run.
    async fn rollback(&self, run_id: Option<Uuid>) -> OrchestratorResult<()> {
        let (_, rolled_back) = self
            .storage
            .update_state(|state| {
                let ours = state.run_id == run_id;
                if ours {
                    *state = RunState::default();
                }
                ours
            })
            .await?;
        if rolled_back {
            self.storage.clear_leads().await?;
            debug!("Rolled back run {:?}", run_id);
        }
        Ok(())
    }

    /// Readiness handshake with up to `attempts` pings, then the one-time
    /// page initialization.
    async fn prepare_driver(&self, target: &TargetHandle, attempts: u32) -> Result<(), DriverError> {
        let mut attempt = 1;
        loop {
            let ping = tokio::time::timeout(self.config.ping_timeout, self.driver.ping(target))
                .await
                .unwrap_or(Err(DriverError::Timeout(self.config.ping_timeout.as_secs())));

            match ping {
                Ok(()) => break,
                Err(e) if attempt < attempts => {
                    warn!("Driver not ready (attempt {}/{}): {}", attempt, attempts, e);
                    tokio::time::sleep(self.config.ping_backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }

        tokio::time::timeout(self.config.init_timeout, self.driver.initialize_page(target))
            .await
            .unwrap_or(Err(DriverError::Timeout(self.config.init_timeout.as_secs())))
    }

    /// Pick up a run left behind by a previous process.
    pub async fn recover(self: &Arc<Self>) -> OrchestratorResult<RecoveryAction> {
        let state = self.storage.load_state().await?;
        if !state.is_processing {
            return Ok(RecoveryAction::NothingToRecover);
        }

        let position = format!("{}/{}", state.current_lead_index + 1, state.total_leads);

        if state.is_stale(Utc::now(), self.config.staleness_threshold) {
            self.events
                .warning(format!(
                    "Found stale automation state at lead {}; it will be cleared on next start",
                    position
                ))
                .await;
            return Ok(RecoveryAction::LeftStale);
        }

        if state.is_paused {
            self.events
                .info(format!("Automation paused at lead {}", position))
                .await;
            return Ok(RecoveryAction::LeftPaused);
        }

        if !self.target_alive(&state).await {
            self.events
                .warning(format!(
                    "CRM tab for the interrupted run at lead {} is gone; start again to reclaim it",
                    position
                ))
                .await;
            return Ok(RecoveryAction::LeftStale);
        }

        self.keep_alive.arm(self.storage.clone());
        self.events
            .info(format!("Resuming interrupted run at lead {}", position))
            .await;
        self.schedule_step(Duration::ZERO);
        Ok(RecoveryAction::Resumed)
    }
}
