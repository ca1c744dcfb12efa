//! The run-control state machine.
//!
//! The implementation is split across several files:
//! - `orchestrator_start.rs` - `start` and `recover`
//! - `orchestrator_step.rs` - processing one lead per step
//! - `orchestrator_control.rs` - `pause`, `resume`, `stop`, `reset`
//! - `orchestrator_dispatch.rs` - the [`Command`](leadflow_protocols::Command) handler

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{broadcast, Mutex};
use tracing::error;

use leadflow_protocols::{
    AutomationEvent, AutomationSettings, FormDriver, LeadStore, RunState, TargetManager,
};
use leadflow_storage::RunStorage;

use crate::config::OrchestratorConfig;
use crate::error::OrchestratorResult;
use crate::event_hub::EventHub;
use crate::keep_alive::KeepAlive;
use crate::scheduler::StepScheduler;

/// What one call to [`Orchestrator::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// No run is processing, or the run is paused.
    Idle,
    /// A lead was attempted and its outcome recorded.
    Processed { success: bool },
    /// The outcome arrived after the run changed and was dropped.
    Discarded,
    /// The cursor reached the end of the queue.
    Completed,
    /// The queue was inconsistent with the run state.
    Stopped,
}

/// What [`Orchestrator::recover`] found at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    NothingToRecover,
    Resumed,
    LeftPaused,
    /// Left for the next `start` to reclaim.
    LeftStale,
}

/// Single owner of run control.
///
/// Construct it once and share the `Arc`; steps re-enter through a weak
/// reference held by the scheduled job.
pub struct Orchestrator {
    pub(crate) storage: Arc<RunStorage>,
    pub(crate) events: Arc<EventHub>,
    pub(crate) targets: Arc<dyn TargetManager>,
    pub(crate) driver: Arc<dyn FormDriver>,
    pub(crate) lead_store: Arc<dyn LeadStore>,
    pub(crate) config: OrchestratorConfig,
    pub(crate) scheduler: StepScheduler,
    pub(crate) keep_alive: KeepAlive,
    /// Held for the whole of `step`, so at most one is in flight.
    pub(crate) step_lock: Mutex<()>,
    /// Serializes concurrent `start` calls.
    pub(crate) start_lock: Mutex<()>,
}

impl Orchestrator {
    pub fn new(
        storage: Arc<RunStorage>,
        events: Arc<EventHub>,
        targets: Arc<dyn TargetManager>,
        driver: Arc<dyn FormDriver>,
        lead_store: Arc<dyn LeadStore>,
        config: OrchestratorConfig,
    ) -> Arc<Self> {
        let keep_alive = KeepAlive::new(config.heartbeat_interval);
        Arc::new(Self {
            storage,
            events,
            targets,
            driver,
            lead_store,
            config,
            scheduler: StepScheduler::new(),
            keep_alive,
            step_lock: Mutex::new(()),
            start_lock: Mutex::new(()),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AutomationEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &Arc<EventHub> {
        &self.events
    }

    pub fn storage(&self) -> &Arc<RunStorage> {
        &self.storage
    }

    pub fn lead_store(&self) -> &Arc<dyn LeadStore> {
        &self.lead_store
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub async fn state(&self) -> OrchestratorResult<RunState> {
        Ok(self.storage.load_state().await?)
    }

    pub async fn settings(&self) -> OrchestratorResult<AutomationSettings> {
        Ok(self.storage.settings().await?)
    }

    /// Whether a step is waiting on its delay.
    pub fn has_pending_step(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn is_keep_alive_armed(&self) -> bool {
        self.keep_alive.is_armed()
    }

    pub(crate) fn schedule_step(self: &Arc<Self>, delay: Duration) {
        let this = Arc::downgrade(self);
        self.scheduler.schedule(delay, move || async move {
            if let Some(orchestrator) = this.upgrade() {
                orchestrator.run_step().await;
            }
        });
    }

    /// Scheduled entry point. Storage failures here are catastrophic and
    /// stop the run.
    fn run_step(self: Arc<Self>) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            if let Err(e) = self.step().await {
                error!("Automation step failed: {}", e);
                if let Err(stop_err) = self.stop(e.to_string()).await {
                    error!("Failed to stop automation after step error: {}", stop_err);
                }
            }
        })
    }

    /// Stop background work without touching persisted state.
    pub fn shutdown(&self) {
        self.scheduler.cancel();
        self.keep_alive.disarm();
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
