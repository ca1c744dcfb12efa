//! # LeadFlow Orchestrator
//!
//! Drives one automation run at a time through the lead queue:
//!
//! ```text
//! Idle ──start──▶ Running ⇄ Paused ──▶ Complete | Stopped ──▶ Idle
//! ```
//!
//! - [`Orchestrator`] - the run-control state machine and command handler
//! - [`StepScheduler`] - one pending delayed job at a time, cancellable
//! - [`KeepAlive`] - heartbeat that keeps a live run from looking abandoned
//! - [`EventHub`] - broadcast of [`AutomationEvent`](leadflow_protocols::AutomationEvent)s plus the persisted log
//! - [`LeadSync`] - periodic check for new leads in the store
//!
//! All run state goes through [`RunStorage`](leadflow_storage::RunStorage);
//! nothing is kept in process-global variables.

pub mod config;
pub mod error;
pub mod event_hub;
pub mod keep_alive;
pub mod lead_sync;
pub mod orchestrator;
mod orchestrator_control;
mod orchestrator_dispatch;
mod orchestrator_start;
mod orchestrator_step;
pub mod scheduler;

#[cfg(test)]
mod test_support;

pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, OrchestratorResult};
pub use event_hub::EventHub;
pub use keep_alive::KeepAlive;
pub use lead_sync::LeadSync;
pub use orchestrator::{Orchestrator, RecoveryAction, StepResult};
pub use orchestrator_dispatch::UNKNOWN_COMMAND;
pub use scheduler::StepScheduler;
