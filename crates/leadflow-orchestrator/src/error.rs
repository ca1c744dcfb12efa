//! Error types for run control.

use leadflow_storage::StorageError;
use thiserror::Error;

/// Rejections and failures surfaced by [`Orchestrator`](crate::Orchestrator) commands.
///
/// Per-lead failures are never errors; they only move the counters.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("No leads to process")]
    EmptyQueue,

    /// The Lead Store has no endpoint.
    #[error("Lead store is not configured")]
    NotConfigured,

    /// A fresh run with a live target already owns the CRM tab.
    #[error("Automation already in progress")]
    AlreadyRunning,

    #[error("CRM tab unavailable: {0}")]
    TargetUnavailable(String),

    #[error("CRM initialization failed: {0}")]
    InitializationFailed(String),

    /// The run was stopped or reset while `start` was still preparing it.
    #[error("Automation start was interrupted")]
    Interrupted,

    #[error("No automation in progress")]
    NotRunning,

    #[error("Automation is already paused")]
    AlreadyPaused,

    #[error("No paused automation to resume")]
    NotPaused,

    #[error("Lead store error: {0}")]
    LeadStore(#[from] leadflow_protocols::LeadStoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
