//! Run state subcommand handlers for LeadFlow.
//!
//! These read and clear the storage directly, so they are meant for use
//! while the service is not running.

use tracing::info;

use leadflow_config::Config;
use leadflow_protocols::{LogEntry, RunState};

use crate::server::{open_storage, BoxError};

/// Print the persisted run state and the tail of the run log.
pub(crate) async fn handle_state_command(config: &Config, tail: usize, format: &str) -> Result<(), BoxError> {
    let (storage, settings) = open_storage(config).await?;
    let state = storage.load_state().await?;
    let logs = storage.logs().await?;
    let recent = &logs[logs.len().saturating_sub(tail)..];

    if format == "json" {
        let value = serde_json::json!({
            "state": state,
            "phase": state.phase(),
            "config": settings,
            "logs": recent,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print!("{}", render_state(&state));
    if !recent.is_empty() {
        println!("\nRecent log:");
        for entry in recent {
            println!("{}", render_log_entry(entry));
        }
    }
    Ok(())
}

/// Clear the persisted run, optionally with its log.
pub(crate) async fn handle_reset_command(config: &Config, logs: bool) -> Result<(), BoxError> {
    let (storage, _) = open_storage(config).await?;
    storage.save_state(&RunState::default()).await?;
    storage.clear_leads().await?;
    if logs {
        storage.clear_logs().await?;
    }
    info!("Run state reset");
    println!("Run state reset.");
    Ok(())
}

fn render_state(state: &RunState) -> String {
    let mut out = format!("Phase:     {:?}\n", state.phase());
    if let Some(run_id) = state.run_id {
        out.push_str(&format!("Run:       {}\n", run_id));
    }
    out.push_str(&format!(
        "Progress:  {}/{} ({} succeeded, {} failed)\n",
        state.current_lead_index, state.total_leads, state.processed_count, state.failed_count
    ));
    if let Some(target) = &state.target {
        out.push_str(&format!("CRM tab:   {}\n", target));
    }
    if let Some(started) = state.start_time {
        out.push_str(&format!("Started:   {}\n", started.to_rfc3339()));
    }
    if let Some(active) = state.last_activity_time {
        out.push_str(&format!("Activity:  {}\n", active.to_rfc3339()));
    }
    if let Some(reason) = &state.stop_reason {
        out.push_str(&format!("Stopped:   {}\n", reason));
    }
    out
}

fn render_log_entry(entry: &LogEntry) -> String {
    format!(
        "[{}] {:<7} {}",
        entry.timestamp.format("%H:%M:%S"),
        entry.level.to_string(),
        entry.message
    )
}
