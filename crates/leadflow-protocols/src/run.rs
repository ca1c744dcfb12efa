//! Run state and the persisted automation settings.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque handle to the browser tab hosting the CRM.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetHandle(String);

impl TargetHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Observable phase of a run, derived from [`RunState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Running,
    Paused,
    Complete,
    Stopped,
}

/// The single in-flight (or idle) automation run.
///
/// Persisted after every transition so a restarted process can pick it up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunState {
    /// Identity of the current run; changes on every start.
    pub run_id: Option<Uuid>,
    pub is_processing: bool,
    pub is_paused: bool,
    /// 0-based cursor into the lead queue.
    pub current_lead_index: usize,
    pub total_leads: usize,
    pub processed_count: usize,
    pub failed_count: usize,
    pub target: Option<TargetHandle>,
    pub start_time: Option<DateTime<Utc>>,
    pub last_activity_time: Option<DateTime<Utc>>,
    pub stop_reason: Option<String>,
}

impl RunState {
    /// Fresh running state for a queue of `total` leads.
    pub fn begin(total: usize, now: DateTime<Utc>) -> Self {
        Self {
            run_id: Some(Uuid::new_v4()),
            is_processing: true,
            total_leads: total,
            start_time: Some(now),
            last_activity_time: Some(now),
            ..Default::default()
        }
    }

    pub fn phase(&self) -> RunPhase {
        if self.is_processing {
            if self.is_paused {
                RunPhase::Paused
            } else {
                RunPhase::Running
            }
        } else if self.stop_reason.is_some() {
            RunPhase::Stopped
        } else if self.total_leads > 0 && self.current_lead_index == self.total_leads {
            RunPhase::Complete
        } else {
            RunPhase::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_processing && !self.is_paused
    }

    /// Leads left before the cursor reaches the end of the queue.
    pub fn remaining(&self) -> usize {
        self.total_leads.saturating_sub(self.current_lead_index)
    }

    pub fn is_exhausted(&self) -> bool {
        self.current_lead_index >= self.total_leads
    }

    /// Whether the heartbeat is older than `threshold`.
    ///
    /// A state that never recorded activity is always stale.
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        match self.last_activity_time {
            None => true,
            Some(last) => (now - last)
                .to_std()
                .map(|age| age >= threshold)
                .unwrap_or(false),
        }
    }

    /// Counter and cursor invariants that must hold at every observation point.
    ///
    /// A processing run always has a lead left under its cursor.
    pub fn is_consistent(&self) -> bool {
        self.current_lead_index <= self.total_leads
            && self.processed_count + self.failed_count == self.current_lead_index
            && (!self.is_processing || self.current_lead_index < self.total_leads)
    }

    /// Record one lead outcome and advance the cursor.
    ///
    /// The outcome of the last lead also ends processing, paused or not.
    pub fn record_outcome(&mut self, success: bool, now: DateTime<Utc>) {
        if success {
            self.processed_count += 1;
        } else {
            self.failed_count += 1;
        }
        self.current_lead_index += 1;
        self.last_activity_time = Some(now);
        if self.is_exhausted() {
            self.is_processing = false;
            self.is_paused = false;
        }
    }

    /// End processing and rewind the cursor, keeping the counters.
    pub fn halt(&mut self) {
        self.is_processing = false;
        self.is_paused = false;
        self.current_lead_index = 0;
        self.total_leads = 0;
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_time = Some(now);
    }

    /// Milliseconds since the run started.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        self.start_time
            .map(|start| (now - start).num_milliseconds().max(0) as u64)
            .unwrap_or(0)
    }
}

/// User-editable configuration record, persisted alongside the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationSettings {
    /// Lead Store endpoint.
    #[serde(default)]
    pub api_url: String,

    /// Delay between leads, in milliseconds.
    #[serde(default = "default_batch_delay", rename = "batchDelay")]
    pub batch_delay_ms: u64,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default)]
    pub auto_start: bool,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            batch_delay_ms: default_batch_delay(),
            retry_attempts: default_retry_attempts(),
            auto_start: false,
        }
    }
}

impl AutomationSettings {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

fn default_batch_delay() -> u64 {
    2000
}

fn default_retry_attempts() -> u32 {
    3
}

/// Partial update applied by `UPDATE_CONFIG`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(rename = "batchDelay", skip_serializing_if = "Option::is_none")]
    pub batch_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start: Option<bool>,
}

impl SettingsPatch {
    pub fn apply(&self, settings: &mut AutomationSettings) {
        if let Some(api_url) = &self.api_url {
            settings.api_url = api_url.trim().to_string();
        }
        if let Some(delay) = self.batch_delay_ms {
            settings.batch_delay_ms = delay;
        }
        if let Some(retries) = self.retry_attempts {
            settings.retry_attempts = retries;
        }
        if let Some(auto_start) = self.auto_start {
            settings.auto_start = auto_start;
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
