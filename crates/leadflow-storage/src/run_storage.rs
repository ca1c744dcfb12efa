//! Typed facade over the four persisted run entries.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use leadflow_protocols::{AutomationSettings, LeadRecord, LogEntry, RunState, SettingsPatch};

use crate::error::StorageError;
use crate::kv::KeyValueStore;

const STATE_KEY: &str = "automation_state";
const LEADS_KEY: &str = "automation_leads";
const LOGS_KEY: &str = "automation_logs";
const CONFIG_KEY: &str = "automation_config";

/// Default number of log entries kept.
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Storage boundary for the orchestrator.
///
/// Every read-modify-write runs under one async lock, so a patch never
/// interleaves with another writer in the same process.
pub struct RunStorage {
    kv: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
    log_capacity: usize,
}

impl RunStorage {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }

    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity.max(1);
        self
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.kv.get(key).await? {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StorageError::Corrupt {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let value = serde_json::to_value(value).map_err(|e| {
            StorageError::Serialization(format!("Failed to serialize '{}': {}", key, e))
        })?;
        self.kv.set(key, &value).await
    }

    // ========================================================================
    // Run state
    // ========================================================================

    /// Current run state; idle defaults when nothing has been stored yet.
    pub async fn load_state(&self) -> Result<RunState, StorageError> {
        Ok(self.read(STATE_KEY).await?.unwrap_or_default())
    }

    /// Replace the run state wholesale.
    pub async fn save_state(&self, state: &RunState) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.write(STATE_KEY, state).await
    }

    /// Patch the run state in place and persist it.
    ///
    /// Returns the new state together with whatever `patch` returned.
    pub async fn update_state<F, R>(&self, patch: F) -> Result<(RunState, R), StorageError>
    where
        F: FnOnce(&mut RunState) -> R + Send,
        R: Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut state: RunState = self.read(STATE_KEY).await?.unwrap_or_default();
        let out = patch(&mut state);
        self.write(STATE_KEY, &state).await?;
        Ok((state, out))
    }

    // ========================================================================
    // Lead queue
    // ========================================================================

    pub async fn load_leads(&self) -> Result<Vec<LeadRecord>, StorageError> {
        Ok(self.read(LEADS_KEY).await?.unwrap_or_default())
    }

    pub async fn save_leads(&self, leads: &[LeadRecord]) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.write(LEADS_KEY, &leads).await?;
        debug!("Persisted lead queue ({} leads)", leads.len());
        Ok(())
    }

    pub async fn clear_leads(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.kv.remove(LEADS_KEY).await
    }

    // ========================================================================
    // Event log
    // ========================================================================

    /// Append to the log, dropping the oldest entries beyond capacity.
    pub async fn append_log(&self, entry: LogEntry) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut logs: Vec<LogEntry> = self.read(LOGS_KEY).await?.unwrap_or_default();
        logs.push(entry);
        if logs.len() > self.log_capacity {
            let excess = logs.len() - self.log_capacity;
            logs.drain(..excess);
        }
        self.write(LOGS_KEY, &logs).await
    }

    pub async fn logs(&self) -> Result<Vec<LogEntry>, StorageError> {
        Ok(self.read(LOGS_KEY).await?.unwrap_or_default())
    }

    pub async fn clear_logs(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.kv.remove(LOGS_KEY).await
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub async fn load_settings(&self) -> Result<Option<AutomationSettings>, StorageError> {
        self.read(CONFIG_KEY).await
    }

    /// Settings currently in force, falling back to defaults.
    pub async fn settings(&self) -> Result<AutomationSettings, StorageError> {
        Ok(self.load_settings().await?.unwrap_or_default())
    }

    /// Store `initial` unless a settings record already exists; return the one in force.
    pub async fn seed_settings(
        &self,
        initial: AutomationSettings,
    ) -> Result<AutomationSettings, StorageError> {
        let _guard = self.write_lock.lock().await;
        if let Some(existing) = self.read(CONFIG_KEY).await? {
            return Ok(existing);
        }
        self.write(CONFIG_KEY, &initial).await?;
        debug!("Seeded automation settings");
        Ok(initial)
    }

    /// Merge a partial update into the stored settings.
    pub async fn update_settings(
        &self,
        patch: &SettingsPatch,
    ) -> Result<AutomationSettings, StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut settings: AutomationSettings = self.read(CONFIG_KEY).await?.unwrap_or_default();
        patch.apply(&mut settings);
        self.write(CONFIG_KEY, &settings).await?;
        Ok(settings)
    }
}

#[cfg(test)]
#[path = "run_storage_tests.rs"]
mod tests;
