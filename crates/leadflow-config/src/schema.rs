//! Configuration schema definitions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use leadflow_protocols::AutomationSettings;

use crate::loader::ConfigLoader;

/// Base directory for LeadFlow's own files (`~/.leadflow`).
pub fn leadflow_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".leadflow"))
        .unwrap_or_else(|| PathBuf::from(".leadflow"))
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub lead_store: LeadStoreConfig,

    #[serde(default)]
    pub automation: AutomationConfig,

    #[serde(default)]
    pub crm: CrmConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Settings record used the first time the service starts with an empty store.
    pub fn initial_settings(&self) -> AutomationSettings {
        AutomationSettings {
            api_url: self.lead_store.endpoint.trim().to_string(),
            batch_delay_ms: self.automation.batch_delay_ms,
            retry_attempts: self.automation.retry_attempts,
            auto_start: self.automation.auto_start,
        }
    }
}

/// Control API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Lead Store (spreadsheet web app) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadStoreConfig {
    /// Deployed web app URL. Empty means "not configured".
    #[serde(default)]
    pub endpoint: String,

    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,
}

impl Default for LeadStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_seconds: default_request_timeout(),
        }
    }
}

impl LeadStoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_request_timeout() -> u64 {
    15
}

/// Run pacing, timeouts and recovery thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Delay between leads.
    #[serde(default = "default_batch_delay")]
    pub batch_delay_ms: u64,

    /// Driver readiness probes before page initialization.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Periodically look for new leads in the store.
    #[serde(default)]
    pub auto_start: bool,

    #[serde(default = "default_fill_timeout")]
    pub fill_timeout_seconds: u64,

    #[serde(default = "default_init_timeout")]
    pub init_timeout_seconds: u64,

    /// Age after which a persisted running state may be reclaimed.
    #[serde(default = "default_staleness")]
    pub staleness_threshold_seconds: u64,

    #[serde(default = "default_heartbeat")]
    pub heartbeat_interval_seconds: u64,

    #[serde(default = "default_sync_interval")]
    pub sync_interval_minutes: u64,

    /// Maximum persisted log entries.
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            batch_delay_ms: default_batch_delay(),
            retry_attempts: default_retry_attempts(),
            auto_start: false,
            fill_timeout_seconds: default_fill_timeout(),
            init_timeout_seconds: default_init_timeout(),
            staleness_threshold_seconds: default_staleness(),
            heartbeat_interval_seconds: default_heartbeat(),
            sync_interval_minutes: default_sync_interval(),
            log_capacity: default_log_capacity(),
        }
    }
}

impl AutomationConfig {
    pub fn fill_timeout(&self) -> Duration {
        Duration::from_secs(self.fill_timeout_seconds)
    }

    pub fn init_timeout(&self) -> Duration {
        Duration::from_secs(self.init_timeout_seconds)
    }

    pub fn staleness_threshold(&self) -> Duration {
        Duration::from_secs(self.staleness_threshold_seconds)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_seconds)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_minutes * 60)
    }
}

fn default_batch_delay() -> u64 {
    2000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_fill_timeout() -> u64 {
    30
}

fn default_init_timeout() -> u64 {
    60
}

fn default_staleness() -> u64 {
    3600
}

fn default_heartbeat() -> u64 {
    20
}

fn default_sync_interval() -> u64 {
    30
}

fn default_log_capacity() -> usize {
    100
}

/// Location of the CRM portal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmConfig {
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Page the driver expects to start from.
    #[serde(default = "default_entry_path")]
    pub entry_path: String,

    /// Wait after reload or navigation before the page is used.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            entry_path: default_entry_path(),
            settle_delay_ms: default_settle_delay(),
        }
    }
}

impl CrmConfig {
    pub fn entry_url(&self) -> String {
        format!("{}{}", self.origin.trim_end_matches('/'), self.entry_path)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

fn default_origin() -> String {
    "https://portal.redraincorp.com".to_string()
}

fn default_entry_path() -> String {
    "/enquiriesSummary".to_string()
}

fn default_settle_delay() -> u64 {
    3000
}

/// Chrome instance driven over the DevTools protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    #[serde(default)]
    pub headless: bool,

    /// Persistent profile so the CRM login survives restarts.
    #[serde(default)]
    pub profile_dir: Option<PathBuf>,

    /// Page-embedded driver script injected into the CRM tab.
    #[serde(default)]
    pub driver_script: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_port: default_debug_port(),
            headless: false,
            profile_dir: None,
            driver_script: None,
        }
    }
}

impl BrowserConfig {
    pub fn resolved_profile_dir(&self) -> PathBuf {
        self.profile_dir
            .as_deref()
            .map(ConfigLoader::expand_path)
            .unwrap_or_else(|| leadflow_dir().join("browser-profile"))
    }

    pub fn resolved_driver_script(&self) -> Option<PathBuf> {
        self.driver_script.as_deref().map(ConfigLoader::expand_path)
    }
}

fn default_debug_port() -> u16 {
    9222
}

/// Durable run storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .as_deref()
            .map(ConfigLoader::expand_path)
            .unwrap_or_else(|| leadflow_dir().join("state"))
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
