//! Orchestrator timing configuration.

use std::time::Duration;

/// Timeouts and intervals the orchestrator runs with.
///
/// Built from the `[automation]` config section by the binary; the defaults
/// match the shipped `config/default.toml`.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Bound on one `fill_and_save` call.
    pub fill_timeout: Duration,

    /// Bound on `initialize_page` during start.
    pub init_timeout: Duration,

    /// Bound on one readiness ping.
    pub ping_timeout: Duration,

    /// Base backoff between readiness pings; attempt `k` waits `k` times this.
    pub ping_backoff: Duration,

    /// Age after which a persisted run counts as abandoned.
    pub staleness_threshold: Duration,

    /// Keep-alive heartbeat period.
    pub heartbeat_interval: Duration,

    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fill_timeout: Duration::from_secs(30),
            init_timeout: Duration::from_secs(60),
            ping_timeout: Duration::from_secs(10),
            ping_backoff: Duration::from_secs(1),
            staleness_threshold: Duration::from_secs(3600),
            heartbeat_interval: Duration::from_secs(20),
            event_capacity: 256,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_fill_timeout(mut self, timeout: Duration) -> Self {
        self.fill_timeout = timeout;
        self
    }

    pub fn with_init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = timeout;
        self
    }

    pub fn with_staleness_threshold(mut self, threshold: Duration) -> Self {
        self.staleness_threshold = threshold;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_ping_backoff(mut self, backoff: Duration) -> Self {
        self.ping_backoff = backoff;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.fill_timeout, Duration::from_secs(30));
        assert_eq!(config.init_timeout, Duration::from_secs(60));
        assert_eq!(config.staleness_threshold, Duration::from_secs(3600));
        assert!(config.heartbeat_interval < config.staleness_threshold);
    }

    #[test]
    fn test_builders() {
        let config = OrchestratorConfig::default()
            .with_fill_timeout(Duration::from_millis(50))
            .with_ping_backoff(Duration::ZERO);
        assert_eq!(config.fill_timeout, Duration::from_millis(50));
        assert_eq!(config.ping_backoff, Duration::ZERO);
    }
}
