//! Fan-out of run events and the persisted run log.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use leadflow_protocols::{AutomationEvent, LogEntry, LogLevel, LogSink};
use leadflow_storage::RunStorage;

/// Broadcasts [`AutomationEvent`]s and keeps the bounded run log.
///
/// Every log line is appended to storage, mirrored to `tracing`, and sent
/// to observers as [`AutomationEvent::Log`]. Sending never blocks; a slow
/// observer sees `Lagged` on its receiver.
pub struct EventHub {
    sender: broadcast::Sender<AutomationEvent>,
    storage: Arc<RunStorage>,
}

impl EventHub {
    pub fn new(storage: Arc<RunStorage>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender, storage }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AutomationEvent> {
        self.sender.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Send to observers. Having none is not an error.
    pub fn emit(&self, event: AutomationEvent) {
        let _ = self.sender.send(event);
    }

    pub async fn log(&self, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry::new(level, message);

        match level {
            LogLevel::Info | LogLevel::Success => info!(target: "leadflow::run", "{}", entry.message),
            LogLevel::Warning => warn!(target: "leadflow::run", "{}", entry.message),
            LogLevel::Error => error!(target: "leadflow::run", "{}", entry.message),
        }

        if let Err(e) = self.storage.append_log(entry.clone()).await {
            warn!("Failed to persist log entry: {}", e);
        }
        self.emit(AutomationEvent::Log(entry));
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message).await;
    }

    pub async fn success(&self, message: impl Into<String>) {
        self.log(LogLevel::Success, message).await;
    }

    pub async fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message).await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message).await;
    }
}

#[async_trait]
impl LogSink for EventHub {
    async fn log(&self, level: LogLevel, message: String) {
        EventHub::log(self, level, message).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_storage::MemoryKvStore;

    fn hub(capacity: usize) -> (EventHub, Arc<RunStorage>) {
        let storage = Arc::new(
            RunStorage::new(Arc::new(MemoryKvStore::new())).with_log_capacity(capacity),
        );
        (EventHub::new(storage.clone(), 16), storage)
    }

    #[tokio::test]
    async fn test_log_persists_and_broadcasts() {
        let (hub, storage) = hub(10);
        let mut rx = hub.subscribe();

        hub.warning("Lead has no email").await;

        let logs = storage.logs().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].level, LogLevel::Warning);

        match rx.recv().await.unwrap() {
            AutomationEvent::Log(entry) => assert_eq!(entry.message, "Lead has no email"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_log_never_exceeds_capacity() {
        let (hub, storage) = hub(3);
        for i in 0..7 {
            hub.info(format!("line {}", i)).await;
        }

        let logs = storage.logs().await.unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].message, "line 4");
        assert_eq!(logs[2].message, "line 6");
    }

    #[tokio::test]
    async fn test_emit_without_observers() {
        let (hub, _) = hub(10);
        assert_eq!(hub.observer_count(), 0);
        hub.emit(AutomationEvent::Started { total: 1 });
    }

    #[tokio::test]
    async fn test_log_sink_relays_driver_lines() {
        let (hub, storage) = hub(10);
        let sink: Arc<dyn LogSink> = Arc::new(hub);

        sink.log(LogLevel::Success, "Saved enquiry".to_string()).await;

        let logs = storage.logs().await.unwrap();
        assert_eq!(logs[0].level, LogLevel::Success);
        assert_eq!(logs[0].message, "Saved enquiry");
    }
}
