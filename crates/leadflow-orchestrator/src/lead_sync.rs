//! Periodic check for new leads.
//!
//! Only reports; starting a run is left to the caller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use leadflow_protocols::{AutomationEvent, LeadStore};
use leadflow_storage::RunStorage;

use crate::event_hub::EventHub;

pub struct LeadSync {
    lead_store: Arc<dyn LeadStore>,
    storage: Arc<RunStorage>,
    events: Arc<EventHub>,
    interval: Duration,
    running: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl LeadSync {
    pub fn new(
        lead_store: Arc<dyn LeadStore>,
        storage: Arc<RunStorage>,
        events: Arc<EventHub>,
        interval: Duration,
    ) -> Self {
        Self {
            lead_store,
            storage,
            events,
            interval,
            running: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// One sync pass. Returns the number of unprocessed leads found, or
    /// `None` when the pass was skipped or failed.
    pub async fn sync_once(&self) -> Option<usize> {
        let auto_start = match self.storage.settings().await {
            Ok(settings) => settings.auto_start,
            Err(e) => {
                self.events.error(format!("Lead sync could not read settings: {}", e)).await;
                return None;
            }
        };
        if !auto_start || !self.lead_store.is_configured() {
            debug!("Lead sync skipped");
            return None;
        }

        match self.lead_store.unprocessed_leads().await {
            Ok(leads) if leads.is_empty() => Some(0),
            Ok(leads) => {
                let count = leads.len();
                self.events.info(format!("Found {} new leads", count)).await;
                self.events.emit(AutomationEvent::LeadsAvailable { count });
                Some(count)
            }
            Err(e) => {
                self.events.error(format!("Lead sync failed: {}", e)).await;
                None
            }
        }
    }

    /// Run `sync_once` every interval until [`stop`](Self::stop).
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let this = self.clone();
        this.running.store(true, Ordering::SeqCst);
        tokio::spawn(async move {
            info!("Lead sync started (every {:?})", this.interval);
            let mut ticker = tokio::time::interval(this.interval);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = this.cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        this.sync_once().await;
                    }
                }
            }

            this.running.store(false, Ordering::SeqCst);
            info!("Lead sync stopped");
        })
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_lead_store_http::MemoryLeadStore;
    use leadflow_protocols::{LeadRecord, LogLevel, SettingsPatch};
    use leadflow_storage::MemoryKvStore;

    struct Fixture {
        sync: Arc<LeadSync>,
        storage: Arc<RunStorage>,
        events: Arc<EventHub>,
    }

    fn fixture(store: MemoryLeadStore) -> Fixture {
        let storage = Arc::new(RunStorage::new(Arc::new(MemoryKvStore::new())));
        let events = Arc::new(EventHub::new(storage.clone(), 16));
        let sync = Arc::new(LeadSync::new(
            Arc::new(store),
            storage.clone(),
            events.clone(),
            Duration::from_millis(20),
        ));
        Fixture { sync, storage, events }
    }

    async fn enable_auto_start(storage: &RunStorage) {
        let patch = SettingsPatch {
            auto_start: Some(true),
            ..Default::default()
        };
        storage.update_settings(&patch).await.unwrap();
    }

    #[tokio::test]
    async fn test_skipped_without_auto_start() {
        let f = fixture(MemoryLeadStore::with_leads(vec![LeadRecord::new(0, "Ann", "Lee")]));
        assert_eq!(f.sync.sync_once().await, None);
        assert!(f.storage.logs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reports_new_leads() {
        let f = fixture(MemoryLeadStore::with_leads(vec![
            LeadRecord::new(0, "Ann", "Lee"),
            LeadRecord::new(0, "Bob", "Ray"),
        ]));
        enable_auto_start(&f.storage).await;
        let mut rx = f.events.subscribe();

        assert_eq!(f.sync.sync_once().await, Some(2));

        let logs = f.storage.logs().await.unwrap();
        assert_eq!(logs.last().unwrap().message, "Found 2 new leads");
        assert_eq!(logs.last().unwrap().level, LogLevel::Info);

        let mut saw_available = false;
        while let Ok(event) = rx.try_recv() {
            if event == (AutomationEvent::LeadsAvailable { count: 2 }) {
                saw_available = true;
            }
        }
        assert!(saw_available);
    }

    #[tokio::test]
    async fn test_empty_store_is_quiet() {
        let f = fixture(MemoryLeadStore::new());
        enable_auto_start(&f.storage).await;
        assert_eq!(f.sync.sync_once().await, Some(0));
        assert!(f.storage.logs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_spawn_and_stop() {
        let f = fixture(MemoryLeadStore::new());
        let handle = f.sync.spawn();
        assert!(f.sync.is_running());

        tokio::time::sleep(Duration::from_millis(50)).await;
        f.sync.stop();
        handle.await.unwrap();
        assert!(!f.sync.is_running());
    }
}
