//! Hand-written collaborators for orchestrator tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::Notify;

use leadflow_protocols::{
    AutomationEvent, DriverError, FillOutcome, FormDriver, LeadRecord, LeadStore, LeadStoreError, NewLead,
    RunPhase, RunState, SettingsPatch, SheetSummary, TargetError, TargetHandle, TargetManager,
};
use leadflow_storage::{MemoryKvStore, RunStorage};

use crate::config::OrchestratorConfig;
use crate::event_hub::EventHub;
use crate::orchestrator::Orchestrator;

// ============================================================================
// Target manager
// ============================================================================

pub struct MockTargets {
    pub alive: AtomicBool,
    pub acquire_fails: AtomicBool,
    pub acquired: AtomicU32,
    pub focused: AtomicU32,
}

impl MockTargets {
    pub fn new() -> Self {
        Self {
            alive: AtomicBool::new(true),
            acquire_fails: AtomicBool::new(false),
            acquired: AtomicU32::new(0),
            focused: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl TargetManager for MockTargets {
    async fn acquire(&self) -> Result<TargetHandle, TargetError> {
        if self.acquire_fails.load(Ordering::SeqCst) {
            return Err(TargetError::Unavailable("browser not reachable".to_string()));
        }
        let n = self.acquired.fetch_add(1, Ordering::SeqCst) + 1;
        self.alive.store(true, Ordering::SeqCst);
        Ok(TargetHandle::new(format!("tab-{}", n)))
    }

    async fn validate(&self, _target: &TargetHandle) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn focus(&self, _target: &TargetHandle) -> Result<(), TargetError> {
        self.focused.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Form driver
// ============================================================================

/// Lets a test hold a fill open and observe that it started.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

pub enum Fill {
    Succeed,
    Fail(&'static str),
    Reject(&'static str),
    Hang,
    Gated(Arc<Gate>),
}

pub struct ScriptedDriver {
    pub ping_failures: AtomicU32,
    pub pings: AtomicU32,
    pub init_fails: AtomicBool,
    pub script: Mutex<VecDeque<Fill>>,
    pub filled: Mutex<Vec<u32>>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self {
            ping_failures: AtomicU32::new(0),
            pings: AtomicU32::new(0),
            init_fails: AtomicBool::new(false),
            script: Mutex::new(VecDeque::new()),
            filled: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, fill: Fill) {
        self.script.lock().push_back(fill);
    }

    pub fn filled(&self) -> Vec<u32> {
        self.filled.lock().clone()
    }
}

#[async_trait]
impl FormDriver for ScriptedDriver {
    async fn ping(&self, _target: &TargetHandle) -> Result<(), DriverError> {
        let n = self.pings.fetch_add(1, Ordering::SeqCst);
        if n < self.ping_failures.load(Ordering::SeqCst) {
            return Err(DriverError::NotReady("agent not loaded".to_string()));
        }
        Ok(())
    }

    async fn initialize_page(&self, _target: &TargetHandle) -> Result<(), DriverError> {
        if self.init_fails.load(Ordering::SeqCst) {
            return Err(DriverError::Rejected("enquiry form not found".to_string()));
        }
        Ok(())
    }

    async fn fill_and_save(
        &self,
        _target: &TargetHandle,
        lead: &LeadRecord,
    ) -> Result<FillOutcome, DriverError> {
        self.filled.lock().push(lead.row_index);
        let next = self.script.lock().pop_front().unwrap_or(Fill::Succeed);

        match next {
            Fill::Succeed => Ok(FillOutcome::success()),
            Fill::Fail(reason) => Ok(FillOutcome::failure(reason)),
            Fill::Reject(reason) => Err(DriverError::Rejected(reason.to_string())),
            Fill::Hang => futures::future::pending().await,
            Fill::Gated(gate) => {
                gate.entered.notify_one();
                gate.release.notified().await;
                Ok(FillOutcome::success())
            }
        }
    }
}

// ============================================================================
// Lead store
// ============================================================================

pub struct MockLeadStore {
    pub configured: AtomicBool,
    pub mark_fails: AtomicBool,
    pub marked: Mutex<Vec<u32>>,
    pub endpoint: Mutex<String>,
}

impl MockLeadStore {
    pub fn new() -> Self {
        Self {
            configured: AtomicBool::new(true),
            mark_fails: AtomicBool::new(false),
            marked: Mutex::new(Vec::new()),
            endpoint: Mutex::new(String::new()),
        }
    }

    pub fn marked(&self) -> Vec<u32> {
        self.marked.lock().clone()
    }
}

#[async_trait]
impl LeadStore for MockLeadStore {
    fn is_configured(&self) -> bool {
        self.configured.load(Ordering::SeqCst)
    }

    fn set_endpoint(&self, endpoint: &str) -> Result<(), LeadStoreError> {
        if !endpoint.is_empty() && !endpoint.starts_with("https://") {
            return Err(LeadStoreError::InvalidEndpoint(endpoint.to_string()));
        }
        *self.endpoint.lock() = endpoint.to_string();
        Ok(())
    }

    async fn unprocessed_leads(&self) -> Result<Vec<LeadRecord>, LeadStoreError> {
        Ok(Vec::new())
    }

    async fn all_leads(&self) -> Result<Vec<LeadRecord>, LeadStoreError> {
        Ok(Vec::new())
    }

    async fn lead(&self, row_index: u32) -> Result<LeadRecord, LeadStoreError> {
        Err(LeadStoreError::Api(format!("Invalid row index: {}", row_index)))
    }

    async fn mark_processed(&self, row_index: u32) -> Result<(), LeadStoreError> {
        if self.mark_fails.load(Ordering::SeqCst) {
            return Err(LeadStoreError::Status(500));
        }
        self.marked.lock().push(row_index);
        Ok(())
    }

    async fn add_lead(&self, _lead: &NewLead) -> Result<u32, LeadStoreError> {
        Ok(2)
    }

    async fn probe(&self) -> Result<SheetSummary, LeadStoreError> {
        Ok(SheetSummary {
            sheet_name: "Leads".to_string(),
            last_row: 1,
            last_column: 15,
        })
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub orchestrator: Arc<Orchestrator>,
    pub storage: Arc<RunStorage>,
    pub kv: Arc<MemoryKvStore>,
    pub targets: Arc<MockTargets>,
    pub driver: Arc<ScriptedDriver>,
    pub store: Arc<MockLeadStore>,
    completions: tokio::sync::Mutex<broadcast::Receiver<AutomationEvent>>,
}

pub fn test_config() -> OrchestratorConfig {
    OrchestratorConfig::default()
        .with_fill_timeout(Duration::from_millis(200))
        .with_init_timeout(Duration::from_millis(200))
        .with_ping_backoff(Duration::ZERO)
        .with_heartbeat_interval(Duration::from_millis(50))
}

/// Orchestrator over mocks with no delay between leads.
pub async fn harness() -> Harness {
    harness_with(test_config()).await
}

pub async fn harness_with(config: OrchestratorConfig) -> Harness {
    let kv = Arc::new(MemoryKvStore::new());
    let storage = Arc::new(RunStorage::new(kv.clone()));
    let patch = SettingsPatch {
        batch_delay_ms: Some(0),
        ..Default::default()
    };
    storage.update_settings(&patch).await.unwrap();

    let events = Arc::new(EventHub::new(storage.clone(), 256));
    let targets = Arc::new(MockTargets::new());
    let driver = Arc::new(ScriptedDriver::new());
    let store = Arc::new(MockLeadStore::new());

    let orchestrator = Orchestrator::new(
        storage.clone(),
        events,
        targets.clone(),
        driver.clone(),
        store.clone(),
        config,
    );

    let completions = tokio::sync::Mutex::new(orchestrator.subscribe());
    Harness {
        completions,
        orchestrator,
        storage,
        kv,
        targets,
        driver,
        store,
    }
}

/// `n` leads on consecutive sheet rows starting at 2.
pub fn leads(n: u32) -> Vec<LeadRecord> {
    (0..n)
        .map(|i| LeadRecord::new(i + 2, format!("Lead{}", i + 1), "Test"))
        .collect()
}

impl Harness {
    /// Current persisted state.
    ///
    /// A live run must be consistent; a stopped one keeps its counters but
    /// rewinds the cursor, so only the bound is checked there.
    pub async fn state(&self) -> RunState {
        let state = self.storage.load_state().await.unwrap();
        if state.is_processing {
            assert!(state.is_consistent(), "inconsistent live run: {:?}", state);
        } else {
            assert!(state.current_lead_index <= state.total_leads, "{:?}", state);
        }
        state
    }

    /// Poll until `done` holds, failing after two seconds.
    pub async fn wait_until(&self, done: impl Fn(&RunState) -> bool) -> RunState {
        for _ in 0..200 {
            let state = self.state().await;
            if done(&state) {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition never held: {:?}", self.state().await);
    }

    /// Poll until the run reaches `phase`. For `Complete` this also waits
    /// for the wrap-up, so the queue, keep-alive and summary log are settled.
    pub async fn wait_for(&self, phase: RunPhase) -> RunState {
        if phase == RunPhase::Complete {
            self.wait_completed().await;
        }
        self.wait_until(|s| s.phase() == phase).await
    }

    /// Counters of the next `Completed` event, failing after two seconds.
    pub async fn wait_completed(&self) -> (usize, usize) {
        let mut rx = self.completions.lock().await;
        loop {
            match tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
                Ok(Ok(AutomationEvent::Completed {
                    processed, failed, ..
                })) => return (processed, failed),
                Ok(Ok(_)) | Ok(Err(RecvError::Lagged(_))) => continue,
                Ok(Err(RecvError::Closed)) => panic!("event hub closed"),
                Err(_) => panic!("run never completed: {:?}", self.storage.load_state().await),
            }
        }
    }

    pub async fn log_messages(&self) -> Vec<String> {
        self.storage
            .logs()
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.message)
            .collect()
    }
}
