//! Shared handler state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use leadflow_orchestrator::Orchestrator;

pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    start_time: Instant,
}

impl ApiState {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            start_time: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}
