//! Heartbeat for a live run.
//!
//! While a run is processing, `last_activity_time` is refreshed on a fixed
//! interval so that a slow lead never makes the run look abandoned.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use leadflow_storage::RunStorage;

pub struct KeepAlive {
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl KeepAlive {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            task: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start (or restart) the heartbeat.
    pub fn arm(&self, storage: Arc<RunStorage>) {
        let interval = self.interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let touched = storage
                    .update_state(|state| {
                        if state.is_processing {
                            state.touch(Utc::now());
                            true
                        } else {
                            false
                        }
                    })
                    .await;

                match touched {
                    Ok((_, true)) => trace!("Keep-alive heartbeat"),
                    Ok((_, false)) => {
                        debug!("No run in progress, keep-alive disarming");
                        break;
                    }
                    Err(e) => warn!("Keep-alive failed to touch run state: {}", e),
                }
            }
        });

        if let Some(previous) = self.task.lock().replace(handle) {
            previous.abort();
        }
    }

    pub fn disarm(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.disarm();
    }
}
