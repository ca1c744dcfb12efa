//! Cancellable one-shot delayed jobs.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Holds at most one pending job.
///
/// Scheduling a new job cancels the pending one. A job whose delay has
/// elapsed runs to completion even if it is superseded or cancelled while
/// running.
#[derive(Default)]
pub struct StepScheduler {
    pending: Arc<Mutex<Option<(u64, CancellationToken)>>>,
    generation: AtomicU64,
}

impl StepScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` once after `delay`, replacing any pending job.
    pub fn schedule<F, Fut>(&self, delay: Duration, job: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();

        if let Some((_, previous)) = self.pending.lock().replace((generation, token.clone())) {
            previous.cancel();
        }

        let pending = self.pending.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    trace!("Scheduled job {} cancelled", generation);
                }
                _ = tokio::time::sleep(delay) => {
                    {
                        let mut slot = pending.lock();
                        if matches!(slot.as_ref(), Some((g, _)) if *g == generation) {
                            *slot = None;
                        }
                    }
                    job().await;
                }
            }
        });
    }

    /// Drop the pending job, if any.
    pub fn cancel(&self) {
        if let Some((generation, token)) = self.pending.lock().take() {
            trace!("Cancelling scheduled job {}", generation);
            token.cancel();
        }
    }

    /// Whether a job is waiting for its delay to elapse.
    pub fn is_pending(&self) -> bool {
        self.pending.lock().is_some()
    }
}

impl Drop for StepScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    fn counting_job(counter: &Arc<AtomicU32>) -> impl FnOnce() -> futures::future::Ready<()> + Send + 'static {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_runs_after_delay() {
        let scheduler = StepScheduler::new();
        let counter = Arc::new(AtomicU32::new(0));

        scheduler.schedule(Duration::from_secs(5), counting_job(&counter));
        assert!(scheduler.is_pending());

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_job() {
        let scheduler = StepScheduler::new();
        let counter = Arc::new(AtomicU32::new(0));

        scheduler.schedule(Duration::from_secs(1), counting_job(&counter));
        scheduler.cancel();
        assert!(!scheduler.is_pending());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_schedule_supersedes_pending() {
        let scheduler = StepScheduler::new();
        let first = Arc::new(AtomicU32::new(0));
        let second = Arc::new(AtomicU32::new(0));

        scheduler.schedule(Duration::from_secs(10), counting_job(&first));
        scheduler.schedule(Duration::from_secs(1), counting_job(&second));

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_job_is_not_aborted() {
        let scheduler = Arc::new(StepScheduler::new());
        let finished = Arc::new(AtomicU32::new(0));

        let done = finished.clone();
        scheduler.schedule(Duration::ZERO, move || async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            done.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        scheduler.cancel();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }
}
