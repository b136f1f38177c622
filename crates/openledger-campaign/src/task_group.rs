//! Bounded fan-out of independent store writes.
//!
//! A [`TaskGroup`] runs at most `workers` tasks at once and reports the
//! first error. Once a task has failed:
//!
//! - tasks still queued for a permit skip their work,
//! - [`TaskGroup::wait`] stops waiting and returns the error,
//! - tasks already running are detached and finish on their own. Their
//!   writes may land after the error was returned.
//!
//! Groups built with [`TaskGroup::sibling`] share the latch, so a failure in
//! one stops queued work in the other. Dropping a group never aborts its
//! tasks; they are detached the same way.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use openledger_types::{LedgerError, LedgerResult};

/// Semaphore-bounded task set with a first-error latch.
pub struct TaskGroup {
    name: &'static str,
    permits: Arc<Semaphore>,
    failed: Arc<AtomicBool>,
    skipped: Arc<AtomicUsize>,
    tasks: JoinSet<LedgerResult<()>>,
}

impl TaskGroup {
    /// `workers` is clamped to at least one.
    #[must_use]
    pub fn new(name: &'static str, workers: usize) -> Self {
        Self {
            name,
            permits: Arc::new(Semaphore::new(workers.max(1))),
            failed: Arc::new(AtomicBool::new(false)),
            skipped: Arc::new(AtomicUsize::new(0)),
            tasks: JoinSet::new(),
        }
    }

    /// A new group with its own `workers` permits that shares this group's
    /// first-error latch.
    #[must_use]
    pub fn sibling(&self, name: &'static str, workers: usize) -> Self {
        Self {
            name,
            permits: Arc::new(Semaphore::new(workers.max(1))),
            failed: Arc::clone(&self.failed),
            skipped: Arc::new(AtomicUsize::new(0)),
            tasks: JoinSet::new(),
        }
    }

    /// Queue `work`. It starts once a permit is free.
    pub fn spawn<F>(&mut self, work: F)
    where
        F: Future<Output = LedgerResult<()>> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let failed = Arc::clone(&self.failed);
        let skipped = Arc::clone(&self.skipped);
        self.tasks.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return Err(LedgerError::Internal("task group semaphore closed".into()));
            };
            if failed.load(Ordering::Acquire) {
                skipped.fetch_add(1, Ordering::Relaxed);
                return Ok(());
            }
            let result = work.await;
            if result.is_err() {
                failed.store(true, Ordering::Release);
            }
            result
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every task, or for the first failure. Returns the number of
    /// tasks that completed their work.
    pub async fn wait(mut self) -> LedgerResult<usize> {
        let mut completed: usize = 0;
        while let Some(joined) = self.tasks.join_next().await {
            let err = match joined {
                Ok(Ok(())) => {
                    completed += 1;
                    continue;
                }
                Ok(Err(err)) => err,
                Err(join_err) => {
                    LedgerError::Internal(format!("{} worker failed: {join_err}", self.name))
                }
            };
            self.failed.store(true, Ordering::Release);
            let in_flight = self.tasks.len();
            self.tasks.detach_all();
            warn!(group = self.name, in_flight, error = %err, "Flush aborted on first error");
            return Err(err);
        }
        let skipped = self.skipped.load(Ordering::Relaxed);
        debug!(group = self.name, completed, skipped, "Task group drained");
        Ok(completed.saturating_sub(skipped))
    }
}

impl Drop for TaskGroup {
    fn drop(&mut self) {
        if !self.tasks.is_empty() {
            debug!(group = self.name, in_flight = self.tasks.len(), "Detaching unfinished tasks");
            self.tasks.detach_all();
        }
    }
}
