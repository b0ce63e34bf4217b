use super::cancel::CancellationRegistry;
use super::job::{Job, SubmitterId};
use super::store::JobQueue;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum StateError {
    /// A thread panicked while holding the state lock; the queue can no
    /// longer be trusted and the process needs a restart.
    #[error("worker state lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, StateError>;

/// Whether a drain loop currently owns the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Idle,
    Running,
}

/// Which submitters a status read covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusScope {
    All,
    Submitter(SubmitterId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub running: bool,
    pub pending: usize,
}

/// What the drain loop should do next
#[derive(Debug, PartialEq, Eq)]
pub enum DrainStep {
    /// Transfer this job
    Process(Job),
    /// The submitter asked to cancel; report and move on
    Skip(Job),
    /// Queue is empty; the run flag has been released
    Finished,
}

#[derive(Debug, Default)]
struct Inner {
    queue: JobQueue,
    cancels: CancellationRegistry,
    run: RunState,
}

/// Queue, cancel flags and run flag under one lock
///
/// Shared between the intake handlers and the drain loop through an `Arc`.
/// The lock is never held across an `.await`.
#[derive(Debug, Default)]
pub struct WorkerState {
    inner: Mutex<Inner>,
}

impl WorkerState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| StateError::Poisoned)
    }

    pub fn enqueue(&self, job: Job) -> Result<()> {
        self.lock()?.queue.enqueue(job);
        Ok(())
    }

    pub fn request_cancel(&self, submitter: SubmitterId) -> Result<()> {
        self.lock()?.cancels.request_cancel(submitter);
        debug!(%submitter, "Cancellation requested");
        Ok(())
    }

    /// Test-and-clear the cancel flag for `submitter`
    pub fn consume_if_set(&self, submitter: SubmitterId) -> Result<bool> {
        Ok(self.lock()?.cancels.consume_if_set(submitter))
    }

    /// Drop every pending job of `submitter` along with any cancel request
    pub fn remove_all_for(&self, submitter: SubmitterId) -> Result<usize> {
        let mut inner = self.lock()?;
        inner.cancels.clear(submitter);
        Ok(inner.queue.remove_all_for(submitter))
    }

    pub fn status(&self, scope: StatusScope) -> Result<QueueStatus> {
        let inner = self.lock()?;
        let pending = match scope {
            StatusScope::All => inner.queue.size(),
            StatusScope::Submitter(id) => inner.queue.size_for(id),
        };

        Ok(QueueStatus {
            running: inner.run == RunState::Running,
            pending,
        })
    }

    pub fn run_state(&self) -> Result<RunState> {
        Ok(self.lock()?.run)
    }

    /// Drop the run flag after a drain ended without reaching `Finished`
    ///
    /// Pending jobs and cancel flags stay; the next trigger starts a fresh
    /// drain. A poisoned lock is left alone, the state is unusable anyway.
    pub fn abandon_drain(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.run = RunState::Idle;
            warn!(pending = inner.queue.size(), "Drain ended abnormally, run flag released");
        }
    }

    /// Claim the run flag for a new drain
    ///
    /// Succeeds only when no drain is active and there is work queued, so
    /// any number of racing callers yields at most one drain.
    pub fn try_begin_drain(&self) -> Result<bool> {
        let mut inner = self.lock()?;

        if inner.run == RunState::Running || inner.queue.is_empty() {
            return Ok(false);
        }

        inner.run = RunState::Running;
        info!(pending = inner.queue.size(), "Drain started");
        Ok(true)
    }

    /// Pop the next job and consume its submitter's cancel flag
    ///
    /// When the queue is empty the run flag goes back to `Idle` and any
    /// leftover cancel flags are discarded, all under the same lock so an
    /// enqueue can never slip in between the empty check and the release.
    pub fn next_step(&self) -> Result<DrainStep> {
        let mut inner = self.lock()?;

        let Some(job) = inner.queue.dequeue() else {
            inner.run = RunState::Idle;
            let stale = inner.cancels.len();
            inner.cancels.clear_all();
            info!(stale_cancel_flags = stale, "Drain finished");
            return Ok(DrainStep::Finished);
        };

        if inner.cancels.consume_if_set(job.submitter_id) {
            Ok(DrainStep::Skip(job))
        } else {
            Ok(DrainStep::Process(job))
        }
    }
}
