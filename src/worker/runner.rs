//! Queue worker - drains the shared queue one job at a time

use super::progress::{Progress, ProgressReporter, progress_line};
use super::transfer::{DeliverError, FetchError, TransferAgent};
use crate::messaging::{self, MessageRef, NotificationSink};
use crate::observability::Metrics;
use crate::queue::{DrainStep, Job, QueueStatus, StateError, StatusScope, SubmitterId, WorkerState};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Why a single job did not complete
#[derive(Debug, Error)]
pub enum JobError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("delivery failed: {0}")]
    Deliver(#[from] DeliverError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl JobError {
    pub fn reason(&self) -> String {
        match self {
            JobError::Fetch(e) => e.reason(),
            JobError::Deliver(e) => e.reason(),
            JobError::Internal(_) => "internal error".to_string(),
        }
    }
}

/// Terminal outcome counts for one drain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub delivered: usize,
    pub failed: usize,
    pub cancelled: usize,
}

pub fn started_text(url: &str) -> String {
    format!("⬇️ Downloading:\n{}", url)
}

pub fn progress_text(url: &str, progress: Progress) -> String {
    format!("⬇️ Downloading:\n{}\n{}", url, progress_line(progress))
}

pub fn uploading_text(url: &str) -> String {
    format!("⬆️ Uploading:\n{}", url)
}

pub fn cancelled_text(url: &str) -> String {
    format!("🚫 Cancelled:\n{}", url)
}

pub fn done_text(url: &str) -> String {
    format!("✅ Done:\n{}", url)
}

pub fn failure_text(url: &str, error: &JobError) -> String {
    match error {
        JobError::Fetch(_) => format!("❌ Download failed:\n{}\nReason: {}", url, error.reason()),
        JobError::Deliver(_) => format!("⚠️ Delivery failed:\n{}\nReason: {}", url, error.reason()),
        JobError::Internal(_) => format!("⚠️ Error:\n{}\nReason: {}", url, error.reason()),
    }
}

/// Single sequential worker over a shared [`WorkerState`]
///
/// Cheap to clone; every clone drives the same queue and the run flag in
/// the state guarantees only one drain is active at a time.
#[derive(Clone)]
pub struct QueueWorker {
    state: Arc<WorkerState>,
    agent: Arc<dyn TransferAgent>,
    sink: Arc<dyn NotificationSink>,
    metrics: Arc<Metrics>,
}

impl QueueWorker {
    pub fn new(
        state: Arc<WorkerState>,
        agent: Arc<dyn TransferAgent>,
        sink: Arc<dyn NotificationSink>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            state,
            agent,
            sink,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn enqueue(&self, job: Job) -> Result<(), StateError> {
        self.state.enqueue(job)?;
        self.metrics.job_enqueued();
        Ok(())
    }

    pub fn request_cancel(&self, submitter: SubmitterId) -> Result<(), StateError> {
        self.state.request_cancel(submitter)
    }

    pub fn remove_all_for(&self, submitter: SubmitterId) -> Result<usize, StateError> {
        self.state.remove_all_for(submitter)
    }

    pub fn status(&self, scope: StatusScope) -> Result<QueueStatus, StateError> {
        self.state.status(scope)
    }

    /// Spawn a drain unless one is already running or there is nothing to do
    ///
    /// Returns the handle of the spawned drain, or `None` when no drain was
    /// started by this call.
    pub fn start_drain_if_idle(&self) -> Result<Option<JoinHandle<DrainSummary>>, StateError> {
        if !self.state.try_begin_drain()? {
            return Ok(None);
        }

        let worker = self.clone();
        Ok(Some(tokio::spawn(async move { worker.drain().await })))
    }

    /// Process jobs until the queue is empty
    ///
    /// Must only be called by the holder of the run flag.
    async fn drain(&self) -> DrainSummary {
        let mut guard = RunGuard::new(&self.state);
        let mut summary = DrainSummary::default();

        loop {
            let step = match self.state.next_step() {
                Ok(step) => step,
                Err(e) => {
                    error!(error = %e, "Shared queue state unusable, aborting drain");
                    guard.disarm();
                    return summary;
                }
            };

            match step {
                DrainStep::Finished => {
                    guard.disarm();
                    break;
                }
                DrainStep::Skip(job) => {
                    info!(job_id = %job.id, submitter = %job.submitter_id, url = %job.url, "Job cancelled before start");
                    self.metrics.job_cancelled();
                    summary.cancelled += 1;
                    self.notify_best_effort(job.submitter_id, &cancelled_text(&job.url))
                        .await;
                }
                DrainStep::Process(job) => match self.process(&job).await {
                    Ok(()) => {
                        info!(job_id = %job.id, submitter = %job.submitter_id, url = %job.url, "Job delivered");
                        self.metrics.job_delivered();
                        summary.delivered += 1;
                        self.notify_best_effort(job.submitter_id, &done_text(&job.url))
                            .await;
                    }
                    Err(e) => {
                        warn!(job_id = %job.id, submitter = %job.submitter_id, url = %job.url, error = %e, "Job failed");
                        self.metrics.job_failed();
                        summary.failed += 1;
                        self.notify_best_effort(job.submitter_id, &failure_text(&job.url, &e))
                            .await;
                    }
                },
            }
        }

        info!(
            delivered = summary.delivered,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "Queue drained"
        );
        summary
    }

    /// Fetch, deliver and release one job
    ///
    /// Panics from the agent surface as [`JobError::Internal`]. Once a fetch
    /// has produced an artifact, `release` runs whatever deliver did.
    async fn process(&self, job: &Job) -> Result<(), JobError> {
        let destination = job.submitter_id;
        let status = self
            .best_effort(
                destination,
                "post",
                self.sink.post(destination, &started_text(&job.url)),
            )
            .await;

        let (tx, rx) = watch::channel(None);
        let relay = ProgressRelay(tx);
        let editor = status.map(|message| self.spawn_progress_editor(job, message, rx));

        let fetched = AssertUnwindSafe(self.agent.fetch(&job.url, &relay))
            .catch_unwind()
            .await;

        if let Some(editor) = editor {
            editor.abort();
            let _ = editor.await;
        }

        let artifact = fetched.map_err(|panic| JobError::Internal(panic_message(panic)))??;

        if let Some(message) = status {
            self.best_effort(
                destination,
                "edit",
                self.sink
                    .edit(destination, message, &uploading_text(&job.url)),
            )
            .await;
        }

        let delivered = AssertUnwindSafe(self.agent.deliver(&artifact, destination))
            .catch_unwind()
            .await;

        let released = AssertUnwindSafe(self.agent.release(&artifact))
            .catch_unwind()
            .await;

        delivered.map_err(|panic| JobError::Internal(panic_message(panic)))??;
        released.map_err(|panic| JobError::Internal(panic_message(panic)))?;
        Ok(())
    }

    /// Edit the status message with the latest reported progress until aborted
    fn spawn_progress_editor(
        &self,
        job: &Job,
        message: MessageRef,
        mut updates: watch::Receiver<Option<Progress>>,
    ) -> JoinHandle<()> {
        let worker = self.clone();
        let destination = job.submitter_id;
        let url = job.url.clone();

        tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let latest = *updates.borrow_and_update();
                if let Some(progress) = latest {
                    let text = progress_text(&url, progress);
                    worker
                        .best_effort(
                            destination,
                            "edit",
                            worker.sink.edit(destination, message, &text),
                        )
                        .await;
                }
            }
        })
    }

    async fn notify_best_effort(&self, destination: SubmitterId, text: &str) {
        self.best_effort(destination, "notify", self.sink.notify(destination, text))
            .await;
    }

    /// The one place notification errors and panics are dropped
    async fn best_effort<T>(
        &self,
        destination: SubmitterId,
        action: &'static str,
        call: impl Future<Output = messaging::Result<T>>,
    ) -> Option<T> {
        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!(%destination, action, error = %e, "Notification failed");
                None
            }
            Err(panic) => {
                warn!(%destination, action, panic = %panic_message(panic), "Notification panicked");
                None
            }
        }
    }
}

/// Feeds download progress to the status message editor
///
/// Only the latest value is kept, so a slow chat API never holds up the
/// download.
struct ProgressRelay(watch::Sender<Option<Progress>>);

impl ProgressReporter for ProgressRelay {
    fn report(&self, progress: Progress) {
        self.0.send_replace(Some(progress));
    }
}

/// Releases the run flag if a drain ends without reaching `Finished`
struct RunGuard<'a> {
    state: &'a WorkerState,
    armed: bool,
}

impl<'a> RunGuard<'a> {
    fn new(state: &'a WorkerState) -> Self {
        Self { state, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.abandon_drain();
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "transfer panicked".to_string()
    }
}
