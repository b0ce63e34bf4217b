#![allow(dead_code)]

use async_trait::async_trait;
use relaybox::messaging::{MessageRef, NotificationSink, NotifyError};
use relaybox::observability::Metrics;
use relaybox::queue::{Job, SubmitterId, WorkerState};
use relaybox::worker::{
    DeliverError, FetchError, LocalArtifact, Progress, ProgressReporter, QueueWorker, TransferAgent,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// URL markers that steer [`MockAgent`]
pub const FETCH_FAIL: &str = "fetch-fail";
pub const DELIVER_FAIL: &str = "deliver-fail";
pub const DELIVER_PANIC: &str = "deliver-panic";
pub const RELEASE_PANIC: &str = "release-panic";
pub const SLOW: &str = "slow";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch(String),
    Deliver(String, SubmitterId),
    Release(PathBuf),
}

/// Transfer agent that records calls and fails on marked URLs
///
/// Fetches of URLs containing [`SLOW`] wait for a permit on `gate`.
pub struct MockAgent {
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    pub gate: Arc<Semaphore>,
}

impl MockAgent {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            gate: Arc::new(Semaphore::new(0)),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Fetch(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn delivered(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Deliver(url, _) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn releases(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Release(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

pub fn artifact_path(url: &str) -> PathBuf {
    PathBuf::from("/tmp/relaybox-mock").join(url.replace(['/', ':'], "_"))
}

#[async_trait]
impl TransferAgent for MockAgent {
    async fn fetch(
        &self,
        url: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<LocalArtifact, FetchError> {
        self.record(Call::Fetch(url.to_string()));
        self.enter();

        if url.contains(SLOW) {
            self.gate.acquire().await.unwrap().forget();
        }

        // Give the status editor a chance to run between reports
        for done in [512, 1024] {
            progress.report(Progress {
                done,
                total: Some(1024),
            });
            tokio::task::yield_now().await;
        }

        self.leave();

        if url.contains(FETCH_FAIL) {
            return Err(FetchError::HttpStatus(404));
        }

        let path = artifact_path(url);
        Ok(LocalArtifact {
            workdir: path.clone(),
            path,
            size: 1024,
            content_type: None,
            source_url: url.to_string(),
        })
    }

    async fn deliver(
        &self,
        artifact: &LocalArtifact,
        destination: SubmitterId,
    ) -> Result<(), DeliverError> {
        self.record(Call::Deliver(artifact.source_url.clone(), destination));
        self.enter();
        tokio::task::yield_now().await;
        self.leave();

        if artifact.source_url.contains(DELIVER_PANIC) {
            panic!("uploader blew up");
        }
        if artifact.source_url.contains(DELIVER_FAIL) {
            return Err(DeliverError::Rejected("Request Entity Too Large".to_string()));
        }
        Ok(())
    }

    async fn release(&self, artifact: &LocalArtifact) {
        self.record(Call::Release(artifact.path.clone()));
        if artifact.source_url.contains(RELEASE_PANIC) {
            panic!("cleanup blew up");
        }
    }
}

/// Sink that records every message, optionally failing or panicking on all of them
#[derive(Default)]
pub struct MockSink {
    messages: Mutex<Vec<(SubmitterId, String)>>,
    edits: Mutex<Vec<(SubmitterId, MessageRef, String)>>,
    next_id: AtomicI32,
    pub unreachable: bool,
    pub panicking: bool,
}

impl MockSink {
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Default::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            panicking: true,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> Vec<(SubmitterId, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn messages_for(&self, submitter: SubmitterId) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(to, _)| *to == submitter)
            .map(|(_, text)| text)
            .collect()
    }

    pub fn edits(&self) -> Vec<(SubmitterId, MessageRef, String)> {
        self.edits.lock().unwrap().clone()
    }

    fn outcome(&self) -> Result<(), NotifyError> {
        if self.panicking {
            panic!("sink blew up");
        }
        if self.unreachable {
            return Err(NotifyError::Unreachable("bot was blocked by the user".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for MockSink {
    async fn notify(&self, destination: SubmitterId, text: &str) -> Result<(), NotifyError> {
        self.messages
            .lock()
            .unwrap()
            .push((destination, text.to_string()));
        self.outcome()
    }

    async fn post(&self, destination: SubmitterId, text: &str) -> Result<MessageRef, NotifyError> {
        self.messages
            .lock()
            .unwrap()
            .push((destination, text.to_string()));
        self.outcome()?;
        Ok(MessageRef(self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn edit(
        &self,
        destination: SubmitterId,
        message: MessageRef,
        text: &str,
    ) -> Result<(), NotifyError> {
        self.edits
            .lock()
            .unwrap()
            .push((destination, message, text.to_string()));
        self.outcome()
    }
}

pub struct Harness {
    pub worker: QueueWorker,
    pub state: Arc<WorkerState>,
    pub agent: Arc<MockAgent>,
    pub sink: Arc<MockSink>,
    pub metrics: Arc<Metrics>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_sink(MockSink::default())
    }

    pub fn with_sink(sink: MockSink) -> Self {
        let state = Arc::new(WorkerState::new());
        let agent = Arc::new(MockAgent::new());
        let sink = Arc::new(sink);
        let metrics = Arc::new(Metrics::new());
        let worker = QueueWorker::new(state.clone(), agent.clone(), sink.clone(), metrics.clone());

        Self {
            worker,
            state,
            agent,
            sink,
            metrics,
        }
    }

    pub fn enqueue(&self, submitter: i64, url: &str) {
        self.worker
            .enqueue(Job::new(SubmitterId(submitter), url))
            .unwrap();
    }
}
