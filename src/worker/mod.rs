//! Transfer worker
//!
//! [`QueueWorker`] drains the shared queue sequentially and calls a
//! [`TransferAgent`] for each job. [`UploadAgent`] is the production agent:
//! HTTP download to disk, optional ffmpeg faststart remux, Telegram upload.
//! Download progress flows back through a [`ProgressReporter`] and is shown
//! by editing one status message per job.

pub mod agent;
pub mod http;
pub mod progress;
pub mod remux;
pub mod runner;
pub mod transfer;

pub use agent::{Upload, UploadAgent};
pub use http::{HttpConfig, HttpDownloader};
pub use progress::{NoProgress, Progress, ProgressReporter};
pub use remux::{RemuxError, Remuxer};
pub use runner::{DrainSummary, JobError, QueueWorker};
pub use transfer::{DeliverError, FetchError, LocalArtifact, TransferAgent};
