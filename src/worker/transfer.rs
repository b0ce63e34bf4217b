//! Contracts between the queue worker and whatever moves the bytes

use super::progress::ProgressReporter;
use crate::humanize::ByteSize;
use crate::queue::SubmitterId;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Network(String),

    #[error("server responded with HTTP {0}")]
    HttpStatus(u16),

    #[error("file too large: {size} exceeds limit of {limit}")]
    TooLarge { size: ByteSize, limit: ByteSize },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("disk write failed: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Short reason safe to show to the submitter
    pub fn reason(&self) -> String {
        match self {
            FetchError::Network(_) => "network error".to_string(),
            FetchError::HttpStatus(code) => format!("server responded with HTTP {}", code),
            FetchError::TooLarge { limit, .. } => format!("file is larger than {}", limit),
            FetchError::InvalidUrl(_) => "invalid URL".to_string(),
            FetchError::Io(_) => "could not write the file to disk".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DeliverError {
    #[error("rejected by chat platform: {0}")]
    Rejected(String),

    #[error("file too large to upload: {size} exceeds limit of {limit}")]
    TooLarge { size: ByteSize, limit: ByteSize },

    #[error("transport error: {0}")]
    Transport(String),
}

impl DeliverError {
    pub fn reason(&self) -> String {
        match self {
            DeliverError::Rejected(_) => "upload rejected by the chat platform".to_string(),
            DeliverError::TooLarge { limit, .. } => {
                format!("file exceeds the upload limit of {}", limit)
            }
            DeliverError::Transport(_) => "temporary transport error".to_string(),
        }
    }
}

/// A downloaded file waiting to be delivered
///
/// Everything belonging to one job lives under `workdir`, so releasing the
/// artifact is a single directory removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalArtifact {
    pub path: PathBuf,
    pub workdir: PathBuf,
    pub size: u64,
    pub content_type: Option<String>,
    pub source_url: String,
}

impl LocalArtifact {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// MP4 by extension or by the `Content-Type` the server sent
    pub fn is_mp4(&self) -> bool {
        let by_extension = self
            .path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"));

        let by_mime = self
            .content_type
            .as_deref()
            .and_then(|ct| ct.parse::<mime::Mime>().ok())
            .is_some_and(|m| m.type_() == mime::VIDEO && m.subtype() == "mp4");

        by_extension || by_mime
    }
}

/// Fetches a URL to local disk and delivers the result to a submitter
///
/// Neither call is bounded by the worker; any timeout policy belongs to the
/// implementation and must surface as an error.
#[async_trait]
pub trait TransferAgent: Send + Sync {
    /// Download `url`, reporting byte counts to `progress` along the way
    async fn fetch(
        &self,
        url: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<LocalArtifact, FetchError>;

    async fn deliver(
        &self,
        artifact: &LocalArtifact,
        destination: SubmitterId,
    ) -> Result<(), DeliverError>;

    /// Remove local files for `artifact`; safe to call more than once
    async fn release(&self, artifact: &LocalArtifact);
}
