use super::http::{self, HttpDownloader};
use super::progress::ProgressReporter;
use super::remux::Remuxer;
use super::transfer::{DeliverError, FetchError, LocalArtifact, TransferAgent};
use crate::humanize::ByteSize;
use crate::messaging::TelegramTransport;
use crate::queue::SubmitterId;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::warn;

/// How an artifact is sent to the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upload {
    /// Streamable MP4, sent with `send_video`
    Video(PathBuf),
    Document(PathBuf),
}

/// Production transfer agent: HTTP download, optional remux, Telegram upload
pub struct UploadAgent {
    downloader: HttpDownloader,
    remuxer: Option<Remuxer>,
    transport: TelegramTransport,
    upload_limit: ByteSize,
}

impl UploadAgent {
    pub fn new(
        downloader: HttpDownloader,
        remuxer: Option<Remuxer>,
        transport: TelegramTransport,
        upload_limit: ByteSize,
    ) -> Self {
        Self {
            downloader,
            remuxer,
            transport,
            upload_limit,
        }
    }

    fn check_size(&self, artifact: &LocalArtifact) -> Result<(), DeliverError> {
        if artifact.size > self.upload_limit.as_u64() {
            return Err(DeliverError::TooLarge {
                size: ByteSize(artifact.size),
                limit: self.upload_limit,
            });
        }
        Ok(())
    }

    /// Pick the upload method, remuxing MP4s when a remuxer is configured
    ///
    /// The remuxed copy lives in the same job directory, so `release`
    /// removes it along with the original.
    pub async fn plan_upload(&self, artifact: &LocalArtifact) -> Upload {
        if !artifact.is_mp4() {
            return Upload::Document(artifact.path.clone());
        }

        let Some(remuxer) = &self.remuxer else {
            return Upload::Video(artifact.path.clone());
        };

        match remuxer.faststart(&artifact.path).await {
            Ok(fixed) => Upload::Video(fixed),
            Err(e) => {
                warn!(path = %artifact.path.display(), error = %e, "Remux failed, uploading original");
                Upload::Video(artifact.path.clone())
            }
        }
    }
}

pub fn caption_for(url: &str) -> String {
    format!("Uploaded:\n{}", url)
}

#[async_trait]
impl TransferAgent for UploadAgent {
    async fn fetch(
        &self,
        url: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<LocalArtifact, FetchError> {
        self.downloader.download(url, progress).await
    }

    async fn deliver(
        &self,
        artifact: &LocalArtifact,
        destination: SubmitterId,
    ) -> Result<(), DeliverError> {
        self.check_size(artifact)?;
        let caption = caption_for(&artifact.source_url);

        match self.plan_upload(artifact).await {
            Upload::Video(path) => self.transport.send_video(destination, &path, &caption).await,
            Upload::Document(path) => {
                self.transport
                    .send_document(destination, &path, &caption)
                    .await
            }
        }
    }

    async fn release(&self, artifact: &LocalArtifact) {
        http::remove_workdir(artifact).await;
    }
}
