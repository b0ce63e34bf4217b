//! HTTP downloader writing straight to disk

use super::progress::{Progress, ProgressReporter, Throttle};
use super::transfer::{FetchError, LocalArtifact};
use crate::humanize::ByteSize;
use percent_encoding::percent_decode_str;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Url};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};
use uuid::Uuid;

const FALLBACK_FILE_NAME: &str = "file.bin";
const PART_SUFFIX: &str = ".part";
const WRITE_BUFFER: usize = 1024 * 1024;
/// Leaves room for the `.part` suffix under the common 255-byte limit
const MAX_FILE_NAME_BYTES: usize = 200;
/// Longest suffix after the last dot still treated as an extension
const MAX_EXTENSION_BYTES: usize = 16;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub download_dir: PathBuf,
    pub connect_timeout: Duration,
    /// Per-read timeout; `None` lets slow transfers run indefinitely
    pub read_timeout: Option<Duration>,
    pub max_file_size: ByteSize,
    pub user_agent: String,
    /// Minimum time between progress reports
    pub progress_interval: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("downloads"),
            connect_timeout: Duration::from_secs(10),
            read_timeout: None,
            max_file_size: ByteSize(2 * 1024 * 1024 * 1024),
            user_agent: format!("RelayBox/{}", env!("CARGO_PKG_VERSION")),
            progress_interval: Duration::from_secs(1),
        }
    }
}

/// Downloads a URL into its own job directory
///
/// The body is streamed into `<name>.part` and renamed once complete, so
/// the final path only ever holds a whole file.
pub struct HttpDownloader {
    client: Client,
    config: HttpConfig,
}

impl HttpDownloader {
    pub fn new(config: HttpConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(read_timeout) = config.read_timeout {
            builder = builder.read_timeout(read_timeout);
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Download `url` and return the finished artifact
    ///
    /// `progress` sees at most one update per configured interval, plus the
    /// final one.
    pub async fn download(
        &self,
        url: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<LocalArtifact, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let workdir = self.config.download_dir.join(Uuid::new_v4().to_string());
        fs::create_dir_all(&workdir).await?;

        let mut throttle = Throttle::new(progress, self.config.progress_interval);
        let result = self.download_into(&parsed, &workdir, &mut throttle).await;

        if result.is_err() {
            // Nothing useful is left behind on failure
            if let Err(e) = fs::remove_dir_all(&workdir).await {
                warn!(workdir = %workdir.display(), error = %e, "Failed to clean up job directory");
            }
        }

        result
    }

    async fn download_into(
        &self,
        url: &Url,
        workdir: &Path,
        throttle: &mut Throttle<'_>,
    ) -> Result<LocalArtifact, FetchError> {
        debug!(%url, "Starting download");

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let limit = self.config.max_file_size;
        let declared = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        if let Some(size) = declared {
            if size > limit.as_u64() {
                return Err(FetchError::TooLarge {
                    size: ByteSize(size),
                    limit,
                });
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let file_name = file_name_from_url(url);
        let final_path = workdir.join(&file_name);
        let part_path = workdir.join(format!("{}{}", file_name, PART_SUFFIX));

        let file = fs::File::create(&part_path).await?;
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER, file);
        let mut written: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Network(format!("Failed to read body: {}", e)))?
        {
            written += chunk.len() as u64;
            if written > limit.as_u64() {
                return Err(FetchError::TooLarge {
                    size: ByteSize(written),
                    limit,
                });
            }
            writer.write_all(&chunk).await?;
            throttle.update(Progress {
                done: written,
                total: declared,
            });
        }

        writer.flush().await?;
        drop(writer);

        fs::rename(&part_path, &final_path).await?;
        throttle.update(Progress {
            done: written,
            total: Some(written),
        });

        info!(%url, path = %final_path.display(), size = %ByteSize(written), "Download completed");

        Ok(LocalArtifact {
            path: final_path,
            workdir: workdir.to_path_buf(),
            size: written,
            content_type,
            source_url: url.to_string(),
        })
    }
}

/// Remove everything under the artifact's job directory
///
/// A directory that is already gone counts as released.
pub async fn remove_workdir(artifact: &LocalArtifact) {
    match fs::remove_dir_all(&artifact.workdir).await {
        Ok(()) => debug!(workdir = %artifact.workdir.display(), "Artifact released"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(workdir = %artifact.workdir.display(), error = %e, "Failed to release artifact")
        }
    }
}

/// Last path segment of the URL, decoded and reduced to characters safe on
/// any filesystem
pub fn file_name_from_url(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    let decoded = percent_decode_str(segment).decode_utf8_lossy();

    let sanitized: String = decoded
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ' | '(' | ')') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = sanitized.trim().trim_matches('.');
    if trimmed.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        truncate_file_name(trimmed)
    }
}

/// Shorten the stem so the whole name fits [`MAX_FILE_NAME_BYTES`], keeping
/// the extension
fn truncate_file_name(name: &str) -> String {
    if name.len() <= MAX_FILE_NAME_BYTES {
        return name.to_string();
    }

    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() <= MAX_EXTENSION_BYTES => {
            (stem, Some(ext))
        }
        _ => (name, None),
    };

    let budget = MAX_FILE_NAME_BYTES - extension.map_or(0, |ext| ext.len() + 1);
    let mut end = budget.min(stem.len());
    while !stem.is_char_boundary(end) {
        end -= 1;
    }

    match extension {
        Some(ext) => format!("{}.{}", &stem[..end], ext),
        None => stem[..end].to_string(),
    }
}
