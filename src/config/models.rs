use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub remux: RemuxConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

/// Chat transport configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    /// Bot token (loaded from environment, never from the config file)
    #[serde(skip)]
    pub bot_token: Option<String>,
    /// Alternative Bot API server, e.g. a local one with higher upload limits
    pub api_url: Option<String>,
    /// Largest file the bot will try to upload
    #[serde(default = "default_upload_limit")]
    pub upload_limit: ByteSize,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_url: None,
            upload_limit: default_upload_limit(),
        }
    }
}

fn default_upload_limit() -> ByteSize {
    ByteSize::mib(50)
}

/// HTTP download configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    #[serde(default = "default_download_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// No read timeout unless set; slow transfers may take as long as they need
    pub read_timeout_secs: Option<u64>,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: ByteSize,
    /// Minimum gap between progress edits of the status message
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

impl DownloadConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_secs.map(Duration::from_secs)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: default_download_dir(),
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: None,
            max_file_size: default_max_file_size(),
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_user_agent() -> String {
    format!("RelayBox/{}", env!("CARGO_PKG_VERSION"))
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_file_size() -> ByteSize {
    ByteSize::gib(2)
}

fn default_progress_interval_ms() -> u64 {
    1000
}

/// ffmpeg faststart remux configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemuxConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
}

impl Default for RemuxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ffmpeg_path: default_ffmpeg_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

/// Keep-alive health endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 10000))
}
