//! ffmpeg faststart remux so MP4 uploads can stream

use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum RemuxError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("ffmpeg exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("ffmpeg produced no output at {0}")]
    MissingOutput(PathBuf),
}

/// Rewrites the MP4 container with the moov atom up front, no re-encode
#[derive(Debug, Clone)]
pub struct Remuxer {
    ffmpeg: PathBuf,
}

impl Remuxer {
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }

    /// `clip.mp4` -> `clip_fixed.mp4` next to the input
    pub fn output_path(input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        input.with_file_name(format!("{}_fixed.mp4", stem))
    }

    pub async fn faststart(&self, input: &Path) -> Result<PathBuf, RemuxError> {
        let output_path = Self::output_path(input);
        debug!(input = %input.display(), output = %output_path.display(), "Remuxing for streaming");

        let output = Command::new(&self.ffmpeg)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-c", "copy", "-movflags", "+faststart"])
            .arg(&output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| RemuxError::Spawn {
                program: self.ffmpeg.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            discard(&output_path).await;
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RemuxError::Failed {
                status: output.status.to_string(),
                stderr: last_line(&stderr).to_string(),
            });
        }

        if !tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
            return Err(RemuxError::MissingOutput(output_path));
        }

        Ok(output_path)
    }
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove partial remux output");
        }
    }
}

fn last_line(stderr: &str) -> &str {
    stderr.trim().lines().last().unwrap_or("")
}
