use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Bot token missing: set BOT_TOKEN (or TELOXIDE_TOKEN) in the environment")]
    MissingBotToken,

    #[error("Invalid Bot API url '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("download.dir must not be empty")]
    EmptyDownloadDir,

    #[error("download.connect_timeout_secs must be positive")]
    ZeroConnectTimeout,

    #[error("download.read_timeout_secs must be positive when set")]
    ZeroReadTimeout,

    #[error("Size limit must be positive: {field}")]
    ZeroSizeLimit { field: &'static str },

    #[error("remux.ffmpeg_path must not be empty when remux is enabled")]
    EmptyFfmpegPath,
}

/// Validate everything that can come from a config file
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_telegram(config)?;
    validate_download(config)?;
    validate_remux(config)?;
    Ok(())
}

/// Validate values that only come from the environment
pub fn validate_secrets(config: &Config) -> Result<(), ValidationError> {
    match config.telegram.bot_token.as_deref() {
        Some(token) if !token.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::MissingBotToken),
    }
}

fn validate_telegram(config: &Config) -> Result<(), ValidationError> {
    if let Some(url) = &config.telegram.api_url {
        reqwest::Url::parse(url).map_err(|e| ValidationError::InvalidApiUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;
    }

    if config.telegram.upload_limit.as_u64() == 0 {
        return Err(ValidationError::ZeroSizeLimit {
            field: "telegram.upload_limit",
        });
    }

    Ok(())
}

fn validate_download(config: &Config) -> Result<(), ValidationError> {
    let download = &config.download;

    if download.dir.as_os_str().is_empty() {
        return Err(ValidationError::EmptyDownloadDir);
    }

    if download.connect_timeout_secs == 0 {
        return Err(ValidationError::ZeroConnectTimeout);
    }

    if download.read_timeout_secs == Some(0) {
        return Err(ValidationError::ZeroReadTimeout);
    }

    if download.max_file_size.as_u64() == 0 {
        return Err(ValidationError::ZeroSizeLimit {
            field: "download.max_file_size",
        });
    }

    Ok(())
}

fn validate_remux(config: &Config) -> Result<(), ValidationError> {
    if config.remux.enabled && config.remux.ffmpeg_path.as_os_str().is_empty() {
        return Err(ValidationError::EmptyFfmpegPath);
    }
    Ok(())
}
