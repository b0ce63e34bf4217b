//! Configuration management for RelayBox
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `RELAYBOX__<section>__<key>`
//!
//! Examples:
//! - `RELAYBOX__DOWNLOAD__DIR=/var/lib/relaybox`
//! - `RELAYBOX__TELEGRAM__UPLOAD_LIMIT=2GB`
//! - `RELAYBOX__HEALTH__ENABLED=false`
//!
//! The bot token is read only from `BOT_TOKEN` (or `TELOXIDE_TOKEN`).
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/relaybox.toml`.
//! This can be overridden using the `RELAYBOX_CONFIG` environment variable
//! or the `--config` flag.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{Config, DownloadConfig, HealthConfig, RemuxConfig, TelegramConfig};
pub use validation::ValidationError;

use crate::worker::HttpConfig;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment), secrets included
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed, a value is out of range,
    /// or no bot token is available.
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load(path)?;
        validation::validate(&config)?;
        validation::validate_secrets(&config)?;
        Ok(config)
    }

    /// Load configuration from all sources without requiring the bot token
    ///
    /// Used to inspect settings on a machine that has no secrets.
    pub fn load_without_secrets(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path without requiring secrets
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            download_dir: self.download.dir.clone(),
            connect_timeout: self.download.connect_timeout(),
            read_timeout: self.download.read_timeout(),
            max_file_size: self.download.max_file_size,
            user_agent: self.download.user_agent.clone(),
            progress_interval: self.download.progress_interval(),
        }
    }
}
