//! Outbound messages to submitters
//!
//! The worker only sees [`NotificationSink`]; [`TelegramTransport`] is the
//! production implementation.

pub mod telegram;

use crate::queue::SubmitterId;
use async_trait::async_trait;
use thiserror::Error;

pub use telegram::TelegramTransport;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Destination unreachable: {0}")]
    Unreachable(String),
}

pub type Result<T> = std::result::Result<T, NotifyError>;

/// Handle to a sent message that can be edited later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef(pub i32);

/// Text messages to a submitter
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, destination: SubmitterId, text: &str) -> Result<()>;

    /// Send a status message that [`NotificationSink::edit`] can update
    async fn post(&self, destination: SubmitterId, text: &str) -> Result<MessageRef>;

    async fn edit(&self, destination: SubmitterId, message: MessageRef, text: &str) -> Result<()>;
}

