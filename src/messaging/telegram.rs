//! Telegram transport built on teloxide

use super::{MessageRef, NotificationSink, NotifyError};
use crate::queue::SubmitterId;
use crate::worker::DeliverError;
use async_trait::async_trait;
use std::path::Path;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId};
use teloxide::{ApiError, RequestError};
use tracing::{debug, info};

/// Sends text and files to Telegram chats
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Upload an MP4 as a streamable video
    pub async fn send_video(
        &self,
        destination: SubmitterId,
        path: &Path,
        caption: &str,
    ) -> Result<(), DeliverError> {
        debug!(%destination, path = %path.display(), "Uploading video");

        self.bot
            .send_video(ChatId::from(destination), InputFile::file(path))
            .caption(caption)
            .supports_streaming(true)
            .await
            .map_err(deliver_error)?;

        info!(%destination, path = %path.display(), "Video uploaded");
        Ok(())
    }

    /// Upload any file as a document
    pub async fn send_document(
        &self,
        destination: SubmitterId,
        path: &Path,
        caption: &str,
    ) -> Result<(), DeliverError> {
        debug!(%destination, path = %path.display(), "Uploading document");

        self.bot
            .send_document(ChatId::from(destination), InputFile::file(path))
            .caption(caption)
            .await
            .map_err(deliver_error)?;

        info!(%destination, path = %path.display(), "Document uploaded");
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for TelegramTransport {
    async fn notify(&self, destination: SubmitterId, text: &str) -> super::Result<()> {
        self.bot
            .send_message(ChatId::from(destination), text)
            .await
            .map_err(notify_error)?;
        Ok(())
    }

    async fn post(&self, destination: SubmitterId, text: &str) -> super::Result<MessageRef> {
        let message = self
            .bot
            .send_message(ChatId::from(destination), text)
            .await
            .map_err(notify_error)?;
        Ok(MessageRef(message.id.0))
    }

    async fn edit(
        &self,
        destination: SubmitterId,
        message: MessageRef,
        text: &str,
    ) -> super::Result<()> {
        match self
            .bot
            .edit_message_text(ChatId::from(destination), MessageId(message.0), text)
            .await
        {
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(notify_error(e)),
        }
    }
}

fn deliver_error(err: RequestError) -> DeliverError {
    match err {
        RequestError::Api(api) => DeliverError::Rejected(api.to_string()),
        other => DeliverError::Transport(other.to_string()),
    }
}

fn notify_error(err: RequestError) -> NotifyError {
    match err {
        RequestError::Api(
            api @ (ApiError::BotBlocked | ApiError::ChatNotFound | ApiError::UserDeactivated),
        ) => NotifyError::Unreachable(api.to_string()),
        other => NotifyError::SendFailed(other.to_string()),
    }
}
