use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of whoever submitted a job (a chat on the messaging platform)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubmitterId(pub i64);

impl fmt::Display for SubmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<teloxide::types::ChatId> for SubmitterId {
    fn from(chat: teloxide::types::ChatId) -> Self {
        Self(chat.0)
    }
}

impl From<SubmitterId> for teloxide::types::ChatId {
    fn from(id: SubmitterId) -> Self {
        teloxide::types::ChatId(id.0)
    }
}

/// One user-submitted URL transfer request
///
/// Jobs are immutable once created. The `id` only exists to correlate
/// log lines for the same transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: Uuid,
    pub submitter_id: SubmitterId,
    pub url: String,
    pub enqueued_at: DateTime<Utc>,
}

impl Job {
    pub fn new(submitter_id: SubmitterId, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            submitter_id,
            url: url.into(),
            enqueued_at: Utc::now(),
        }
    }
}
