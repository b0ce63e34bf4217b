use super::job::SubmitterId;
use std::collections::HashSet;

/// Per-submitter, single-shot cancel flags
///
/// A submitter is present in the set while its flag is raised. Consuming
/// the flag removes it, so one request skips at most one job.
#[derive(Debug, Default)]
pub struct CancellationRegistry {
    requested: HashSet<SubmitterId>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag for `submitter`; repeated calls before consumption are no-ops
    pub fn request_cancel(&mut self, submitter: SubmitterId) {
        self.requested.insert(submitter);
    }

    /// Test-and-clear: returns whether the flag was raised
    pub fn consume_if_set(&mut self, submitter: SubmitterId) -> bool {
        self.requested.remove(&submitter)
    }

    pub fn clear(&mut self, submitter: SubmitterId) {
        self.requested.remove(&submitter);
    }

    pub fn clear_all(&mut self) {
        self.requested.clear();
    }

    pub fn len(&self) -> usize {
        self.requested.len()
    }
}
