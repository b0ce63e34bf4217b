use super::job::{Job, SubmitterId};
use std::collections::VecDeque;
use tracing::debug;

/// In-memory FIFO of pending jobs
///
/// Jobs are appended at the tail and consumed from the head. A job leaves
/// the queue exactly once, either through [`JobQueue::dequeue`] or through
/// [`JobQueue::remove_all_for`]. Duplicate URLs are allowed.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: VecDeque<Job>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job to the tail
    pub fn enqueue(&mut self, job: Job) {
        debug!(job_id = %job.id, submitter = %job.submitter_id, "Job enqueued");
        self.jobs.push_back(job);
    }

    /// Remove and return the head job, if any
    pub fn dequeue(&mut self) -> Option<Job> {
        self.jobs.pop_front()
    }

    /// Drop every job owned by `submitter`, keeping the others in order
    ///
    /// Returns the number of jobs removed.
    pub fn remove_all_for(&mut self, submitter: SubmitterId) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|job| job.submitter_id != submitter);
        let removed = before - self.jobs.len();

        if removed > 0 {
            debug!(%submitter, removed, "Jobs removed from queue");
        }

        removed
    }

    pub fn size(&self) -> usize {
        self.jobs.len()
    }

    pub fn size_for(&self, submitter: SubmitterId) -> usize {
        self.jobs
            .iter()
            .filter(|job| job.submitter_id == submitter)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(submitter: i64, url: &str) -> Job {
        Job::new(SubmitterId(submitter), url)
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = JobQueue::new();
        queue.enqueue(job(1, "https://a.com/1"));
        queue.enqueue(job(2, "https://a.com/2"));
        queue.enqueue(job(1, "https://a.com/3"));

        let urls: Vec<String> = std::iter::from_fn(|| queue.dequeue())
            .map(|j| j.url)
            .collect();

        assert_eq!(urls, vec!["https://a.com/1", "https://a.com/2", "https://a.com/3"]);
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut queue = JobQueue::new();
        queue.enqueue(job(1, "https://a.com/same"));
        queue.enqueue(job(1, "https://a.com/same"));

        assert_eq!(queue.size(), 2);
        assert_eq!(queue.size_for(SubmitterId(1)), 2);
    }

    #[test]
    fn test_remove_all_for_preserves_others() {
        let mut queue = JobQueue::new();
        queue.enqueue(job(1, "A"));
        queue.enqueue(job(2, "B"));
        queue.enqueue(job(1, "C"));
        queue.enqueue(job(3, "D"));

        let removed = queue.remove_all_for(SubmitterId(1));

        assert_eq!(removed, 2);
        assert_eq!(queue.size_for(SubmitterId(1)), 0);
        let remaining: Vec<String> = std::iter::from_fn(|| queue.dequeue())
            .map(|j| j.url)
            .collect();
        assert_eq!(remaining, vec!["B", "D"]);
    }

    #[test]
    fn test_remove_all_for_unknown_submitter() {
        let mut queue = JobQueue::new();
        queue.enqueue(job(2, "B"));

        assert_eq!(queue.remove_all_for(SubmitterId(9)), 0);
        assert_eq!(queue.size(), 1);
    }
}
