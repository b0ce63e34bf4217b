//! Transfer progress callbacks

use std::time::{Duration, Instant};

const MIB: f64 = 1024.0 * 1024.0;

/// Receives byte counts while a transfer runs
///
/// Called from inside the transfer loop, so implementations must return
/// quickly and never fail.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, progress: Progress);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: u64,
    /// `None` when the server sent no `Content-Length`
    pub total: Option<u64>,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.total == Some(self.done)
    }
}

/// Reporter that drops every update
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _progress: Progress) {}
}

/// Forwards at most one update per `interval`
///
/// The first update and the one that completes the transfer always pass.
pub struct Throttle<'a> {
    inner: &'a dyn ProgressReporter,
    interval: Duration,
    last: Option<Instant>,
}

impl<'a> Throttle<'a> {
    pub fn new(inner: &'a dyn ProgressReporter, interval: Duration) -> Self {
        Self {
            inner,
            interval,
            last: None,
        }
    }

    pub fn update(&mut self, progress: Progress) {
        let now = Instant::now();
        let due = self
            .last
            .is_none_or(|last| now.duration_since(last) >= self.interval);

        if due || progress.is_complete() {
            self.inner.report(progress);
            self.last = Some(now);
        }
    }
}

/// Status line shown while downloading, e.g. `1.50 / 3.00 MB (50.0%)`
pub fn progress_line(progress: Progress) -> String {
    let done = progress.done as f64 / MIB;
    match progress.total {
        Some(total) if total > 0 => format!(
            "{:.2} / {:.2} MB ({:.1}%)",
            done,
            total as f64 / MIB,
            progress.done as f64 / total as f64 * 100.0
        ),
        _ => format!("{:.2} MB", done),
    }
}
