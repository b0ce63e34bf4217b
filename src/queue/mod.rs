//! Job queue, cancellation flags and the shared worker state
//!
//! [`WorkerState`] is the single mutual-exclusion domain: intake handlers
//! enqueue, cancel and read status through it while the drain loop pops
//! jobs from it.

pub mod cancel;
pub mod job;
pub mod state;
pub mod store;

pub use cancel::CancellationRegistry;
pub use job::{Job, SubmitterId};
pub use state::{DrainStep, QueueStatus, RunState, StateError, StatusScope, WorkerState};
pub use store::JobQueue;
