//! Bounded-concurrency batch executor.
//!
//! Runs an ordered list of independent async jobs with at most `limit` in
//! flight. A fixed pool of `min(limit, jobs)` workers pulls jobs from a shared
//! FIFO; the batch resolves once every job succeeded, or fails with the first
//! job error observed without waiting for the jobs still running.

mod cancel;
mod error;
mod executor;
mod job;
mod state;

pub use cancel::{CancelToken, Cancelled};
pub use error::BatchError;
pub use executor::{run_batch, BatchExecutor};
pub use job::{Job, JobFuture};
pub use state::BatchProgress;
