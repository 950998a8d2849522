//! Cooperative cancellation for running jobs.
//!
//! The executor does not stop running jobs on its own. Jobs that want to stop
//! early capture a [`CancelToken`] and poll it at their own suspension points;
//! the executor trips it when the batch fails and `cancel_on_failure` is set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Error returned by a job that stopped because its token was tripped.
#[derive(Debug)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Returns `Err(Cancelled)` once cancellation was requested, for use with `?`.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
