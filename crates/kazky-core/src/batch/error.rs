//! Terminal batch errors.

use std::time::Duration;
use thiserror::Error;

/// Why a batch failed. Only the first failure observed is reported.
#[derive(Debug, Error)]
pub enum BatchError {
    /// No jobs were submitted; nothing was run.
    #[error("no jobs to execute")]
    EmptyBatch,
    /// A job settled with an error. `source` is the job's own error.
    #[error("job {index} failed")]
    JobFailed {
        index: usize,
        #[source]
        source: anyhow::Error,
    },
    /// A job exceeded the per-job deadline and was aborted.
    #[error("job {index} timed out after {after:?}")]
    JobTimedOut { index: usize, after: Duration },
    /// A job panicked while running.
    #[error("job {index} panicked")]
    JobPanicked { index: usize },
    /// All workers exited before every job settled (e.g. runtime shutdown).
    #[error("batch workers exited after {settled} of {total} job(s) settled")]
    WorkersLost { settled: usize, total: usize },
}

impl BatchError {
    /// Position of the failing job in the submitted list, if a job failed.
    pub fn index(&self) -> Option<usize> {
        match self {
            BatchError::JobFailed { index, .. }
            | BatchError::JobTimedOut { index, .. }
            | BatchError::JobPanicked { index } => Some(*index),
            BatchError::EmptyBatch | BatchError::WorkersLost { .. } => None,
        }
    }

    /// The failing job's own error, unwrapped.
    pub fn into_cause(self) -> Option<anyhow::Error> {
        match self {
            BatchError::JobFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
