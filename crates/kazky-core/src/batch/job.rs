//! Deferred units of work submitted to the executor.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Future produced by invoking a [`Job`].
pub type JobFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// A zero-argument deferred unit of async work.
///
/// Nothing runs until the executor admits the job and invokes it; the job is
/// consumed by that invocation and dropped once its future settles. Its
/// identity is the position in the submitted list.
pub struct Job {
    start: Box<dyn FnOnce() -> JobFuture + Send + 'static>,
}

impl Job {
    /// Wrap a closure that starts the work and returns its future.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            start: Box::new(move || Box::pin(f()) as JobFuture),
        }
    }

    /// Invoke the job, consuming it.
    pub(crate) fn start(self) -> JobFuture {
        (self.start)()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job").finish_non_exhaustive()
    }
}
