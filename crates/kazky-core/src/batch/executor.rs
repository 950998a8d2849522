//! Worker-pool executor: admission, settlement and the terminal outcome.
//!
//! `min(limit, jobs)` workers loop "pull next job, run it, report the outcome"
//! until the pending queue is empty. Each worker is handed its first job before
//! any is spawned, so the initial window is admitted even if a job fails
//! without yielding. Each job runs in its own task so a panic settles as a
//! failure. After fail-fast the workers keep draining the queue and their
//! outcomes go unobserved, unless `cancel_on_failure` stops admission.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;

use super::cancel::CancelToken;
use super::error::BatchError;
use super::job::Job;
use super::state::{BatchProgress, BatchState};

type PendingQueue = Arc<Mutex<VecDeque<(usize, Job)>>>;

/// Runs `jobs` with at most `limit` in flight. Shorthand for
/// `BatchExecutor::new(limit).run(jobs)`.
pub async fn run_batch(jobs: Vec<Job>, limit: usize) -> Result<(), BatchError> {
    BatchExecutor::new(limit).run(jobs).await
}

/// Bounded-concurrency executor for a batch of independent jobs.
///
/// Defaults match the plain contract: no per-job deadline, running jobs are
/// not cancelled when another job fails, no progress reporting.
#[derive(Debug)]
pub struct BatchExecutor {
    limit: usize,
    job_timeout: Option<Duration>,
    cancel_on_failure: bool,
    cancel: CancelToken,
    progress_tx: Option<mpsc::Sender<BatchProgress>>,
}

impl BatchExecutor {
    /// Create an executor running at most `limit` jobs at once.
    /// A limit of 0 is clamped to 1.
    pub fn new(limit: usize) -> Self {
        if limit == 0 {
            tracing::warn!("batch concurrency limit 0 clamped to 1");
        }
        Self {
            limit: limit.max(1),
            job_timeout: None,
            cancel_on_failure: false,
            cancel: CancelToken::new(),
            progress_tx: None,
        }
    }

    /// Effective concurrency limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Abort any job running longer than `after`; the batch then fails with
    /// [`BatchError::JobTimedOut`].
    pub fn with_job_timeout(mut self, after: Duration) -> Self {
        self.job_timeout = Some(after);
        self
    }

    /// On failure, stop admitting pending jobs and trip [`Self::cancel_token`]
    /// so running jobs that poll it can stop early.
    pub fn with_cancel_on_failure(mut self, cancel: bool) -> Self {
        self.cancel_on_failure = cancel;
        self
    }

    /// Send a [`BatchProgress`] snapshot after every settlement. Sends never
    /// block; snapshots are dropped when the channel is full.
    pub fn with_progress(mut self, tx: mpsc::Sender<BatchProgress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Token jobs can capture to observe cancellation. Stays tripped once set.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run the batch to its terminal outcome.
    ///
    /// Resolves `Ok(())` once every job has settled successfully. Fails with
    /// the first job failure as soon as it is observed. Pending jobs are still
    /// admitted afterwards unless `cancel_on_failure` is set.
    pub async fn run(&self, jobs: Vec<Job>) -> Result<(), BatchError> {
        if jobs.is_empty() {
            return Err(BatchError::EmptyBatch);
        }

        let total = jobs.len();
        let workers = self.limit.min(total);
        let mut pending: VecDeque<(usize, Job)> = jobs.into_iter().enumerate().collect();
        let window: Vec<(usize, Job)> = pending.drain(..workers).collect();
        let queue: PendingQueue = Arc::new(Mutex::new(pending));
        let state = Arc::new(BatchState::new(total, self.limit));
        let (settled_tx, mut settled_rx) = mpsc::unbounded_channel::<Settlement>();

        tracing::debug!(total, limit = self.limit, workers, "batch started");
        for (id, first) in window.into_iter().enumerate() {
            let worker = Worker {
                id,
                queue: Arc::clone(&queue),
                state: Arc::clone(&state),
                settled_tx: settled_tx.clone(),
                job_timeout: self.job_timeout,
                stop_on_failure: self.cancel_on_failure,
            };
            tokio::spawn(worker.run(first));
        }
        drop(settled_tx);

        let mut succeeded = 0usize;
        while let Some(settlement) = settled_rx.recv().await {
            self.report_progress(state.snapshot());
            match settlement.outcome {
                Ok(()) => {
                    succeeded += 1;
                    if succeeded == total && state.terminate() {
                        tracing::info!("batch completed: {} job(s)", total);
                        return Ok(());
                    }
                }
                Err(err) => {
                    if state.terminate() {
                        return Err(self.fail(&queue, &state, err));
                    }
                }
            }
        }

        let settled = state.snapshot().settled();
        tracing::warn!(settled, total, "batch workers exited early");
        Err(BatchError::WorkersLost { settled, total })
    }

    /// Failure path. With `cancel_on_failure`, stop admission, drop pending
    /// jobs and trip the token; otherwise the workers keep draining the queue.
    fn fail(&self, queue: &PendingQueue, state: &BatchState, err: BatchError) -> BatchError {
        let running = state.snapshot().running;
        if self.cancel_on_failure {
            state.close_admission();
            let dropped = {
                let mut pending = queue.lock().unwrap_or_else(PoisonError::into_inner);
                let n = pending.len();
                pending.clear();
                n
            };
            self.cancel.cancel();
            tracing::warn!(error = %err, running, dropped, "batch failed; pending jobs dropped");
        } else {
            let pending = queue.lock().unwrap_or_else(PoisonError::into_inner).len();
            tracing::warn!(
                error = %err,
                running,
                pending,
                "batch failed; remaining jobs run unobserved"
            );
        }
        err
    }

    fn report_progress(&self, progress: BatchProgress) {
        if let Some(tx) = &self.progress_tx {
            let _ = tx.try_send(progress);
        }
    }
}

/// Outcome of one job, reported by the worker that ran it.
struct Settlement {
    index: usize,
    outcome: Result<(), BatchError>,
}

struct Worker {
    id: usize,
    queue: PendingQueue,
    state: Arc<BatchState>,
    settled_tx: mpsc::UnboundedSender<Settlement>,
    job_timeout: Option<Duration>,
    stop_on_failure: bool,
}

impl Worker {
    async fn run(self, first: (usize, Job)) {
        let mut next = Some(first);
        while let Some((index, job)) = next {
            let running = self.state.admit();
            tracing::debug!(worker = self.id, job = index, running, "job admitted");

            let outcome = run_job(index, job, self.job_timeout).await;
            let ok = outcome.is_ok();
            if !ok && self.stop_on_failure {
                // Closed before reporting so this worker cannot race past it.
                self.state.close_admission();
            }
            self.state.settle(ok);
            tracing::debug!(worker = self.id, job = index, ok, "job settled");

            let settlement = Settlement { index, outcome };
            if let Err(mpsc::error::SendError(late)) = self.settled_tx.send(settlement) {
                if !self.state.is_terminated() {
                    tracing::debug!(worker = self.id, "batch dropped by caller; worker stopping");
                    break;
                }
                tracing::debug!(job = late.index, ok, "settlement after batch terminated");
            }
            next = self.next_job();
        }
    }

    /// Next pending job, or `None` once admission is closed, the queue is
    /// empty, or the caller dropped the batch before it terminated.
    fn next_job(&self) -> Option<(usize, Job)> {
        if !self.state.is_admitting() {
            return None;
        }
        if self.settled_tx.is_closed() && !self.state.is_terminated() {
            return None;
        }
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

/// Invoke `job` in its own task and wait for it to settle.
async fn run_job(index: usize, job: Job, job_timeout: Option<Duration>) -> Result<(), BatchError> {
    let mut handle = tokio::spawn(async move { job.start().await });

    let joined = match job_timeout {
        None => (&mut handle).await,
        Some(after) => match tokio::time::timeout(after, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                return Err(BatchError::JobTimedOut { index, after });
            }
        },
    };

    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(BatchError::JobFailed { index, source }),
        Err(e) if e.is_panic() => Err(BatchError::JobPanicked { index }),
        Err(e) => Err(BatchError::JobFailed {
            index,
            source: anyhow::anyhow!("job task join: {}", e),
        }),
    }
}
