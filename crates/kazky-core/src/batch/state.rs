//! Counters shared by the executor and its workers.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Snapshot of a batch's progress, sent after every settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// Jobs submitted.
    pub total: usize,
    /// Jobs taken off the pending queue so far.
    pub admitted: usize,
    /// Jobs in flight.
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchProgress {
    /// Jobs not yet admitted.
    pub fn pending(&self) -> usize {
        self.total.saturating_sub(self.admitted)
    }

    pub fn settled(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Fraction of jobs settled (0.0 to 1.0).
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.settled() as f64 / self.total as f64
    }
}

/// Per-run state: admission and settlement counters plus the terminal flag.
///
/// `running <= limit` holds because only `min(limit, total)` workers exist and
/// each runs one job at a time; `admit` asserts it in debug builds.
#[derive(Debug)]
pub(super) struct BatchState {
    total: usize,
    limit: usize,
    admitted: AtomicUsize,
    running: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    admission_closed: AtomicBool,
    terminated: AtomicBool,
}

impl BatchState {
    pub(super) fn new(total: usize, limit: usize) -> Self {
        Self {
            total,
            limit,
            admitted: AtomicUsize::new(0),
            running: AtomicUsize::new(0),
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            admission_closed: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
        }
    }

    /// Record an admission. Returns the running count including this job.
    pub(super) fn admit(&self) -> usize {
        self.admitted.fetch_add(1, Ordering::AcqRel);
        let running = self.running.fetch_add(1, Ordering::AcqRel) + 1;
        debug_assert!(running <= self.limit, "running {} > limit {}", running, self.limit);
        running
    }

    /// Record a settlement (success or failure).
    pub(super) fn settle(&self, ok: bool) {
        if ok {
            self.succeeded.fetch_add(1, Ordering::AcqRel);
        } else {
            self.failed.fetch_add(1, Ordering::AcqRel);
        }
        self.running.fetch_sub(1, Ordering::AcqRel);
    }

    /// Stop admitting pending jobs. Only used when failure cancels the batch.
    pub(super) fn close_admission(&self) {
        self.admission_closed.store(true, Ordering::Release);
    }

    pub(super) fn is_admitting(&self) -> bool {
        !self.admission_closed.load(Ordering::Acquire)
    }

    /// Mark the batch terminal. Returns true only for the first caller.
    pub(super) fn terminate(&self) -> bool {
        self.terminated
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether the executor has already reached its terminal outcome.
    pub(super) fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    pub(super) fn snapshot(&self) -> BatchProgress {
        BatchProgress {
            total: self.total,
            admitted: self.admitted.load(Ordering::Acquire),
            running: self.running.load(Ordering::Acquire),
            succeeded: self.succeeded.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
        }
    }
}
