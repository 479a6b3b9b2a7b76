//! Worker-pool sizing configuration.

/// Default number of fan-out workers.
pub const DEFAULT_WORKERS: usize = 10;

/// Default number of queued jobs allowed per worker.
pub const DEFAULT_JOBS_PER_WORKER: usize = 10;

/// Shape of the worker pool and its bounded job queue.
///
/// The job-queue capacity is `workers * jobs_per_worker`; once it is reached,
/// publishes fail with [`JobsAtLimit`](crate::DispatchError::JobsAtLimit)
/// until a worker drains the queue.
///
/// # Example
/// ```
/// use fanout_dispatch::{DispatchConfig, DEFAULT_WORKERS};
///
/// let cfg = DispatchConfig::new(0, 25);
/// assert_eq!(cfg.workers, DEFAULT_WORKERS);
/// assert_eq!(cfg.jobs_per_worker, 25);
/// assert_eq!(cfg.queue_capacity(), 250);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DispatchConfig {
    /// Number of long-lived fan-out workers.
    pub workers: usize,
    /// Queued jobs allowed per worker.
    pub jobs_per_worker: usize,
}

impl DispatchConfig {
    /// Builds a config, replacing each zero value with its default.
    pub fn new(workers: usize, jobs_per_worker: usize) -> Self {
        Self {
            workers: if workers == 0 { DEFAULT_WORKERS } else { workers },
            jobs_per_worker: if jobs_per_worker == 0 {
                DEFAULT_JOBS_PER_WORKER
            } else {
                jobs_per_worker
            },
        }
    }

    /// Job-queue capacity derived from the pool shape.
    pub fn queue_capacity(&self) -> usize {
        self.workers * self.jobs_per_worker
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::new(0, 0)
    }
}
