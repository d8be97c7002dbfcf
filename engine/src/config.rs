use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

/// Worker pool settings for one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Upper bound on pool threads. Capped by available parallelism.
    pub max_workers: usize,
    /// Stop dispatching rows once this much time has passed since the batch began.
    pub deadline: Option<Duration>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_workers: available_parallelism(),
            deadline: None,
        }
    }
}

impl WorkerConfig {
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Threads the pool will actually use: `min(max_workers, available)`, at least one.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.max_workers.min(available_parallelism()).max(1)
    }
}

fn available_parallelism() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}
