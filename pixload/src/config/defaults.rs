//! Default values for loader settings.

use crate::retry::DEFAULT_RETRY_COUNT;

/// Retries granted to each request.
pub const DEFAULT_RETRIES: u32 = DEFAULT_RETRY_COUNT;

/// Pause before a retry turn is scheduled.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Upper bound on the default worker pool size.
pub const MAX_DEFAULT_WORKER_THREADS: usize = 4;

/// Debug indicators are off unless asked for.
pub const DEFAULT_DEBUGGING: bool = false;

/// Get the number of available CPU cores.
pub fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Default worker pool size: one per core, at most
/// [`MAX_DEFAULT_WORKER_THREADS`].
pub fn default_worker_threads() -> usize {
    num_cpus().clamp(1, MAX_DEFAULT_WORKER_THREADS)
}
