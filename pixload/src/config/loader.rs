//! Loader configuration.

use super::defaults::{
    default_worker_threads, DEFAULT_DEBUGGING, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY_MS,
};
use std::time::Duration;

/// Settings shared by every request issued through one loader.
///
/// # Example
///
/// ```
/// use pixload::config::LoaderConfig;
/// use std::time::Duration;
///
/// let config = LoaderConfig::new()
///     .with_retry_count(3)
///     .with_retry_delay(Duration::from_millis(250))
///     .with_debugging(true);
/// assert_eq!(config.retry_count(), 3);
/// assert!(config.debugging());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    retry_count: u32,
    retry_delay: Duration,
    worker_threads: usize,
    debugging: bool,
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retries granted to each request for transient failures.
    pub fn with_retry_count(mut self, retries: u32) -> Self {
        self.retry_count = retries;
        self
    }

    /// Pause between a transient failure and the retry turn.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Size of the worker pool. Values below 1 are raised to 1.
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.max(1);
        self
    }

    /// Overlay provenance colours on delivered images.
    pub fn with_debugging(mut self, debugging: bool) -> Self {
        self.debugging = debugging;
        self
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn debugging(&self) -> bool {
        self.debugging
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            retry_count: DEFAULT_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            worker_threads: default_worker_threads(),
            debugging: DEFAULT_DEBUGGING,
        }
    }
}
