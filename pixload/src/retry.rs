//! Bounded retry budget for transient failures.

use crate::error::FailureKind;

/// Number of retries a request gets by default.
pub const DEFAULT_RETRY_COUNT: u32 = 2;

/// Tracks how many retries a request has left.
///
/// The budget only goes down. Once the bound target is found to be gone
/// during a retry, [`cancel_retry`](Self::cancel_retry) makes every later
/// [`should_retry`](Self::should_retry) return false regardless of budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    retry_count: u32,
    retry_cancelled: bool,
}

impl RetryPolicy {
    pub fn new(retry_count: u32) -> Self {
        Self {
            retry_count,
            retry_cancelled: false,
        }
    }

    /// Returns true if a failure of this kind should be retried, consuming
    /// one retry when it does.
    pub fn should_retry(&mut self, kind: FailureKind) -> bool {
        if kind != FailureKind::Transient || self.retry_cancelled || self.retry_count == 0 {
            return false;
        }
        self.retry_count -= 1;
        true
    }

    /// Stop retrying. Idempotent.
    pub fn cancel_retry(&mut self) {
        self.retry_cancelled = true;
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn is_cancelled(&self) -> bool {
        self.retry_cancelled
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_COUNT)
    }
}
