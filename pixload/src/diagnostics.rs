//! Worker labels for tracing and fault reports.
//!
//! A worker running a request is labelled with the request's source so
//! panics and log lines can be traced back to the image being loaded. The
//! label is scoped: dropping the guard always restores the idle label, on
//! success, failure, or unwind.

use std::borrow::Cow;
use std::cell::RefCell;

/// Prefix for the label of a busy worker.
pub const THREAD_PREFIX: &str = "pixload-";

/// Label of a worker between requests.
pub const THREAD_IDLE_NAME: &str = "pixload-idle";

thread_local! {
    static LABEL: RefCell<Cow<'static, str>> = const { RefCell::new(Cow::Borrowed(THREAD_IDLE_NAME)) };
}

/// The calling thread's current label.
pub fn current_label() -> String {
    LABEL.with(|label| label.borrow().to_string())
}

/// Label for a worker running a request for `source`.
pub fn worker_label(source: &str) -> String {
    format!("{}{}", THREAD_PREFIX, source)
}

/// Marker for a labelled scope on the current thread.
pub struct WorkerLabel;

impl WorkerLabel {
    /// Labels the current thread until the returned guard is dropped.
    pub fn enter(label: impl Into<String>) -> WorkerLabelGuard {
        let label = label.into();
        LABEL.with(|current| *current.borrow_mut() = Cow::Owned(label));
        WorkerLabelGuard { _private: () }
    }
}

/// Restores the idle label on drop.
#[must_use = "the label is reset as soon as the guard is dropped"]
pub struct WorkerLabelGuard {
    _private: (),
}

impl Drop for WorkerLabelGuard {
    fn drop(&mut self) {
        LABEL.with(|current| *current.borrow_mut() = Cow::Borrowed(THREAD_IDLE_NAME));
    }
}
