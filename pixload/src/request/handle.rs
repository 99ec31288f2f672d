use super::FutureSlot;
use crate::executor::TaskHandle;
use std::fmt;

/// Caller-side view of a submitted request.
///
/// Dropping the handle does not cancel anything. A load stops when its
/// target goes away or when [`RequestHandle::cancel`] is called.
#[derive(Clone)]
pub struct RequestHandle {
    key: String,
    future: FutureSlot,
}

impl RequestHandle {
    pub(crate) fn new(key: String, future: FutureSlot) -> Self {
        Self { key, future }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Handle of the latest executor turn.
    pub fn task(&self) -> Option<TaskHandle> {
        self.future.lock().task().cloned()
    }

    /// Cancels the request.
    ///
    /// A turn that has not started is dropped unrun. A turn already running
    /// finishes its fetch, then cancels instead of retrying; a terminal
    /// outcome it reached is still delivered.
    pub fn cancel(&self) {
        self.future.lock().cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.future.lock().is_cancelled()
    }

    /// True once the latest turn has finished on its worker and scheduled
    /// nothing further. Delivery may still be queued on the main context.
    pub fn is_finished(&self) -> bool {
        self.future
            .lock()
            .task()
            .is_some_and(TaskHandle::is_finished)
    }
}

impl fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandle")
            .field("key", &self.key)
            .field("finished", &self.is_finished())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
