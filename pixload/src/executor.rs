//! Worker pool that runs request turns.
//!
//! A request turn is a blocking closure (the orchestrator call inside it may
//! hit disk or network). [`TokioRequestExecutor`] runs turns with
//! `spawn_blocking`, bounded by a semaphore so at most `worker_threads`
//! turns run at once.

use crate::error::LoaderError;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// One scheduling turn of a request.
pub type UnitOfWork = Box<dyn FnOnce() + Send + 'static>;

/// Cancellable handle to a submitted turn.
///
/// Cancelling stops a turn that has not started yet; its work is dropped
/// without running. A turn already on a worker runs to the end.
#[derive(Clone)]
pub struct TaskHandle {
    finished: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl TaskHandle {
    pub fn new() -> Self {
        Self {
            finished: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
        }
    }

    /// Called by the executor once the turn has run (or been dropped).
    pub fn mark_finished(&self) {
        self.finished.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token executors watch to skip a cancelled turn.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Default for TaskHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("finished", &self.is_finished())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Runs request turns off the main context.
pub trait RequestExecutor: Send + Sync + 'static {
    /// Schedule `work` to run after `delay`. Used for first execution
    /// (zero delay) and for retries.
    ///
    /// Implementations may run `work` inline before returning; a turn may
    /// itself call `submit` for its retry. Work whose handle is cancelled
    /// before it starts should be dropped unrun.
    fn submit(&self, work: UnitOfWork, delay: Duration) -> TaskHandle;
}

/// Bounded worker pool on the tokio blocking thread pool.
pub struct TokioRequestExecutor {
    runtime: Handle,
    permits: Arc<Semaphore>,
    worker_threads: usize,
}

impl TokioRequestExecutor {
    /// Creates an executor on the current tokio runtime.
    pub fn new(worker_threads: usize) -> Result<Self, LoaderError> {
        Self::with_handle(Handle::try_current()?, worker_threads)
    }

    /// Creates an executor on an explicit runtime.
    pub fn with_handle(runtime: Handle, worker_threads: usize) -> Result<Self, LoaderError> {
        if worker_threads == 0 {
            return Err(LoaderError::EmptyWorkerPool);
        }
        Ok(Self {
            runtime,
            permits: Arc::new(Semaphore::new(worker_threads)),
            worker_threads,
        })
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    /// Number of idle worker slots.
    pub fn available_workers(&self) -> usize {
        self.permits.available_permits()
    }
}

impl RequestExecutor for TokioRequestExecutor {
    fn submit(&self, work: UnitOfWork, delay: Duration) -> TaskHandle {
        let handle = TaskHandle::new();
        let finished = handle.clone();
        let permits = Arc::clone(&self.permits);
        let cancel = handle.cancellation().clone();

        self.runtime.spawn(async move {
            let permit = tokio::select! {
                biased;

                _ = cancel.cancelled() => None,
                permit = async {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    permits.acquire_owned().await.ok()
                } => permit,
            };
            let Some(_permit) = permit.filter(|_| !cancel.is_cancelled()) else {
                debug!("Request turn dropped before it started");
                finished.mark_finished();
                return;
            };
            if let Err(e) = tokio::task::spawn_blocking(work).await {
                // Turns catch their own panics; reaching this means the
                // blocking pool itself failed.
                error!(error = %e, "Request turn did not run to completion");
            }
            finished.mark_finished();
        });

        handle
    }
}
