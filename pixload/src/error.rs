//! Error types for the loading pipeline.
//!
//! Failures are classified once, at the boundary with the fetch/decode
//! collaborator. The request engine only ever looks at [`FailureKind`].

use std::io;
use thiserror::Error;

/// Whether a failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Network hiccup, timeout, temporary I/O error.
    Transient,
    /// Malformed source, unsupported format, decode error.
    Permanent,
}

/// Error returned by an [`Orchestrator`](crate::source::Orchestrator) or a
/// [`Transformation`](crate::source::Transformation).
#[derive(Debug, Clone, Error)]
#[error("{kind:?} failure: {message}")]
pub struct FetchError {
    kind: FailureKind,
    message: String,
}

impl FetchError {
    /// Creates a transient error (likely to succeed on retry).
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }

    /// Creates a permanent error (won't succeed on retry).
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Permanent,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_transient(&self) -> bool {
        self.kind == FailureKind::Transient
    }
}

impl From<io::Error> for FetchError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => FetchError::transient(err.to_string()),
            _ => FetchError::permanent(err.to_string()),
        }
    }
}

impl From<image::ImageError> for FetchError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(io) => io.into(),
            other => FetchError::permanent(other.to_string()),
        }
    }
}

/// Errors raised while assembling a loader.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// No tokio runtime was available to host the worker pool.
    #[error("no tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// Worker pool must have at least one thread.
    #[error("worker pool size must be at least 1")]
    EmptyWorkerPool,
}
