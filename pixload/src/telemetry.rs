//! Request lifecycle telemetry.
//!
//! Requests emit structured events through a [`TelemetrySink`]. The engine
//! doesn't decide how they are presented: a sink may log them, count them,
//! or feed a UI.
//!
//! # Example
//!
//! ```
//! use pixload::telemetry::{RequestEvent, TelemetrySink};
//!
//! struct CountingSink(std::sync::atomic::AtomicUsize);
//!
//! impl TelemetrySink for CountingSink {
//!     fn emit(&self, _event: RequestEvent) {
//!         self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!     }
//! }
//! ```

use crate::bitmap::LoadedFrom;
use crate::error::FailureKind;
use crate::source::SourceType;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// What happened when an outcome reached the main context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Bitmap handed to the surface.
    Image,
    /// Error fallback handed to the surface (possibly none configured).
    Error,
    /// Target was gone; nothing delivered.
    TargetGone,
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryOutcome::Image => write!(f, "image"),
            DeliveryOutcome::Error => write!(f, "error"),
            DeliveryOutcome::TargetGone => write!(f, "target_gone"),
        }
    }
}

/// Events emitted over a request's lifetime.
#[derive(Debug, Clone)]
pub enum RequestEvent {
    /// Request handed to the executor for its first turn.
    Submitted { key: String, source: SourceType },

    /// A worker turn started.
    Started { key: String, attempt: u32 },

    /// A transient failure was retried.
    RetryScheduled {
        key: String,
        retries_left: u32,
        delay: Duration,
    },

    /// Retrying stopped because the target went away.
    RetryCancelled { key: String },

    /// Bitmap obtained; delivery posted.
    Completed {
        key: String,
        loaded_from: LoadedFrom,
        retries_left: u32,
    },

    /// Terminal failure; error delivery posted.
    Failed {
        key: String,
        kind: FailureKind,
        message: String,
        retries_left: u32,
    },

    /// Target gone before or between turns. Nothing will be delivered.
    Cancelled { key: String },

    /// An outcome reached the main context.
    Delivered {
        key: String,
        outcome: DeliveryOutcome,
    },

    /// A turn panicked; escalated to the main context.
    Faulted { key: String, message: String },
}

impl RequestEvent {
    pub fn key(&self) -> &str {
        match self {
            Self::Submitted { key, .. }
            | Self::Started { key, .. }
            | Self::RetryScheduled { key, .. }
            | Self::RetryCancelled { key }
            | Self::Completed { key, .. }
            | Self::Failed { key, .. }
            | Self::Cancelled { key }
            | Self::Delivered { key, .. }
            | Self::Faulted { key, .. } => key,
        }
    }

    /// Short name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Submitted { .. } => "submitted",
            Self::Started { .. } => "started",
            Self::RetryScheduled { .. } => "retry_scheduled",
            Self::RetryCancelled { .. } => "retry_cancelled",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
            Self::Cancelled { .. } => "cancelled",
            Self::Delivered { .. } => "delivered",
            Self::Faulted { .. } => "faulted",
        }
    }
}

/// Receiver of request events.
///
/// Events are emitted from worker threads and from the main context, so
/// `emit` must be cheap and must not block.
pub trait TelemetrySink: Send + Sync {
    fn emit(&self, event: RequestEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTelemetrySink;

impl TelemetrySink for NullTelemetrySink {
    fn emit(&self, _event: RequestEvent) {}
}

/// Logs events with `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn emit(&self, event: RequestEvent) {
        // Keys end in a newline; log them escaped.
        match &event {
            RequestEvent::Submitted { key, source } => {
                tracing::debug!(key = ?key, source = ?source, "Request submitted");
            }
            RequestEvent::Started { key, attempt } => {
                tracing::debug!(key = ?key, attempt = attempt, "Request started");
            }
            RequestEvent::RetryScheduled {
                key,
                retries_left,
                delay,
            } => {
                tracing::warn!(
                    key = ?key,
                    retries_left = retries_left,
                    delay_ms = delay.as_millis(),
                    "Request retrying after transient failure"
                );
            }
            RequestEvent::RetryCancelled { key } => {
                tracing::debug!(key = ?key, "Retry cancelled, target gone");
            }
            RequestEvent::Completed {
                key,
                loaded_from,
                retries_left,
            } => {
                tracing::debug!(
                    key = ?key,
                    loaded_from = %loaded_from,
                    retries_left = retries_left,
                    "Request completed"
                );
            }
            RequestEvent::Failed {
                key,
                kind,
                message,
                retries_left,
            } => {
                tracing::warn!(
                    key = ?key,
                    kind = ?kind,
                    retries_left = retries_left,
                    error = %message,
                    "Request failed"
                );
            }
            RequestEvent::Cancelled { key } => {
                tracing::debug!(key = ?key, "Request cancelled, target gone");
            }
            RequestEvent::Delivered { key, outcome } => {
                tracing::trace!(key = ?key, outcome = %outcome, "Outcome delivered");
            }
            RequestEvent::Faulted { key, message } => {
                tracing::error!(key = ?key, fault = %message, "Request turn faulted");
            }
        }
    }
}

/// Forwards every event to several sinks.
#[derive(Default, Clone)]
pub struct MultiplexTelemetrySink {
    sinks: Vec<Arc<dyn TelemetrySink>>,
}

impl MultiplexTelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl TelemetrySink for MultiplexTelemetrySink {
    fn emit(&self, event: RequestEvent) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.emit(event.clone());
            }
            last.emit(event);
        }
    }
}
