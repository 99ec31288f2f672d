//! Escalation of unexpected faults.
//!
//! A panic inside a worker turn is a defect, not a load failure. It must
//! not disappear into the worker pool, so the turn catches it, wraps it in
//! an [`UnexpectedFault`], and re-raises it on the main context where it
//! takes the owning thread down loudly.
//!
//! [`init`] installs a panic hook that reports the fault and the worker
//! label before chaining to the previous hook.

use crate::diagnostics::current_label;
use crate::main_thread::MainThreadPoster;
use std::any::Any;
use std::io::Write;
use std::panic::{self, PanicHookInfo};
use std::sync::OnceLock;
use thiserror::Error;

static HOOK_INSTALLED: OnceLock<()> = OnceLock::new();

/// A panic caught in a worker turn.
#[derive(Debug, Clone, Error)]
#[error("An unexpected fault occurred while loading {label}: {message}")]
pub struct UnexpectedFault {
    /// Key of the request whose turn faulted.
    pub key: String,
    /// Worker label at the time of the fault.
    pub label: String,
    /// Panic message.
    pub message: String,
}

impl UnexpectedFault {
    /// Builds a fault from a caught panic payload.
    pub fn from_panic(
        key: impl Into<String>,
        label: impl Into<String>,
        payload: &(dyn Any + Send),
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            message: panic_message(payload),
        }
    }
}

/// Extracts the message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(fault) = payload.downcast_ref::<UnexpectedFault>() {
        fault.to_string()
    } else {
        "<non-string panic payload>".to_string()
    }
}

/// Re-raise `fault` on the main context.
pub fn escalate(poster: &dyn MainThreadPoster, fault: UnexpectedFault) {
    poster.post(Box::new(move || panic::panic_any(fault)));
}

/// Install the fault-reporting panic hook. Later calls do nothing.
pub fn init() {
    if HOOK_INSTALLED.set(()).is_err() {
        return;
    }

    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
        report_fault(info);
        original_hook(info);
    }));
}

fn report_fault(info: &PanicHookInfo<'_>) {
    // Logging may be the thing that broke; write straight to stderr.
    let mut stderr = std::io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "━━━ pixload fault ━━━");
    if let Some(location) = info.location() {
        let _ = writeln!(
            stderr,
            "Location: {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        );
    }
    let _ = writeln!(stderr, "Message:  {}", panic_message(info.payload()));
    let _ = writeln!(stderr, "Worker:   {}", current_label());

    if let Some(fault) = info.payload().downcast_ref::<UnexpectedFault>() {
        let _ = writeln!(stderr, "Request:  {:?}", fault.key);
        let _ = writeln!(stderr, "Faulted:  {}", fault.label);
    }
    let _ = writeln!(stderr);
    let _ = stderr.flush();
}
