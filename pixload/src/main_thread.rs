//! Marshalling work onto the owning (UI) context.
//!
//! Deliveries and fault escalation never run on a worker. Workers post a
//! closure through a [`MainThreadPoster`]; the owning thread drains a
//! [`MainLoop`] and runs them in order.

use tokio::sync::mpsc;
use tracing::trace;

/// Action executed on the main context.
pub type MainAction = Box<dyn FnOnce() + Send + 'static>;

/// Fire-and-forget posting onto the main context.
pub trait MainThreadPoster: Send + Sync + 'static {
    fn post(&self, action: MainAction);
}

/// Poster half of a [`main_channel`].
#[derive(Clone)]
pub struct ChannelPoster {
    tx: mpsc::UnboundedSender<MainAction>,
}

impl MainThreadPoster for ChannelPoster {
    fn post(&self, action: MainAction) {
        if self.tx.send(action).is_err() {
            trace!("Main loop closed, dropping posted action");
        }
    }
}

/// Receiving half of a [`main_channel`], owned by the main context.
pub struct MainLoop {
    rx: mpsc::UnboundedReceiver<MainAction>,
}

impl MainLoop {
    /// Runs every action already queued without waiting. Returns how many
    /// ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(action) = self.rx.try_recv() {
            action();
            ran += 1;
        }
        ran
    }

    /// Waits for the next action and runs it. Returns false once every
    /// poster has been dropped.
    pub async fn next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(action) => {
                action();
                true
            }
            None => false,
        }
    }

    /// Runs `count` actions, waiting as needed. Returns how many ran, which
    /// is less than `count` only if the channel closed.
    pub async fn run_for(&mut self, count: usize) -> usize {
        let mut ran = 0;
        while ran < count && self.next().await {
            ran += 1;
        }
        ran
    }
}

/// Creates a connected poster / main loop pair.
pub fn main_channel() -> (ChannelPoster, MainLoop) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelPoster { tx }, MainLoop { rx })
}
