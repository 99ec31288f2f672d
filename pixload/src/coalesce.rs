//! In-flight deduplication of identical fetches.
//!
//! When several requests with the same key are running at once, only one
//! of them actually fetches and decodes. The others wait for that result
//! and receive a clone of it.
//!
//! ```text
//! Request A ─┐
//!            │                                   inner
//! Request B ─┼──► CoalescingOrchestrator ──────► Orchestrator
//!            │           │                         │
//! Request C ─┘           │                         │
//!                        ▼                         ▼
//!                 [A, B, C all               [one decode]
//!                  receive same                    │
//!                  outcome]◄───────────────────────┘
//! ```
//!
//! Uses `DashMap` so registration doesn't serialise unrelated keys, and a
//! broadcast channel per key so any number of waiters can share one
//! outcome. Requests that skip the cache are never coalesced.

use crate::error::FetchError;
use crate::source::{FetchSpec, Fetched, Orchestrator};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

type Outcome = Result<Fetched, FetchError>;

/// Statistics for monitoring coalescing effectiveness.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CoalescerStats {
    /// Total fetches received
    pub total_requests: u64,
    /// Fetches that waited for existing work
    pub coalesced_requests: u64,
    /// Fetches that triggered new work
    pub new_requests: u64,
}

impl CoalescerStats {
    /// Returns the coalescing ratio (0.0 to 1.0)
    pub fn coalescing_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.coalesced_requests as f64 / self.total_requests as f64
        }
    }
}

/// Orchestrator wrapper that runs at most one fetch per key at a time.
pub struct CoalescingOrchestrator<O> {
    inner: O,
    in_flight: DashMap<String, broadcast::Sender<Outcome>>,
    total_requests: AtomicU64,
    coalesced_requests: AtomicU64,
    new_requests: AtomicU64,
}

enum Registration {
    Leader,
    Waiter(broadcast::Receiver<Outcome>),
}

/// Removes the leader's entry even if the inner fetch unwinds, so waiters
/// see a closed channel instead of hanging.
struct LeaderGuard<'a> {
    in_flight: &'a DashMap<String, broadcast::Sender<Outcome>>,
    key: &'a str,
}

impl LeaderGuard<'_> {
    fn finish(self, outcome: &Outcome) {
        if let Some((_, tx)) = self.in_flight.remove(self.key) {
            let waiters = tx.receiver_count();
            let _ = tx.send(outcome.clone());
            if waiters > 0 {
                debug!(key = ?self.key, waiters = waiters, "Broadcast outcome to coalesced waiters");
            }
        }
        std::mem::forget(self);
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(self.key);
    }
}

impl<O: Orchestrator> CoalescingOrchestrator<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            in_flight: DashMap::new(),
            total_requests: AtomicU64::new(0),
            coalesced_requests: AtomicU64::new(0),
            new_requests: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }

    /// Returns a snapshot of the current statistics.
    pub fn stats(&self) -> CoalescerStats {
        CoalescerStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            coalesced_requests: self.coalesced_requests.load(Ordering::Relaxed),
            new_requests: self.new_requests.load(Ordering::Relaxed),
        }
    }

    /// Number of keys currently being fetched.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    fn register(&self, key: &str) -> Registration {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        match self.in_flight.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                let rx = entry.get().subscribe();
                self.coalesced_requests.fetch_add(1, Ordering::Relaxed);
                debug!(key = ?key, "Coalescing fetch - waiting for in-flight decode");
                Registration::Waiter(rx)
            }
            Entry::Vacant(entry) => {
                // Typical fan-out is a handful of views showing the same image.
                let (tx, _rx) = broadcast::channel(16);
                entry.insert(tx);
                self.new_requests.fetch_add(1, Ordering::Relaxed);
                Registration::Leader
            }
        }
    }
}

impl<O: Orchestrator> Orchestrator for CoalescingOrchestrator<O> {
    fn fetch_decoded(&self, spec: &FetchSpec<'_>) -> Result<Fetched, FetchError> {
        if spec.skip_cache {
            return self.inner.fetch_decoded(spec);
        }

        match self.register(spec.key) {
            Registration::Leader => {
                let guard = LeaderGuard {
                    in_flight: &self.in_flight,
                    key: spec.key,
                };
                let outcome = self.inner.fetch_decoded(spec);
                guard.finish(&outcome);
                outcome
            }
            Registration::Waiter(mut rx) => match rx.blocking_recv() {
                Ok(outcome) => outcome,
                Err(_) => Err(FetchError::transient(
                    "in-flight fetch for this key was abandoned",
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::LoadedFrom;
    use crate::source::ImageSource;
    use crate::test_support::solid;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Barrier};
    use std::time::Duration;

    /// Inner orchestrator that blocks until released, counting calls.
    struct Gate {
        calls: AtomicUsize,
        entered: Barrier,
        release: Barrier,
    }

    impl Orchestrator for Gate {
        fn fetch_decoded(&self, _spec: &FetchSpec<'_>) -> Result<Fetched, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.wait();
            self.release.wait();
            Ok(Fetched::new(solid(2, 2), LoadedFrom::Network))
        }
    }

    struct Panicking;

    impl Orchestrator for Panicking {
        fn fetch_decoded(&self, _spec: &FetchSpec<'_>) -> Result<Fetched, FetchError> {
            panic!("decoder bug");
        }
    }

    fn fetch(orchestrator: &dyn Orchestrator, key: &str, skip_cache: bool) -> Outcome {
        let source = ImageSource::Stream("https://example.com/a.png".into());
        orchestrator.fetch_decoded(&FetchSpec {
            key,
            source: &source,
            options: None,
            transformations: &[],
            skip_cache,
        })
    }

    #[test]
    fn test_single_fetch_passes_through() {
        let gate = Gate {
            calls: AtomicUsize::new(0),
            entered: Barrier::new(1),
            release: Barrier::new(1),
        };
        let coalescer = CoalescingOrchestrator::new(gate);
        let outcome = fetch(&coalescer, "a\n", false).unwrap();
        assert_eq!(outcome.loaded_from, LoadedFrom::Network);
        assert_eq!(coalescer.in_flight_count(), 0);
        assert_eq!(coalescer.stats().new_requests, 1);
    }

    #[test]
    fn test_concurrent_same_key_decodes_once() {
        let coalescer = Arc::new(CoalescingOrchestrator::new(Gate {
            calls: AtomicUsize::new(0),
            entered: Barrier::new(2),
            release: Barrier::new(2),
        }));

        let leader = {
            let coalescer = Arc::clone(&coalescer);
            std::thread::spawn(move || fetch(coalescer.as_ref(), "same\n", false))
        };
        // Leader is now inside the inner fetch.
        coalescer.inner().entered.wait();

        let waiter = {
            let coalescer = Arc::clone(&coalescer);
            std::thread::spawn(move || fetch(coalescer.as_ref(), "same\n", false))
        };
        while coalescer.stats().coalesced_requests == 0 {
            std::thread::sleep(Duration::from_millis(1));
        }
        coalescer.inner().release.wait();

        let first = leader.join().unwrap().unwrap();
        let second = waiter.join().unwrap().unwrap();
        assert!(first.bitmap.ptr_eq(&second.bitmap));
        assert_eq!(coalescer.inner().calls.load(Ordering::SeqCst), 1);

        let stats = coalescer.stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.coalesced_requests, 1);
        assert!((stats.coalescing_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_skip_cache_bypasses_registry() {
        let coalescer = CoalescingOrchestrator::new(Gate {
            calls: AtomicUsize::new(0),
            entered: Barrier::new(1),
            release: Barrier::new(1),
        });
        fetch(&coalescer, "a\n", true).unwrap();
        assert_eq!(coalescer.stats().total_requests, 0);
    }

    #[test]
    fn test_leader_panic_clears_entry() {
        let coalescer = CoalescingOrchestrator::new(Panicking);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            fetch(&coalescer, "a\n", false)
        }));
        assert!(result.is_err());
        assert_eq!(coalescer.in_flight_count(), 0);
    }

    #[test]
    fn test_stats_ratio_empty() {
        assert_eq!(CoalescerStats::default().coalescing_ratio(), 0.0);
    }
}
