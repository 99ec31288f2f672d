//! A single image load, from submission to delivery.
//!
//! A [`Request`] is owned by whichever executor turn is currently running
//! it. A retry moves it into a fresh turn, so two workers never hold the
//! same request and its retry state needs no lock. Terminal outcomes are
//! posted to the main context, which then owns the request until it is
//! dropped after delivery.
//!
//! ```text
//! Created ──► Running ──► Completed ──► complete() on main
//!               │  ▲
//!               │  └── RetryScheduled (transient, budget left)
//!               ├─────► FailedTerminal ──► error() on main
//!               └─────► Cancelled (target gone, nothing delivered)
//! ```

mod builder;
mod handle;

pub use builder::RequestBuilder;
pub use handle::RequestHandle;

use crate::bitmap::{Drawable, LoadedFrom, ResourceId};
use crate::context::LoaderContext;
use crate::delivery::{deliver_error, deliver_success};
use crate::diagnostics::{worker_label, WorkerLabel};
use crate::error::FetchError;
use crate::executor::TaskHandle;
use crate::fault::{self, UnexpectedFault};
use crate::key::{create_key, transformation_keys};
use crate::retry::RetryPolicy;
use crate::source::{DecodeOptions, FetchSpec, Fetched, ImageSource, Transformation};
use crate::target::TargetBinding;
use crate::telemetry::{DeliveryOutcome, RequestEvent};
use parking_lot::Mutex;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug_span;

/// The request's latest executor turn, shared with its handles.
#[derive(Debug, Default)]
pub(crate) struct TurnSlot {
    turn: u64,
    task: Option<TaskHandle>,
    cancelled: bool,
}

impl TurnSlot {
    /// Records the handle of `turn` unless a later turn is already there.
    fn record(&mut self, turn: u64, task: TaskHandle) {
        if self.cancelled {
            task.cancel();
        }
        if self.task.is_none() || turn > self.turn {
            self.turn = turn;
            self.task = Some(task);
        }
    }

    pub(crate) fn task(&self) -> Option<&TaskHandle> {
        self.task.as_ref()
    }

    /// Stops the pending turn and every turn scheduled after this call.
    pub(crate) fn cancel(&mut self) {
        self.cancelled = true;
        if let Some(task) = &self.task {
            task.cancel();
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

pub(crate) type FutureSlot = Arc<Mutex<TurnSlot>>;

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    Created,
    Running,
    RetryScheduled,
    Completed,
    FailedTerminal,
    Cancelled,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestState::Completed | RequestState::FailedTerminal | RequestState::Cancelled
        )
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestState::Created => write!(f, "created"),
            RequestState::Running => write!(f, "running"),
            RequestState::RetryScheduled => write!(f, "retry_scheduled"),
            RequestState::Completed => write!(f, "completed"),
            RequestState::FailedTerminal => write!(f, "failed_terminal"),
            RequestState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Everything a builder collects before the key is computed.
#[derive(Clone, Default)]
pub(crate) struct RequestSettings {
    pub(crate) options: DecodeOptions,
    pub(crate) transformations: Vec<Arc<dyn Transformation>>,
    pub(crate) skip_cache: bool,
    pub(crate) no_fade: bool,
    pub(crate) error_res_id: Option<ResourceId>,
    pub(crate) error_drawable: Option<Drawable>,
}

/// What a worker turn decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Terminal outcome reached; post delivery to the main context.
    Deliver,
    /// Run another turn after the delay.
    Retry(Duration),
    /// Target gone; drop the request without delivering.
    Cancel,
}

/// One image load bound to one display surface.
pub struct Request {
    context: Arc<LoaderContext>,
    source: ImageSource,
    target: TargetBinding,
    options: Option<DecodeOptions>,
    transformations: Vec<Arc<dyn Transformation>>,
    skip_cache: bool,
    no_fade: bool,
    error_res_id: Option<ResourceId>,
    error_drawable: Option<Drawable>,
    key: String,
    future: FutureSlot,
    result: Option<Fetched>,
    retry: RetryPolicy,
    state: RequestState,
    attempts: u32,
    turns: u64,
}

impl Request {
    pub(crate) fn new(
        context: Arc<LoaderContext>,
        source: ImageSource,
        target: TargetBinding,
        settings: RequestSettings,
    ) -> Self {
        let options = (!settings.options.is_empty()).then_some(settings.options);
        let key = create_key(&source, options.as_ref(), &settings.transformations);
        let retry = RetryPolicy::new(context.config().retry_count());

        Self {
            context,
            source,
            target,
            options,
            transformations: settings.transformations,
            skip_cache: settings.skip_cache,
            no_fade: settings.no_fade,
            error_res_id: settings.error_res_id,
            error_drawable: settings.error_drawable,
            key,
            future: Arc::new(Mutex::new(TurnSlot::default())),
            result: None,
            retry,
            state: RequestState::Created,
            attempts: 0,
            turns: 0,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Retries left in the budget.
    pub fn retry_count(&self) -> u32 {
        self.retry.retry_count()
    }

    pub fn is_retry_cancelled(&self) -> bool {
        self.retry.is_cancelled()
    }

    pub fn result(&self) -> Option<&Fetched> {
        self.result.as_ref()
    }

    pub fn loaded_from(&self) -> Option<LoadedFrom> {
        self.result.as_ref().map(|fetched| fetched.loaded_from)
    }

    pub fn target(&self) -> &TargetBinding {
        &self.target
    }

    /// Number of turns that reached the orchestrator.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Hand the request to the executor for its first turn.
    pub fn submit(self) -> RequestHandle {
        let handle = RequestHandle::new(self.key.clone(), Arc::clone(&self.future));
        self.context.telemetry().emit(RequestEvent::Submitted {
            key: self.key.clone(),
            source: self.source.kind(),
        });
        self.schedule(Duration::ZERO);
        handle
    }

    fn schedule(mut self, delay: Duration) {
        self.turns += 1;
        let turn = self.turns;
        let context = Arc::clone(&self.context);
        let future = Arc::clone(&self.future);

        // The slot is not locked across submit: the executor may run the
        // turn inline, and that turn may schedule its own retry.
        let task = context.executor().submit(Box::new(move || self.run()), delay);
        future.lock().record(turn, task);
    }

    /// True once the target is gone or a handle cancelled the request.
    fn is_abandoned(&self) -> bool {
        self.target.is_gone() || self.future.lock().is_cancelled()
    }

    /// One executor turn.
    ///
    /// Labels the worker, runs the turn, and restores the idle label. A
    /// panic inside the turn is escalated to the main context.
    pub fn run(self) {
        let label = worker_label(&self.source.to_string());
        let context = Arc::clone(&self.context);
        let key = self.key.clone();

        let outcome = {
            let _label = WorkerLabel::enter(label.clone());
            let span = debug_span!("request", label = %label, key = ?key);
            let _span = span.enter();
            panic::catch_unwind(AssertUnwindSafe(move || self.execute()))
        };

        if let Err(payload) = outcome {
            let fault = UnexpectedFault::from_panic(key, label, payload.as_ref());
            context.telemetry().emit(RequestEvent::Faulted {
                key: fault.key.clone(),
                message: fault.message.clone(),
            });
            fault::escalate(context.poster(), fault);
        }
    }

    fn execute(mut self) {
        match self.step() {
            Step::Deliver => self.post_delivery(),
            Step::Retry(delay) => self.schedule(delay),
            Step::Cancel => {}
        }
    }

    /// Advance the state machine by one fetch attempt.
    fn step(&mut self) -> Step {
        let context = Arc::clone(&self.context);
        let telemetry = context.telemetry();

        if self.is_abandoned() {
            if self.state == RequestState::RetryScheduled {
                self.retry.cancel_retry();
                telemetry.emit(RequestEvent::RetryCancelled {
                    key: self.key.clone(),
                });
            }
            return self.cancel();
        }

        self.state = RequestState::Running;
        self.attempts += 1;
        telemetry.emit(RequestEvent::Started {
            key: self.key.clone(),
            attempt: self.attempts,
        });

        let spec = FetchSpec {
            key: &self.key,
            source: &self.source,
            options: self.options.as_ref(),
            transformations: &self.transformations,
            skip_cache: self.skip_cache,
        };

        match context.orchestrator().fetch_decoded(&spec) {
            Ok(fetched) => {
                telemetry.emit(RequestEvent::Completed {
                    key: self.key.clone(),
                    loaded_from: fetched.loaded_from,
                    retries_left: self.retry.retry_count(),
                });
                self.result = Some(fetched);
                self.state = RequestState::Completed;
                Step::Deliver
            }
            Err(error) if error.is_transient() => {
                if !self.retry.should_retry(error.kind()) {
                    return self.fail(&error);
                }
                if self.is_abandoned() {
                    self.retry.cancel_retry();
                    telemetry.emit(RequestEvent::RetryCancelled {
                        key: self.key.clone(),
                    });
                    return self.cancel();
                }
                let delay = context.config().retry_delay();
                telemetry.emit(RequestEvent::RetryScheduled {
                    key: self.key.clone(),
                    retries_left: self.retry.retry_count(),
                    delay,
                });
                self.state = RequestState::RetryScheduled;
                Step::Retry(delay)
            }
            Err(error) => self.fail(&error),
        }
    }

    fn fail(&mut self, error: &FetchError) -> Step {
        self.context.telemetry().emit(RequestEvent::Failed {
            key: self.key.clone(),
            kind: error.kind(),
            message: error.message().to_string(),
            retries_left: self.retry.retry_count(),
        });
        self.state = RequestState::FailedTerminal;
        Step::Deliver
    }

    fn cancel(&mut self) -> Step {
        self.state = RequestState::Cancelled;
        self.context.telemetry().emit(RequestEvent::Cancelled {
            key: self.key.clone(),
        });
        Step::Cancel
    }

    fn post_delivery(self) {
        let context = Arc::clone(&self.context);
        context.poster().post(Box::new(move || self.deliver()));
    }

    /// Runs on the main context.
    fn deliver(self) {
        let outcome = match self.state {
            RequestState::Completed => self.complete(),
            _ => self.error(),
        };
        self.context.telemetry().emit(RequestEvent::Delivered {
            key: self.key.clone(),
            outcome,
        });
    }

    /// Deliver the decoded bitmap to the target, if it is still there.
    ///
    /// # Panics
    ///
    /// Panics if the request has no result. That is a bug in the caller,
    /// not a load failure.
    pub fn complete(&self) -> DeliveryOutcome {
        let Some(fetched) = &self.result else {
            panic!("Attempted to complete request with no result!\n{:?}", self);
        };

        match self.target.resolve() {
            Some(surface) => {
                deliver_success(
                    surface.as_ref(),
                    &fetched.bitmap,
                    fetched.loaded_from,
                    self.no_fade,
                    self.context.debugging(),
                );
                DeliveryOutcome::Image
            }
            None => DeliveryOutcome::TargetGone,
        }
    }

    /// Apply the configured error fallback to the target, if it is still
    /// there.
    pub fn error(&self) -> DeliveryOutcome {
        match self.target.resolve() {
            Some(surface) => {
                deliver_error(
                    surface.as_ref(),
                    self.error_res_id,
                    self.error_drawable.as_ref(),
                    self.context.resources(),
                );
                DeliveryOutcome::Error
            }
            None => DeliveryOutcome::TargetGone,
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("key", &self.key)
            .field("path", &self.source.path())
            .field("resource_id", &self.source.resource_id())
            .field("options", &self.options)
            .field("transformations", &transformation_keys(&self.transformations))
            .field("retry_count", &self.retry.retry_count())
            .field("loaded_from", &self.loaded_from())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoaderConfig;
    use crate::context::Loader;
    use crate::main_thread::main_channel;
    use crate::target::DisplaySurface;
    use crate::test_support::{
        solid, Harness, InlineExecutor, MapResources, RecordingImageSurface,
        ScriptedOrchestrator, SurfaceCall,
    };

    fn res(id: u32) -> ResourceId {
        ResourceId::new(id).unwrap()
    }

    fn memory_hit() -> Result<Fetched, FetchError> {
        Ok(Fetched::new(solid(4, 4), LoadedFrom::Memory))
    }

    fn network_hit() -> Result<Fetched, FetchError> {
        Ok(Fetched::new(solid(4, 4), LoadedFrom::Network))
    }

    fn timeout() -> Result<Fetched, FetchError> {
        Err(FetchError::transient("timed out"))
    }

    fn surface() -> (Arc<RecordingImageSurface>, Arc<dyn DisplaySurface>) {
        let surface = Arc::new(RecordingImageSurface::default());
        let target: Arc<dyn DisplaySurface> = surface.clone();
        (surface, target)
    }

    #[test]
    fn test_new_request_state() {
        let harness = Harness::new(vec![]);
        let (_surface, target) = surface();
        let request = harness
            .loader()
            .load_file("/a.png")
            .resize(10, 20)
            .build(&target);

        assert_eq!(request.key(), "/a.png\nresize:10x20\n");
        assert_eq!(request.state(), RequestState::Created);
        assert_eq!(request.retry_count(), 2);
        assert!(!request.is_retry_cancelled());
        assert!(request.result().is_none());
        assert!(request.target().is_bound_to(&target));
    }

    #[test]
    fn test_retry_budget_follows_config() {
        let harness =
            Harness::with_config(vec![], LoaderConfig::default().with_retry_count(5));
        let (_surface, target) = surface();
        let request = harness.loader().load_file("/a.png").build(&target);
        assert_eq!(request.retry_count(), 5);
    }

    #[test]
    fn test_resource_memory_hit_delivers_once() {
        let mut harness = Harness::new(vec![memory_hit()]);
        let (surface, target) = surface();

        harness
            .loader()
            .load_resource(res(7))
            .into_target(&target);
        assert_eq!(harness.executor.run_all(), 1);
        assert_eq!(harness.main_loop.run_pending(), 1);

        let calls = surface.calls();
        assert_eq!(calls.len(), 1);
        assert!(
            matches!(&calls[0], SurfaceCall::Image(image) if image.loaded_from == LoadedFrom::Memory)
        );
        assert_eq!(harness.orchestrator.calls(), 1);
        assert_eq!(harness.orchestrator.keys(), vec!["7\n".to_string()]);
        assert!(!harness.sink.event_types().contains(&"retry_scheduled"));
    }

    #[test]
    fn test_two_transient_failures_then_success() {
        let harness = Harness::new(vec![timeout(), timeout(), network_hit()]);
        let (_surface, target) = surface();
        let mut request = harness.loader().load_file("/a.png").build(&target);

        assert_eq!(request.step(), Step::Retry(Duration::from_millis(500)));
        assert_eq!(request.state(), RequestState::RetryScheduled);
        assert_eq!(request.step(), Step::Retry(Duration::from_millis(500)));
        assert_eq!(request.step(), Step::Deliver);

        assert_eq!(request.state(), RequestState::Completed);
        assert_eq!(request.retry_count(), 0);
        assert_eq!(request.loaded_from(), Some(LoadedFrom::Network));
        assert_eq!(request.attempts(), 3);
    }

    #[test]
    fn test_retries_through_executor_and_delivers() {
        let mut harness = Harness::new(vec![timeout(), timeout(), network_hit()]);
        let (surface, target) = surface();

        let handle = harness.loader().load_file("/a.png").into_target(&target);
        assert_eq!(harness.executor.run_all(), 3);
        assert_eq!(
            harness.executor.delays(),
            vec![
                Duration::ZERO,
                Duration::from_millis(500),
                Duration::from_millis(500)
            ]
        );
        assert!(handle.is_finished());

        harness.main_loop.run_pending();
        assert_eq!(surface.calls().len(), 1);
        assert_eq!(
            harness.sink.event_types(),
            vec![
                "submitted",
                "started",
                "retry_scheduled",
                "started",
                "retry_scheduled",
                "started",
                "completed",
                "delivered"
            ]
        );
        let retries_left = harness.sink.events().into_iter().find_map(|e| match e {
            RequestEvent::Completed { retries_left, .. } => Some(retries_left),
            _ => None,
        });
        assert_eq!(retries_left, Some(0));
    }

    #[test]
    fn test_inline_executor_retries_and_delivers() {
        let executor = Arc::new(InlineExecutor::default());
        let orchestrator = Arc::new(ScriptedOrchestrator::new(vec![timeout(), network_hit()]));
        let (poster, mut main_loop) = main_channel();
        let context =
            LoaderContext::builder(orchestrator.clone(), executor.clone(), Arc::new(poster))
                .build();
        let (surface, target) = surface();

        let handle = Loader::new(context).load_file("/a.png").into_target(&target);
        assert!(handle.is_finished());
        assert_eq!(
            executor.delays(),
            vec![Duration::ZERO, Duration::from_millis(500)]
        );
        assert_eq!(orchestrator.calls(), 2);

        assert_eq!(main_loop.run_pending(), 1);
        let calls = surface.calls();
        assert_eq!(calls.len(), 1);
        assert!(
            matches!(&calls[0], SurfaceCall::Image(image) if image.loaded_from == LoadedFrom::Network)
        );
    }

    #[test]
    fn test_cancel_before_first_turn() {
        let mut harness = Harness::new(vec![memory_hit()]);
        let (surface, target) = surface();

        let handle = harness.loader().load_file("/a.png").into_target(&target);
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(handle.task().is_some_and(|task| task.is_cancelled()));

        assert_eq!(harness.executor.run_all(), 1);
        assert!(handle.is_finished());
        assert_eq!(harness.orchestrator.calls(), 0);
        assert_eq!(harness.main_loop.run_pending(), 0);
        assert!(surface.calls().is_empty());
    }

    #[test]
    fn test_cancel_drops_pending_retry() {
        let mut harness = Harness::new(vec![timeout(), network_hit()]);
        let (surface, target) = surface();

        let handle = harness.loader().load_file("/a.png").into_target(&target);
        assert!(harness.executor.run_next());
        assert_eq!(harness.executor.submissions(), 2);

        handle.cancel();
        assert!(harness.executor.run_next());
        assert_eq!(harness.executor.pending(), 0);
        assert_eq!(harness.orchestrator.calls(), 1);
        assert_eq!(harness.main_loop.run_pending(), 0);
        assert!(surface.calls().is_empty());
    }

    #[test]
    fn test_cancel_mid_turn_skips_retry() {
        let mut harness = Harness::new(vec![timeout(), network_hit()]);
        let (surface, target) = surface();
        let cancel_on_fetch: Arc<Mutex<Option<RequestHandle>>> = Arc::default();
        harness.orchestrator.on_fetch({
            let cancel_on_fetch = Arc::clone(&cancel_on_fetch);
            move || {
                if let Some(handle) = cancel_on_fetch.lock().as_ref() {
                    handle.cancel();
                }
            }
        });

        let handle = harness.loader().load_file("/a.png").into_target(&target);
        *cancel_on_fetch.lock() = Some(handle);

        assert_eq!(harness.executor.run_all(), 1);
        assert_eq!(harness.executor.submissions(), 1);
        assert_eq!(harness.main_loop.run_pending(), 0);
        assert!(surface.calls().is_empty());
        let types = harness.sink.event_types();
        assert!(types.ends_with(&["retry_cancelled", "cancelled"]));
    }

    #[test]
    fn test_exhausted_budget_delivers_error() {
        let mut harness = Harness::new(vec![timeout(), timeout(), timeout()]);
        let (surface, target) = surface();

        harness
            .loader()
            .load_file("/a.png")
            .error_resource(res(3))
            .into_target(&target);
        assert_eq!(harness.executor.run_all(), 3);
        harness.main_loop.run_pending();

        let calls = surface.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0], SurfaceCall::FallbackResource(id) if id == res(3)));
        assert!(harness.sink.event_types().contains(&"failed"));
    }

    #[test]
    fn test_target_lost_between_failure_and_retry() {
        let mut harness = Harness::new(vec![timeout(), network_hit()]);
        let (surface, target) = surface();

        harness
            .loader()
            .load_file("/a.png")
            .error_resource(res(3))
            .into_target(&target);
        assert!(harness.executor.run_next());
        assert_eq!(harness.executor.submissions(), 2);

        drop(target);
        drop(surface);

        assert!(harness.executor.run_next());
        assert_eq!(harness.executor.submissions(), 2);
        assert_eq!(harness.executor.pending(), 0);
        assert_eq!(harness.orchestrator.calls(), 1);
        assert_eq!(harness.main_loop.run_pending(), 0);

        let types = harness.sink.event_types();
        assert!(types.ends_with(&["retry_cancelled", "cancelled"]));
        assert!(!types.contains(&"failed"));
    }

    #[test]
    fn test_target_lost_mid_turn_cancels_retry() {
        let harness = Harness::new(vec![timeout()]);
        let (surface, target) = surface();
        let mut request = harness.loader().load_file("/a.png").build(&target);
        harness.orchestrator.on_fetch({
            let mut held = Some((surface, target));
            move || drop(held.take())
        });

        assert_eq!(request.step(), Step::Cancel);
        assert_eq!(request.state(), RequestState::Cancelled);
        assert!(request.is_retry_cancelled());
        assert_eq!(request.retry_count(), 1);
    }

    #[test]
    fn test_target_gone_before_first_turn() {
        let mut harness = Harness::new(vec![memory_hit()]);
        let (surface, target) = surface();

        harness.loader().load_file("/a.png").into_target(&target);
        drop(target);
        drop(surface);

        harness.executor.run_all();
        assert_eq!(harness.orchestrator.calls(), 0);
        assert_eq!(harness.main_loop.run_pending(), 0);
        assert_eq!(harness.sink.event_types(), vec!["submitted", "cancelled"]);
    }

    #[test]
    fn test_permanent_failure_skips_retry() {
        let mut harness =
            Harness::new(vec![Err(FetchError::permanent("unsupported format"))]);
        let (surface, target) = surface();
        let fallback = Drawable::new(solid(1, 1)).with_label("broken");

        harness
            .loader()
            .load_file("/a.bmp")
            .error_image(fallback)
            .into_target(&target);
        assert_eq!(harness.executor.run_all(), 1);
        harness.main_loop.run_pending();

        match &surface.calls()[0] {
            SurfaceCall::FallbackImage(image) => assert_eq!(image.label(), Some("broken")),
            other => panic!("unexpected call {:?}", other),
        }
        assert!(!harness.sink.event_types().contains(&"retry_scheduled"));
    }

    #[test]
    fn test_permanent_failure_leaves_budget() {
        let harness = Harness::new(vec![Err(FetchError::permanent("corrupt"))]);
        let (_surface, target) = surface();
        let mut request = harness.loader().load_file("/a.png").build(&target);

        assert_eq!(request.step(), Step::Deliver);
        assert_eq!(request.state(), RequestState::FailedTerminal);
        assert_eq!(request.retry_count(), 2);
    }

    #[test]
    #[should_panic(expected = "Attempted to complete request with no result!")]
    fn test_complete_without_result_panics() {
        let harness = Harness::new(vec![]);
        let (_surface, target) = surface();
        let request = harness.loader().load_file("/a.png").build(&target);
        request.complete();
    }

    #[test]
    fn test_delivery_to_gone_target_is_silent() {
        let harness = Harness::new(vec![memory_hit()]);
        let (surface, target) = surface();
        let mut request = harness
            .loader()
            .load_file("/a.png")
            .error_resource(res(1))
            .build(&target);
        assert_eq!(request.step(), Step::Deliver);

        drop(target);
        drop(surface);
        assert_eq!(request.complete(), DeliveryOutcome::TargetGone);
        assert_eq!(request.error(), DeliveryOutcome::TargetGone);
    }

    #[test]
    fn test_error_prefers_resource_over_image() {
        let harness = Harness::with_resources(
            vec![],
            MapResources::with(res(2), Drawable::new(solid(1, 1))),
        );
        let (surface, target) = surface();
        let request = harness
            .loader()
            .load_file("/a.png")
            .error_image(Drawable::new(solid(1, 1)))
            .error_resource(res(2))
            .build(&target);

        assert_eq!(request.error(), DeliveryOutcome::Error);
        let calls = surface.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0], SurfaceCall::FallbackResource(id) if id == res(2)));
    }

    #[test]
    fn test_debugging_tags_delivery() {
        let mut harness = Harness::with_config(
            vec![Ok(Fetched::new(solid(2, 2), LoadedFrom::Disk))],
            LoaderConfig::default().with_debugging(true),
        );
        let (surface, target) = surface();

        harness
            .loader()
            .load_file("/a.png")
            .no_fade()
            .into_target(&target);
        harness.executor.run_all();
        harness.main_loop.run_pending();

        match &surface.calls()[0] {
            SurfaceCall::Image(image) => {
                assert!(!image.animate);
                assert_eq!(image.debug_indicator, Some(LoadedFrom::Disk.debug_color()));
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn test_turn_panic_is_escalated() {
        let mut harness = Harness::new(vec![]);
        harness.orchestrator.on_fetch(|| panic!("decoder exploded"));
        let (_surface, target) = surface();

        harness.loader().load_file("/a.png").into_target(&target);
        harness.executor.run_all();
        assert_eq!(crate::diagnostics::current_label(), "pixload-idle");
        assert!(harness.sink.event_types().contains(&"faulted"));

        let result = panic::catch_unwind(AssertUnwindSafe(|| harness.main_loop.run_pending()));
        let payload = result.expect_err("fault must be re-raised on the main context");
        let fault = payload.downcast_ref::<UnexpectedFault>().unwrap();
        assert_eq!(fault.label, "pixload-/a.png");
        assert_eq!(fault.message, "decoder exploded");
        assert_eq!(fault.key, "/a.png\n");
    }

    #[test]
    fn test_debug_dump_lists_transformation_keys() {
        let harness = Harness::new(vec![]);
        let (_surface, target) = surface();
        let request = harness
            .loader()
            .load_resource(res(4))
            .transform(Arc::new(crate::test_support::KeyedTransformation("blur")))
            .build(&target);

        let dump = format!("{:?}", request);
        assert!(dump.contains("[blur]"));
        assert!(dump.contains("resource_id: Some(ResourceId(4))"));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(RequestState::FailedTerminal.to_string(), "failed_terminal");
        assert!(RequestState::Cancelled.is_terminal());
        assert!(!RequestState::RetryScheduled.is_terminal());
    }
}
