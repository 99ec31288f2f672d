//! Test doubles shared by unit tests.

use crate::bitmap::{Bitmap, Drawable, ResourceId};
use crate::config::LoaderConfig;
use crate::context::{Loader, LoaderContext};
use crate::error::FetchError;
use crate::executor::{RequestExecutor, TaskHandle, UnitOfWork};
use crate::main_thread::{main_channel, MainLoop};
use crate::source::{FetchSpec, Fetched, Orchestrator, ResourceResolver, Transformation};
use crate::target::{Compound, DisplaySurface, ImageSurface, LoadedImage, TextSurface};
use crate::telemetry::{RequestEvent, TelemetrySink};
use image::Rgba;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn solid(width: u32, height: u32) -> Bitmap {
    Bitmap::solid(width, height, Rgba([40, 80, 160, 255]))
}

#[derive(Debug, Clone)]
pub enum SurfaceCall {
    Image(LoadedImage),
    FallbackImage(Drawable),
    FallbackResource(ResourceId),
}

#[derive(Default)]
pub struct RecordingImageSurface {
    calls: Mutex<Vec<SurfaceCall>>,
}

impl RecordingImageSurface {
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().clone()
    }
}

impl ImageSurface for RecordingImageSurface {
    fn set_image(&self, image: LoadedImage) {
        self.calls.lock().push(SurfaceCall::Image(image));
    }

    fn set_fallback_image(&self, image: Drawable) {
        self.calls.lock().push(SurfaceCall::FallbackImage(image));
    }

    fn set_fallback_resource(&self, id: ResourceId) {
        self.calls.lock().push(SurfaceCall::FallbackResource(id));
    }
}

impl DisplaySurface for RecordingImageSurface {
    fn as_image_surface(&self) -> Option<&dyn ImageSurface> {
        Some(self)
    }
}

#[derive(Default)]
pub struct RecordingTextSurface {
    compounds: Mutex<Vec<Compound>>,
}

impl RecordingTextSurface {
    pub fn compounds(&self) -> Vec<Compound> {
        self.compounds.lock().clone()
    }
}

impl TextSurface for RecordingTextSurface {
    fn set_compound_drawables(&self, compound: Compound) {
        self.compounds.lock().push(compound);
    }
}

impl DisplaySurface for RecordingTextSurface {
    fn as_text_surface(&self) -> Option<&dyn TextSurface> {
        Some(self)
    }
}

/// Surface with no display capability.
pub struct PlainSurface;

impl DisplaySurface for PlainSurface {}

#[derive(Default)]
pub struct MapResources(HashMap<ResourceId, Drawable>);

impl MapResources {
    pub fn with(id: ResourceId, drawable: Drawable) -> Self {
        let mut map = HashMap::new();
        map.insert(id, drawable);
        Self(map)
    }
}

impl ResourceResolver for MapResources {
    fn resolve(&self, id: ResourceId) -> Option<Drawable> {
        self.0.get(&id).cloned()
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RequestEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<RequestEvent> {
        self.events.lock().clone()
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.event_type()).collect()
    }
}

impl TelemetrySink for RecordingSink {
    fn emit(&self, event: RequestEvent) {
        self.events.lock().push(event);
    }
}

/// Executor that queues turns until the test runs them.
#[derive(Default)]
pub struct QueueExecutor {
    queue: Mutex<VecDeque<(UnitOfWork, TaskHandle)>>,
    delays: Mutex<Vec<Duration>>,
}

impl QueueExecutor {
    /// Runs the oldest queued turn. Returns false if nothing was queued.
    pub fn run_next(&self) -> bool {
        let next = self.queue.lock().pop_front();
        match next {
            Some((work, handle)) => {
                if !handle.is_cancelled() {
                    work();
                }
                handle.mark_finished();
                true
            }
            None => false,
        }
    }

    /// Runs turns until the queue stays empty, including turns queued by
    /// earlier ones. Returns how many ran.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn submissions(&self) -> usize {
        self.delays.lock().len()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().clone()
    }
}

impl RequestExecutor for QueueExecutor {
    fn submit(&self, work: UnitOfWork, delay: Duration) -> TaskHandle {
        let handle = TaskHandle::new();
        self.delays.lock().push(delay);
        self.queue.lock().push_back((work, handle.clone()));
        handle
    }
}

/// Executor that runs every turn inline, inside `submit`.
#[derive(Default)]
pub struct InlineExecutor {
    delays: Mutex<Vec<Duration>>,
}

impl InlineExecutor {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().clone()
    }
}

impl RequestExecutor for InlineExecutor {
    fn submit(&self, work: UnitOfWork, delay: Duration) -> TaskHandle {
        let handle = TaskHandle::new();
        self.delays.lock().push(delay);
        work();
        handle.mark_finished();
        handle
    }
}

type FetchHook = Box<dyn FnMut() + Send>;

/// Orchestrator that replays a fixed list of outcomes.
#[derive(Default)]
pub struct ScriptedOrchestrator {
    script: Mutex<VecDeque<Result<Fetched, FetchError>>>,
    keys: Mutex<Vec<String>>,
    calls: AtomicUsize,
    hook: Mutex<Option<FetchHook>>,
}

impl ScriptedOrchestrator {
    pub fn new(script: Vec<Result<Fetched, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    /// Runs `hook` at the start of every fetch.
    pub fn on_fetch(&self, hook: impl FnMut() + Send + 'static) {
        *self.hook.lock() = Some(Box::new(hook));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().clone()
    }
}

impl Orchestrator for ScriptedOrchestrator {
    fn fetch_decoded(&self, spec: &FetchSpec<'_>) -> Result<Fetched, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().push(spec.key.to_string());
        if let Some(hook) = self.hook.lock().as_mut() {
            hook();
        }
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::permanent("script exhausted")))
    }
}

/// Transformation that only contributes a key.
pub struct KeyedTransformation(pub &'static str);

impl Transformation for KeyedTransformation {
    fn key(&self) -> String {
        self.0.to_string()
    }

    fn transform(&self, source: Bitmap) -> Result<Bitmap, FetchError> {
        Ok(source)
    }
}

/// A loader wired to test doubles.
pub struct Harness {
    pub context: Arc<LoaderContext>,
    pub executor: Arc<QueueExecutor>,
    pub orchestrator: Arc<ScriptedOrchestrator>,
    pub sink: Arc<RecordingSink>,
    pub main_loop: MainLoop,
}

impl Harness {
    pub fn new(script: Vec<Result<Fetched, FetchError>>) -> Self {
        Self::build(script, LoaderConfig::default(), MapResources::default())
    }

    pub fn with_config(script: Vec<Result<Fetched, FetchError>>, config: LoaderConfig) -> Self {
        Self::build(script, config, MapResources::default())
    }

    pub fn with_resources(
        script: Vec<Result<Fetched, FetchError>>,
        resources: MapResources,
    ) -> Self {
        Self::build(script, LoaderConfig::default(), resources)
    }

    fn build(
        script: Vec<Result<Fetched, FetchError>>,
        config: LoaderConfig,
        resources: MapResources,
    ) -> Self {
        let executor = Arc::new(QueueExecutor::default());
        let orchestrator = Arc::new(ScriptedOrchestrator::new(script));
        let sink = Arc::new(RecordingSink::default());
        let (poster, main_loop) = main_channel();

        let context = LoaderContext::builder(orchestrator.clone(), executor.clone(), Arc::new(poster))
            .with_resources(Arc::new(resources))
            .with_telemetry(sink.clone())
            .with_config(config)
            .build();

        Self {
            context,
            executor,
            orchestrator,
            sink,
            main_loop,
        }
    }

    pub fn loader(&self) -> Loader {
        Loader::new(Arc::clone(&self.context))
    }
}
