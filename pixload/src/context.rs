//! The loader context and its public entry point.
//!
//! [`LoaderContext`] bundles every collaborator a request needs: the
//! orchestrator, the worker pool, the main-context poster, resource
//! resolution, telemetry, and configuration. It is built once per process
//! and shared by reference with every request; there is no global.

use crate::bitmap::ResourceId;
use crate::config::LoaderConfig;
use crate::executor::RequestExecutor;
use crate::main_thread::MainThreadPoster;
use crate::request::{Request, RequestBuilder, RequestHandle};
use crate::source::{ImageSource, NoResources, Orchestrator, ResourceResolver};
use crate::telemetry::{NullTelemetrySink, TelemetrySink};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared dependencies of every request issued through one loader.
pub struct LoaderContext {
    orchestrator: Arc<dyn Orchestrator>,
    executor: Arc<dyn RequestExecutor>,
    poster: Arc<dyn MainThreadPoster>,
    resources: Arc<dyn ResourceResolver>,
    telemetry: Arc<dyn TelemetrySink>,
    config: LoaderConfig,
}

impl LoaderContext {
    /// Start building a context from its three required collaborators.
    pub fn builder(
        orchestrator: Arc<dyn Orchestrator>,
        executor: Arc<dyn RequestExecutor>,
        poster: Arc<dyn MainThreadPoster>,
    ) -> LoaderContextBuilder {
        LoaderContextBuilder {
            orchestrator,
            executor,
            poster,
            resources: Arc::new(NoResources),
            telemetry: Arc::new(NullTelemetrySink),
            config: LoaderConfig::default(),
        }
    }

    pub fn orchestrator(&self) -> &dyn Orchestrator {
        self.orchestrator.as_ref()
    }

    pub fn executor(&self) -> &dyn RequestExecutor {
        self.executor.as_ref()
    }

    pub fn poster(&self) -> &dyn MainThreadPoster {
        self.poster.as_ref()
    }

    pub fn resources(&self) -> &dyn ResourceResolver {
        self.resources.as_ref()
    }

    pub fn telemetry(&self) -> &dyn TelemetrySink {
        self.telemetry.as_ref()
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Whether delivered images carry the provenance debug indicator.
    pub fn debugging(&self) -> bool {
        self.config.debugging()
    }
}

impl fmt::Debug for LoaderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`LoaderContext`].
pub struct LoaderContextBuilder {
    orchestrator: Arc<dyn Orchestrator>,
    executor: Arc<dyn RequestExecutor>,
    poster: Arc<dyn MainThreadPoster>,
    resources: Arc<dyn ResourceResolver>,
    telemetry: Arc<dyn TelemetrySink>,
    config: LoaderConfig,
}

impl LoaderContextBuilder {
    pub fn with_resources(mut self, resources: Arc<dyn ResourceResolver>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Arc<LoaderContext> {
        Arc::new(LoaderContext {
            orchestrator: self.orchestrator,
            executor: self.executor,
            poster: self.poster,
            resources: self.resources,
            telemetry: self.telemetry,
            config: self.config,
        })
    }
}

/// Entry point for issuing loads.
///
/// ```ignore
/// let loader = Loader::new(context);
/// let handle = loader
///     .load_file("/sdcard/cat.png")
///     .resize(128, 128)
///     .error_resource(placeholder)
///     .into_target(&image_view);
/// ```
#[derive(Clone, Debug)]
pub struct Loader {
    context: Arc<LoaderContext>,
}

impl Loader {
    pub fn new(context: Arc<LoaderContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<LoaderContext> {
        &self.context
    }

    /// Start describing a load from `source`.
    pub fn load(&self, source: ImageSource) -> RequestBuilder {
        RequestBuilder::new(Arc::clone(&self.context), source)
    }

    pub fn load_file(&self, path: impl Into<PathBuf>) -> RequestBuilder {
        self.load(ImageSource::File(path.into()))
    }

    pub fn load_stream(&self, uri: impl Into<String>) -> RequestBuilder {
        self.load(ImageSource::Stream(uri.into()))
    }

    pub fn load_content(&self, uri: impl Into<String>) -> RequestBuilder {
        self.load(ImageSource::Content(uri.into()))
    }

    pub fn load_resource(&self, id: ResourceId) -> RequestBuilder {
        self.load(ImageSource::Resource(id))
    }

    /// Submit a request built elsewhere.
    pub fn submit(&self, request: Request) -> RequestHandle {
        request.submit()
    }
}
