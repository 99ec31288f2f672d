//! Source descriptors and the fetch/decode collaborator contract.
//!
//! The request engine never decodes anything itself. It describes what it
//! wants with a [`FetchSpec`] and asks an [`Orchestrator`] to run the
//! cache → fetch → decode → transform pipeline.

use crate::bitmap::{Bitmap, Drawable, LoadedFrom, ResourceId};
use crate::error::FetchError;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Kind of source a request reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    Content,
    File,
    Stream,
    Resource,
}

/// Where an image comes from. Exactly one descriptor per request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageSource {
    /// Content URI resolved by the platform.
    Content(String),
    /// Local file.
    File(PathBuf),
    /// Network or other streamed location.
    Stream(String),
    /// Image bundled with the application.
    Resource(ResourceId),
}

impl ImageSource {
    pub fn kind(&self) -> SourceType {
        match self {
            ImageSource::Content(_) => SourceType::Content,
            ImageSource::File(_) => SourceType::File,
            ImageSource::Stream(_) => SourceType::Stream,
            ImageSource::Resource(_) => SourceType::Resource,
        }
    }

    /// Path text for path-based sources, `None` for resources.
    pub fn path(&self) -> Option<String> {
        match self {
            ImageSource::Content(uri) | ImageSource::Stream(uri) => Some(uri.clone()),
            ImageSource::File(path) => Some(path.display().to_string()),
            ImageSource::Resource(_) => None,
        }
    }

    pub fn resource_id(&self) -> Option<ResourceId> {
        match self {
            ImageSource::Resource(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Resource(id) => write!(f, "{}", id),
            other => write!(f, "{}", other.path().unwrap_or_default()),
        }
    }
}

/// Rotation applied after decoding, optionally around a pivot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    pub degrees: f32,
    pub pivot: Option<(f32, f32)>,
}

/// Decode and geometry hints passed through to the orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecodeOptions {
    pub resize: Option<(u32, u32)>,
    pub rotation: Option<Rotation>,
    pub scale: Option<(f32, f32)>,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resize(mut self, width: u32, height: u32) -> Self {
        self.resize = Some((width, height));
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = Some(Rotation {
            degrees,
            pivot: None,
        });
        self
    }

    pub fn with_rotation_about(mut self, degrees: f32, pivot_x: f32, pivot_y: f32) -> Self {
        self.rotation = Some(Rotation {
            degrees,
            pivot: Some((pivot_x, pivot_y)),
        });
        self
    }

    pub fn with_scale(mut self, scale_x: f32, scale_y: f32) -> Self {
        self.scale = Some((scale_x, scale_y));
        self
    }

    /// True when no option is set.
    pub fn is_empty(&self) -> bool {
        self.resize.is_none() && self.rotation.is_none() && self.scale.is_none()
    }
}

/// A pixel transformation applied after decoding.
///
/// `key()` must be stable: it becomes part of the cache and deduplication
/// key, in the order transformations were added.
pub trait Transformation: Send + Sync {
    fn key(&self) -> String;

    fn transform(&self, source: Bitmap) -> Result<Bitmap, FetchError>;
}

/// Everything the orchestrator needs for one fetch.
#[derive(Clone, Copy)]
pub struct FetchSpec<'a> {
    pub key: &'a str,
    pub source: &'a ImageSource,
    pub options: Option<&'a DecodeOptions>,
    pub transformations: &'a [Arc<dyn Transformation>],
    pub skip_cache: bool,
}

impl fmt::Debug for FetchSpec<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchSpec")
            .field("key", &self.key)
            .field("source", &self.source)
            .field("options", &self.options)
            .field("transformations", &self.transformations.len())
            .field("skip_cache", &self.skip_cache)
            .finish()
    }
}

/// A successful fetch.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub bitmap: Bitmap,
    pub loaded_from: LoadedFrom,
}

impl Fetched {
    pub fn new(bitmap: Bitmap, loaded_from: LoadedFrom) -> Self {
        Self {
            bitmap,
            loaded_from,
        }
    }
}

/// Cache-then-fetch-then-decode-then-transform pipeline.
///
/// Called synchronously from a worker turn, once per turn. Implementations
/// may block.
pub trait Orchestrator: Send + Sync + 'static {
    fn fetch_decoded(&self, spec: &FetchSpec<'_>) -> Result<Fetched, FetchError>;
}

impl<O: Orchestrator + ?Sized> Orchestrator for Arc<O> {
    fn fetch_decoded(&self, spec: &FetchSpec<'_>) -> Result<Fetched, FetchError> {
        (**self).fetch_decoded(spec)
    }
}

/// Resolves bundled resources into drawables for surfaces that cannot take
/// a resource id directly.
pub trait ResourceResolver: Send + Sync {
    fn resolve(&self, id: ResourceId) -> Option<Drawable>;
}

/// Resolver for applications without bundled resources.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResources;

impl ResourceResolver for NoResources {
    fn resolve(&self, _id: ResourceId) -> Option<Drawable> {
        None
    }
}
