use super::{Request, RequestHandle, RequestSettings};
use crate::bitmap::{Drawable, ResourceId};
use crate::context::LoaderContext;
use crate::source::{ImageSource, Transformation};
use crate::target::{DisplaySurface, TargetBinding};
use std::fmt;
use std::sync::Arc;

/// Fluent description of a load, finished by [`into_target`](Self::into_target).
pub struct RequestBuilder {
    context: Arc<LoaderContext>,
    source: ImageSource,
    settings: RequestSettings,
}

impl RequestBuilder {
    pub(crate) fn new(context: Arc<LoaderContext>, source: ImageSource) -> Self {
        Self {
            context,
            source,
            settings: RequestSettings::default(),
        }
    }

    /// Decode to `width` x `height`.
    pub fn resize(mut self, width: u32, height: u32) -> Self {
        self.settings.options = self.settings.options.with_resize(width, height);
        self
    }

    /// Rotate by `degrees` about the centre.
    pub fn rotate(mut self, degrees: f32) -> Self {
        self.settings.options = self.settings.options.with_rotation(degrees);
        self
    }

    pub fn rotate_about(mut self, degrees: f32, pivot_x: f32, pivot_y: f32) -> Self {
        self.settings.options = self
            .settings
            .options
            .with_rotation_about(degrees, pivot_x, pivot_y);
        self
    }

    pub fn scale(mut self, scale_x: f32, scale_y: f32) -> Self {
        self.settings.options = self.settings.options.with_scale(scale_x, scale_y);
        self
    }

    /// Append a transformation. Transformations run in the order added.
    pub fn transform(mut self, transformation: Arc<dyn Transformation>) -> Self {
        self.settings.transformations.push(transformation);
        self
    }

    /// Neither read from nor write to the shared cache.
    pub fn skip_cache(mut self) -> Self {
        self.settings.skip_cache = true;
        self
    }

    /// Show the image without a fade-in.
    pub fn no_fade(mut self) -> Self {
        self.settings.no_fade = true;
        self
    }

    /// Bundled resource shown if the load fails. Takes precedence over
    /// [`error_image`](Self::error_image).
    pub fn error_resource(mut self, id: ResourceId) -> Self {
        self.settings.error_res_id = Some(id);
        self
    }

    /// Image shown if the load fails.
    pub fn error_image(mut self, drawable: Drawable) -> Self {
        self.settings.error_drawable = Some(drawable);
        self
    }

    /// Build the request without submitting it.
    pub fn build(self, target: &Arc<dyn DisplaySurface>) -> Request {
        Request::new(
            self.context,
            self.source,
            TargetBinding::new(target),
            self.settings,
        )
    }

    /// Build the request and submit it against `target`.
    ///
    /// The loader keeps only a weak reference to `target`; dropping it
    /// cancels the load.
    pub fn into_target(self, target: &Arc<dyn DisplaySurface>) -> RequestHandle {
        self.build(target).submit()
    }
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("source", &self.source)
            .field("options", &self.settings.options)
            .field("transformations", &self.settings.transformations.len())
            .field("skip_cache", &self.settings.skip_cache)
            .field("no_fade", &self.settings.no_fade)
            .finish_non_exhaustive()
    }
}
