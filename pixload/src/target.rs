//! Display targets and the weak binding from a request to its target.
//!
//! Targets are owned by the UI layer. A pending load must never keep one
//! alive, so requests only hold a [`TargetBinding`] and re-resolve it before
//! every delivery. A target that has gone away is an expected outcome, not
//! an error.
//!
//! Surfaces advertise what they can do through capability queries on
//! [`DisplaySurface`]. A surface that implements neither capability is
//! simply left alone.

use crate::bitmap::{Bitmap, Drawable, LoadedFrom, ResourceId};
use image::Rgba;
use std::fmt;
use std::sync::{Arc, Weak};

/// Image delivered to a surface after a successful load.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub bitmap: Bitmap,
    pub loaded_from: LoadedFrom,
    /// Whether to animate the transition (false when the request asked for
    /// no fade).
    pub animate: bool,
    /// Provenance colour to overlay when debugging is enabled.
    pub debug_indicator: Option<Rgba<u8>>,
}

/// Decorations around a text surface, one per side.
#[derive(Debug, Clone, Default)]
pub struct Compound {
    pub left: Option<Drawable>,
    pub top: Option<Drawable>,
    pub right: Option<Drawable>,
    pub bottom: Option<Drawable>,
}

impl Compound {
    /// Only the top slot set.
    pub fn top(drawable: Drawable) -> Self {
        Self {
            top: Some(drawable),
            ..Self::default()
        }
    }
}

/// A surface that displays a single image.
pub trait ImageSurface: Send + Sync {
    fn set_image(&self, image: LoadedImage);

    fn set_fallback_image(&self, image: Drawable);

    fn set_fallback_resource(&self, id: ResourceId);
}

/// A text surface decorated with images.
pub trait TextSurface: Send + Sync {
    fn set_compound_drawables(&self, compound: Compound);
}

/// Anything a request can deliver into.
pub trait DisplaySurface: Send + Sync {
    fn as_image_surface(&self) -> Option<&dyn ImageSurface> {
        None
    }

    fn as_text_surface(&self) -> Option<&dyn TextSurface> {
        None
    }
}

/// What a surface can do, resolved once per delivery.
pub enum Capability<'a> {
    Image(&'a dyn ImageSurface),
    Text(&'a dyn TextSurface),
    Unsupported,
}

impl<'a> Capability<'a> {
    pub fn of(surface: &'a dyn DisplaySurface) -> Self {
        if let Some(image) = surface.as_image_surface() {
            Capability::Image(image)
        } else if let Some(text) = surface.as_text_surface() {
            Capability::Text(text)
        } else {
            Capability::Unsupported
        }
    }
}

/// Non-owning link from a request to its target.
#[derive(Clone)]
pub struct TargetBinding {
    target: Weak<dyn DisplaySurface>,
}

impl TargetBinding {
    pub fn new(target: &Arc<dyn DisplaySurface>) -> Self {
        Self {
            target: Arc::downgrade(target),
        }
    }

    /// The target if it is still alive, `None` once it is gone.
    pub fn resolve(&self) -> Option<Arc<dyn DisplaySurface>> {
        self.target.upgrade()
    }

    pub fn is_gone(&self) -> bool {
        self.target.strong_count() == 0
    }

    /// True if this binding points at `target`.
    pub fn is_bound_to(&self, target: &Arc<dyn DisplaySurface>) -> bool {
        std::ptr::addr_eq(self.target.as_ptr(), Arc::as_ptr(target))
    }
}

impl fmt::Debug for TargetBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_gone() {
            write!(f, "TargetBinding(gone)")
        } else {
            write!(f, "TargetBinding({:p})", self.target.as_ptr())
        }
    }
}
