//! Delivery of terminal outcomes to a resolved surface.
//!
//! Callers resolve the target first; nothing here checks liveness.

use crate::bitmap::{Bitmap, Drawable, LoadedFrom, ResourceId};
use crate::source::ResourceResolver;
use crate::target::{Capability, Compound, DisplaySurface, LoadedImage};
use tracing::{trace, warn};

/// Hand a decoded bitmap to the surface.
///
/// Image surfaces receive it as their image; text surfaces get it as the
/// top decoration. Surfaces with neither capability are left untouched.
pub fn deliver_success(
    surface: &dyn DisplaySurface,
    bitmap: &Bitmap,
    loaded_from: LoadedFrom,
    no_fade: bool,
    debugging: bool,
) {
    let image = LoadedImage {
        bitmap: bitmap.clone(),
        loaded_from,
        animate: !no_fade,
        debug_indicator: debugging.then(|| loaded_from.debug_color()),
    };

    match Capability::of(surface) {
        Capability::Image(target) => target.set_image(image),
        Capability::Text(target) => {
            let mut drawable = Drawable::new(image.bitmap);
            if debugging {
                drawable = drawable.with_label(format!("loaded from {}", loaded_from));
            }
            target.set_compound_drawables(Compound::top(drawable));
        }
        Capability::Unsupported => {
            trace!(loaded_from = %loaded_from, "Surface cannot display images, skipping delivery");
        }
    }
}

/// Apply the configured error fallback, if any.
///
/// A resource id wins over a drawable when both are set. With neither set
/// the surface is left as it was.
pub fn deliver_error(
    surface: &dyn DisplaySurface,
    error_res_id: Option<ResourceId>,
    error_drawable: Option<&Drawable>,
    resources: &dyn ResourceResolver,
) {
    if let Some(id) = error_res_id {
        match Capability::of(surface) {
            Capability::Image(target) => target.set_fallback_resource(id),
            Capability::Text(target) => match resources.resolve(id) {
                Some(drawable) => target.set_compound_drawables(Compound::top(drawable)),
                None => warn!(resource = %id, "Error resource could not be resolved"),
            },
            Capability::Unsupported => {}
        }
    } else if let Some(drawable) = error_drawable {
        match Capability::of(surface) {
            Capability::Image(target) => target.set_fallback_image(drawable.clone()),
            Capability::Text(target) => {
                target.set_compound_drawables(Compound::top(drawable.clone()))
            }
            Capability::Unsupported => {}
        }
    }
}
