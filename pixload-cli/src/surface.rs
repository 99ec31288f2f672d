//! Display surface that prints what it receives.

use parking_lot::Mutex;
use pixload::bitmap::{Drawable, ResourceId};
use pixload::target::{DisplaySurface, ImageSurface, LoadedImage};

/// What a console surface ended up showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shown {
    Image { width: u32, height: u32 },
    Fallback(String),
}

/// An image surface bound to one input path.
pub struct ConsoleSurface {
    name: String,
    shown: Mutex<Option<Shown>>,
}

impl ConsoleSurface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shown: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shown(&self) -> Option<Shown> {
        self.shown.lock().clone()
    }

    pub fn succeeded(&self) -> bool {
        matches!(*self.shown.lock(), Some(Shown::Image { .. }))
    }

    fn show(&self, shown: Shown) {
        *self.shown.lock() = Some(shown);
    }
}

impl ImageSurface for ConsoleSurface {
    fn set_image(&self, image: LoadedImage) {
        let (width, height) = (image.bitmap.width(), image.bitmap.height());
        let indicator = match image.debug_indicator {
            Some(color) => {
                let [r, g, b, _] = color.0;
                format!(" [#{:02x}{:02x}{:02x}]", r, g, b)
            }
            None => String::new(),
        };
        let fade = if image.animate { "fade" } else { "no fade" };
        println!(
            "ok    {}  {}x{} from {} ({}){}",
            self.name, width, height, image.loaded_from, fade, indicator
        );
        self.show(Shown::Image { width, height });
    }

    fn set_fallback_image(&self, image: Drawable) {
        let label = image.label().unwrap_or("error image").to_string();
        println!("fail  {}  showing {}", self.name, label);
        self.show(Shown::Fallback(label));
    }

    fn set_fallback_resource(&self, id: ResourceId) {
        println!("fail  {}  showing resource {}", self.name, id);
        self.show(Shown::Fallback(format!("resource {}", id)));
    }
}

impl DisplaySurface for ConsoleSurface {
    fn as_image_surface(&self) -> Option<&dyn ImageSurface> {
        Some(self)
    }
}
