//! Decoded image types shared by the request engine and display surfaces.
//!
//! Pixels are held behind an [`Arc`] so a bitmap can move from a worker
//! thread to the main context (and be fanned out to coalesced waiters)
//! without copying.

use image::{Rgba, RgbaImage};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;

/// A decoded RGBA bitmap.
#[derive(Clone)]
pub struct Bitmap {
    pixels: Arc<RgbaImage>,
}

impl Bitmap {
    /// Wraps decoded pixels.
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    /// Creates a bitmap filled with a single colour.
    pub fn solid(width: u32, height: u32, color: Rgba<u8>) -> Self {
        Self::new(RgbaImage::from_pixel(width, height, color))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Borrow the underlying pixels.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Returns the pixels, cloning only if the buffer is shared.
    pub fn into_pixels(self) -> RgbaImage {
        Arc::try_unwrap(self.pixels).unwrap_or_else(|shared| (*shared).clone())
    }

    /// Returns true if both bitmaps share the same pixel buffer.
    pub fn ptr_eq(&self, other: &Bitmap) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitmap({}x{})", self.width(), self.height())
    }
}

/// Where a bitmap came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadedFrom {
    Memory,
    Disk,
    Network,
}

impl LoadedFrom {
    /// Colour of the debug indicator drawn over images from this source.
    pub fn debug_color(self) -> Rgba<u8> {
        match self {
            LoadedFrom::Memory => Rgba([0, 255, 0, 255]),
            LoadedFrom::Disk => Rgba([255, 255, 0, 255]),
            LoadedFrom::Network => Rgba([255, 0, 0, 255]),
        }
    }
}

impl fmt::Display for LoadedFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadedFrom::Memory => write!(f, "memory"),
            LoadedFrom::Disk => write!(f, "disk"),
            LoadedFrom::Network => write!(f, "network"),
        }
    }
}

/// Identifier of an image bundled with the application.
///
/// Zero is never a valid resource, so "no resource" is `Option::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(NonZeroU32);

impl ResourceId {
    /// Returns `None` for zero.
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A ready-made image handed to a surface as-is, typically an error
/// placeholder.
#[derive(Debug, Clone)]
pub struct Drawable {
    bitmap: Bitmap,
    label: Option<String>,
}

impl Drawable {
    pub fn new(bitmap: Bitmap) -> Self {
        Self {
            bitmap,
            label: None,
        }
    }

    /// Attach a human-readable label (shown by console surfaces).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}
