//! File-backed orchestrator with an in-memory bitmap cache.

use dashmap::DashMap;
use image::imageops::{self, FilterType};
use pixload::source::{FetchSpec, Fetched};
use pixload::{Bitmap, DecodeOptions, FetchError, ImageSource, LoadedFrom, Orchestrator};
use std::path::Path;
use tracing::debug;

/// Decodes local files with the `image` crate and caches results by key.
///
/// Cache hits report [`LoadedFrom::Memory`]; everything else came off disk.
#[derive(Default)]
pub struct LocalOrchestrator {
    cache: DashMap<String, Bitmap>,
}

impl LocalOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn decode(&self, spec: &FetchSpec<'_>, path: &Path) -> Result<Bitmap, FetchError> {
        let mut bitmap = Bitmap::new(image::open(path)?.to_rgba8());
        if let Some(options) = spec.options {
            bitmap = apply_options(bitmap, options)?;
        }
        for transformation in spec.transformations {
            bitmap = transformation.transform(bitmap)?;
        }
        Ok(bitmap)
    }
}

impl Orchestrator for LocalOrchestrator {
    fn fetch_decoded(&self, spec: &FetchSpec<'_>) -> Result<Fetched, FetchError> {
        if !spec.skip_cache {
            if let Some(hit) = self.cache.get(spec.key) {
                return Ok(Fetched::new(hit.clone(), LoadedFrom::Memory));
            }
        }

        let path = match spec.source {
            ImageSource::File(path) => path,
            ImageSource::Resource(id) => {
                return Err(FetchError::permanent(format!(
                    "no bundled resource {}",
                    id
                )))
            }
            other => {
                return Err(FetchError::permanent(format!(
                    "{:?} sources are not supported by the local loader",
                    other.kind()
                )))
            }
        };

        let bitmap = self.decode(spec, path)?;
        debug!(path = %path.display(), width = bitmap.width(), height = bitmap.height(), "Decoded from disk");

        if !spec.skip_cache {
            self.cache.insert(spec.key.to_string(), bitmap.clone());
        }
        Ok(Fetched::new(bitmap, LoadedFrom::Disk))
    }
}

fn apply_options(bitmap: Bitmap, options: &DecodeOptions) -> Result<Bitmap, FetchError> {
    let mut pixels = bitmap.into_pixels();

    if let Some((width, height)) = options.resize {
        pixels = imageops::resize(&pixels, width, height, FilterType::Triangle);
    }

    if let Some(rotation) = options.rotation {
        if rotation.pivot.is_some() {
            return Err(FetchError::permanent("rotation about a pivot is not supported"));
        }
        pixels = match rotation.degrees.rem_euclid(360.0) {
            d if d == 0.0 => pixels,
            d if d == 90.0 => imageops::rotate90(&pixels),
            d if d == 180.0 => imageops::rotate180(&pixels),
            d if d == 270.0 => imageops::rotate270(&pixels),
            d => {
                return Err(FetchError::permanent(format!(
                    "rotation by {} degrees is not supported",
                    d
                )))
            }
        };
    }

    if let Some((scale_x, scale_y)) = options.scale {
        let width = (pixels.width() as f32 * scale_x).round().max(1.0) as u32;
        let height = (pixels.height() as f32 * scale_y).round().max(1.0) as u32;
        pixels = imageops::resize(&pixels, width, height, FilterType::Triangle);
    }

    Ok(Bitmap::new(pixels))
}
