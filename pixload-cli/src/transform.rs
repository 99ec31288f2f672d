use image::DynamicImage;
use pixload::{Bitmap, FetchError, Transformation};

/// Desaturates the decoded image.
pub struct Grayscale;

impl Transformation for Grayscale {
    fn key(&self) -> String {
        "grayscale".to_string()
    }

    fn transform(&self, source: Bitmap) -> Result<Bitmap, FetchError> {
        let gray = DynamicImage::ImageRgba8(source.into_pixels()).grayscale();
        Ok(Bitmap::new(gray.to_rgba8()))
    }
}
