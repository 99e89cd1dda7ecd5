//! Finished label raster.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat};

use crate::error::{EtiquetaError, Result};
use crate::render::barcode::{BLACK, WHITE};

/// Content type of [`LabelImage::to_png`] output
pub const CONTENT_TYPE_PNG: &str = "image/png";

/// A composed label: bilevel, exactly the profile's canvas size.
///
/// Read-only once returned by the composer; rotate or copy it, but build a
/// new one for a different payload.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelImage(GrayImage);

impl LabelImage {
    pub(crate) fn new(image: GrayImage) -> Self {
        Self(image)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// `(width, height)` in pixels
    pub fn size(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_inner(self) -> GrayImage {
        self.0
    }

    /// Whether any pixel in the rectangle is black. The rectangle is clipped.
    pub fn has_ink(&self, x: u32, y: u32, width: u32, height: u32) -> bool {
        let x_end = x.saturating_add(width).min(self.width());
        let y_end = y.saturating_add(height).min(self.height());
        (y..y_end).any(|py| (x..x_end).any(|px| self.0.get_pixel(px, py)[0] == BLACK))
    }

    /// Check that the raster holds only black and white pixels.
    pub fn is_bilevel(&self) -> bool {
        self.0.pixels().all(|p| p[0] == BLACK || p[0] == WHITE)
    }

    /// Encode as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(self.0.clone())
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| EtiquetaError::Image(format!("Failed to encode PNG: {}", e)))?;
        Ok(buf.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_png_signature() {
        let img = LabelImage::new(GrayImage::from_pixel(10, 5, Luma([WHITE])));
        let png = img.to_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 5));
    }

    #[test]
    fn test_has_ink() {
        let mut raw = GrayImage::from_pixel(10, 10, Luma([WHITE]));
        raw.put_pixel(7, 8, Luma([BLACK]));
        let img = LabelImage::new(raw);
        assert!(img.has_ink(0, 0, 10, 10));
        assert!(img.has_ink(7, 8, 1, 1));
        assert!(!img.has_ink(0, 0, 7, 10));
        assert!(img.has_ink(5, 5, 100, 100));
    }
}
