//! # Label Composition
//!
//! Places a fitted barcode and its caption on a blank canvas of the
//! profile's exact pixel size.
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────── canvas_w ────────────────────┐
//! │ margin │      ███ █ ██ barcode ██ █ ███    │ margin │ ┐
//! │        │      ███ █ ██         ██ █ ███    │        │ │ floor(canvas_h * ratio)
//! │        │      ███ █ ██         ██ █ ███    │        │ ┘
//! │                       2px gap                      │
//! │                 Spool PLA | 0123456                │ caption
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! Both barcode and caption are centred horizontally. Anything that does not
//! fit is clipped; the canvas is never resized. The composer never rotates
//! either: the unrotated canvas matches the label's declared dimensions and
//! the transpiler handles orientation.

use image::{GrayImage, Luma, imageops};
use tracing::debug;

use super::image::LabelImage;
use super::profile::LabelProfile;
use crate::error::Result;
use crate::render::barcode::{BLACK, WHITE};
use crate::render::fit::{FitOptions, fit_to_width};
use crate::render::font::{CaptionFont, FontConfig, TextMask, resolve_font};

/// Vertical gap between barcode and caption
pub const CAPTION_GAP_PX: u32 = 2;

/// Draws labels with a resolved caption font.
#[derive(Debug, Clone)]
pub struct LabelComposer {
    font: CaptionFont,
    font_size_px: f32,
    fit: FitOptions,
}

impl LabelComposer {
    /// Create a composer, resolving the caption font once.
    pub fn new(config: &FontConfig) -> Self {
        Self::with_font(resolve_font(config), config.size_px)
    }

    /// Create a composer with an already loaded font.
    pub fn with_font(font: CaptionFont, font_size_px: f32) -> Self {
        Self {
            font,
            font_size_px,
            fit: FitOptions::default(),
        }
    }

    /// Override the barcode fit parameters.
    pub fn with_fit_options(mut self, fit: FitOptions) -> Self {
        self.fit = fit;
        self
    }

    pub fn font(&self) -> &CaptionFont {
        &self.font
    }

    /// Compose a label for `data`.
    ///
    /// `caption` defaults to `data` so the payload is always readable under
    /// the symbol.
    ///
    /// ## Errors
    ///
    /// Only barcode errors: empty or unencodable data, or a profile leaving
    /// no room for the barcode.
    ///
    /// ## Example
    ///
    /// ```
    /// use etiqueta::label::{LabelComposer, LabelProfile};
    /// use etiqueta::render::font::CaptionFont;
    ///
    /// let composer = LabelComposer::with_font(CaptionFont::Bitmap, 14.0);
    /// let label = composer.compose("INV-739", None, &LabelProfile::default()).unwrap();
    /// assert_eq!(label.size(), (566, 165));
    /// ```
    pub fn compose(
        &self,
        data: &str,
        caption: Option<&str>,
        profile: &LabelProfile,
    ) -> Result<LabelImage> {
        let (canvas_w, canvas_h) = profile.canvas_size_px();
        let barcode_height = (canvas_h as f32 * profile.barcode_area_ratio()).floor() as i64;
        let max_barcode_width = canvas_w as i64 - 2 * profile.side_margin_px() as i64;

        let barcode = fit_to_width(data, max_barcode_width, barcode_height, profile.dpi(), &self.fit)?;

        let mut canvas = GrayImage::from_pixel(canvas_w, canvas_h, Luma([WHITE]));

        let barcode_x = (canvas_w as i64 - barcode.width() as i64) / 2;
        imageops::replace(&mut canvas, barcode.as_image(), barcode_x, 0);

        let caption = caption.unwrap_or(data);
        let text = self.font.render(caption, self.font_size_px);
        let text_x = (canvas_w as i64 - text.width as i64) / 2;
        let text_y = barcode.height() as i64 + CAPTION_GAP_PX as i64;
        draw_mask(&mut canvas, &text, text_x, text_y);

        debug!(
            data,
            caption,
            label = profile.label_code(),
            canvas_w,
            canvas_h,
            barcode_w = barcode.width(),
            barcode_h = barcode.height(),
            "Composed label"
        );

        Ok(LabelImage::new(canvas))
    }
}

impl Default for LabelComposer {
    fn default() -> Self {
        Self::new(&FontConfig::default())
    }
}

/// Draw the black pixels of a mask at (x, y), clipped to the canvas.
fn draw_mask(canvas: &mut GrayImage, mask: &TextMask, x: i64, y: i64) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    for my in 0..mask.height {
        let py = y + my as i64;
        if py < 0 || py >= ch {
            continue;
        }
        for mx in 0..mask.width {
            let px = x + mx as i64;
            if px >= 0 && px < cw && mask.get(mx, my) {
                canvas.put_pixel(px as u32, py as u32, Luma([BLACK]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer() -> LabelComposer {
        LabelComposer::with_font(CaptionFont::Bitmap, 14.0)
    }

    #[test]
    fn test_default_profile_size() {
        let label = composer()
            .compose("INV-739", None, &LabelProfile::default())
            .unwrap();
        assert_eq!(label.size(), (566, 165));
        assert!(label.is_bilevel());
    }

    #[test]
    fn test_barcode_at_top_caption_below() {
        let label = composer()
            .compose("INV-739", None, &LabelProfile::default())
            .unwrap();
        // barcode region: floor(165 * 0.7) = 115 rows
        assert!(label.has_ink(0, 0, 566, 115));
        assert!(label.has_ink(0, 117, 566, 48));
    }

    #[test]
    fn test_barcode_centered() {
        let label = composer()
            .compose("INV-739", Some(""), &LabelProfile::default())
            .unwrap();
        let img = label.as_image();
        let row: Vec<u32> = (0..img.width())
            .filter(|&x| img.get_pixel(x, 0)[0] == BLACK)
            .collect();
        let (first, last) = (row[0], *row.last().unwrap());
        let left = first as i64;
        let right = (img.width() - 1 - last) as i64;
        assert!((left - right).abs() <= 1, "left {} right {}", left, right);
    }

    #[test]
    fn test_caption_defaults_to_data() {
        let profile = LabelProfile::default();
        let a = composer().compose("INV-739", None, &profile).unwrap();
        let b = composer().compose("INV-739", Some("INV-739"), &profile).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_caption_leaves_text_area_blank() {
        let label = composer()
            .compose("INV-739", Some(""), &LabelProfile::default())
            .unwrap();
        assert!(!label.has_ink(0, 115, 566, 50));
    }

    #[test]
    fn test_oversized_barcode_is_clipped() {
        let profile = LabelProfile::from_mm(15.0, 10.0);
        let label = composer()
            .compose("A-VERY-LONG-INVENTORY-IDENTIFIER-0001", None, &profile)
            .unwrap();
        assert_eq!(label.size(), profile.canvas_size_px());
    }

    #[test]
    fn test_empty_data_fails() {
        assert!(composer().compose("", None, &LabelProfile::default()).is_err());
    }
}
