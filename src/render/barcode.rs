//! # Code 128 Barcode Rendering
//!
//! Encodes a string as a Code 128 symbol and draws it as a bilevel bitmap.
//! Text goes in character set B; runs of four or more digits switch to set C,
//! which packs two digits per symbol. The symbol never carries its own caption; the label
//! composer draws all text.
//!
//! ## Geometry
//!
//! ```text
//! ├─ quiet ─┼──── modules × module_px ────┼─ quiet ─┤
//! │         │ █ ██ █  ███ █ ██  █ ███ █ ██ │         │  ↕ module_height_px
//! ```
//!
//! - `module_px = max(1, round(module_width_mm / 25.4 * dpi))`
//! - `quiet_px = round(quiet_zone_mm / 25.4 * dpi)`
//!
//! The bar height is handed to the encoder in millimetres
//! (`module_height_px / dpi * 25.4`) and converted back, so it round-trips
//! exactly for a fixed DPI.

use barcoders::sym::code128::Code128;
use image::{GrayImage, Luma};

use crate::error::{EtiquetaError, Result};
use crate::label::profile::{mm_to_px, px_to_mm};

/// Pixel value for a printed dot
pub const BLACK: u8 = 0;

/// Pixel value for paper
pub const WHITE: u8 = 255;

/// Quiet zone on each side of the symbol
pub const DEFAULT_QUIET_ZONE_MM: f32 = 2.0;

/// Character set B marker understood by `barcoders`
const CODE_SET_B: char = '\u{0181}';

/// Character set C marker understood by `barcoders`
const CODE_SET_C: char = '\u{0106}';

/// Shortest digit run worth a switch to set C
const MIN_SET_C_RUN: usize = 4;

/// Prefix `data` with code set markers for `barcoders`.
///
/// Digit runs of at least [`MIN_SET_C_RUN`] go in set C. An odd run keeps one
/// digit in set B: the first one when text precedes the run, otherwise the
/// last.
fn with_code_sets(data: &str) -> String {
    let bytes = data.as_bytes();
    let mut out = String::with_capacity(data.len() + 4);
    let mut current = None;
    let mut switch = |out: &mut String, set: char| {
        if current != Some(set) {
            out.push(set);
            current = Some(set);
        }
    };

    let mut i = 0;
    while i < bytes.len() {
        let run = bytes[i..].iter().take_while(|b| b.is_ascii_digit()).count();
        if run >= MIN_SET_C_RUN {
            let lead = if run % 2 == 1 && i > 0 { 1 } else { 0 };
            let paired = (run - lead) & !1;
            if lead == 1 {
                switch(&mut out, CODE_SET_B);
                out.push_str(&data[i..i + 1]);
            }
            switch(&mut out, CODE_SET_C);
            out.push_str(&data[i + lead..i + lead + paired]);
            if lead + paired < run {
                switch(&mut out, CODE_SET_B);
                out.push_str(&data[i + lead + paired..i + run]);
            }
            i += run;
        } else {
            let len = run.max(1);
            switch(&mut out, CODE_SET_B);
            out.push_str(&data[i..i + len]);
            i += len;
        }
    }
    out
}

/// A rendered barcode symbol. Every pixel is [`BLACK`] or [`WHITE`].
#[derive(Debug, Clone, PartialEq)]
pub struct BarcodeImage(GrayImage);

impl BarcodeImage {
    pub(crate) fn new(image: GrayImage) -> Self {
        Self(image)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_inner(self) -> GrayImage {
        self.0
    }

    /// Check that the bitmap holds only black and white pixels.
    pub fn is_bilevel(&self) -> bool {
        self.0.pixels().all(|p| p[0] == BLACK || p[0] == WHITE)
    }
}

/// Encode data as Code 128 modules.
/// Returns a Vec<bool> where true = bar (black), false = space (white).
///
/// Only printable ASCII (0x20-0x7E) is accepted; that is all of character
/// set B and covers UPCs and inventory codes. Long digit runs are packed in
/// set C.
pub fn encode_code128(data: &str) -> Result<Vec<bool>> {
    if data.is_empty() {
        return Err(EtiquetaError::InvalidInput(
            "Cannot generate barcode: empty data provided".to_string(),
        ));
    }

    if let Some(bad) = data.chars().find(|c| !(' '..='~').contains(c)) {
        return Err(EtiquetaError::InvalidInput(format!(
            "Cannot encode {:?} in Code 128 set B (data {:?})",
            bad, data
        )));
    }

    let barcode = Code128::new(with_code_sets(data)).map_err(|e| {
        EtiquetaError::InvalidInput(format!("Barcode generation failed for {:?}: {}", data, e))
    })?;

    Ok(barcode.encode().into_iter().map(|m| m == 1).collect())
}

/// Width of one module in whole pixels (at least 1).
pub fn module_px(module_width_mm: f32, dpi: u32) -> u32 {
    let px = mm_to_px(module_width_mm, dpi).round();
    if px.is_finite() && px >= 1.0 {
        px as u32
    } else {
        1
    }
}

/// Render `data` as a Code 128 bitmap.
///
/// ## Errors
///
/// [`EtiquetaError::InvalidInput`] when `data` is empty or not printable
/// ASCII, or when a dimension is not positive.
///
/// ## Example
///
/// ```
/// use etiqueta::render::barcode::{render, DEFAULT_QUIET_ZONE_MM};
///
/// let img = render("INV-739", 0.3, 100, 300, DEFAULT_QUIET_ZONE_MM).unwrap();
/// assert_eq!(img.height(), 100);
/// assert!(img.is_bilevel());
/// ```
pub fn render(
    data: &str,
    module_width_mm: f32,
    module_height_px: u32,
    dpi: u32,
    quiet_zone_mm: f32,
) -> Result<BarcodeImage> {
    if !(module_width_mm.is_finite() && module_width_mm > 0.0) {
        return Err(EtiquetaError::InvalidInput(format!(
            "Module width must be positive, got {}mm",
            module_width_mm
        )));
    }
    if module_height_px == 0 || dpi == 0 {
        return Err(EtiquetaError::InvalidInput(format!(
            "Module height and DPI must be positive (height {}px, {} DPI)",
            module_height_px, dpi
        )));
    }

    let modules = encode_code128(data)?;

    let module_height_mm = px_to_mm(module_height_px as f32, dpi);
    let height = (mm_to_px(module_height_mm, dpi).round() as u32).max(1);

    let bar_px = module_px(module_width_mm, dpi);
    let quiet_px = mm_to_px(quiet_zone_mm.max(0.0), dpi).round() as u32;
    let width = modules.len() as u32 * bar_px + 2 * quiet_px;

    let mut img = GrayImage::from_pixel(width, height, Luma([WHITE]));
    for (i, _) in modules.iter().enumerate().filter(|(_, bar)| **bar) {
        let x0 = quiet_px + i as u32 * bar_px;
        for x in x0..x0 + bar_px {
            for y in 0..height {
                img.put_pixel(x, y, Luma([BLACK]));
            }
        }
    }

    Ok(BarcodeImage(img))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code128_encoding() {
        let bars = encode_code128("Hello").unwrap();
        // start + 5 data + checksum = 7 symbols of 11 modules, stop is 13
        assert_eq!(bars.len(), 7 * 11 + 13);
        assert!(bars[0], "start symbol begins with a bar");
        assert!(*bars.last().unwrap(), "stop symbol ends with a bar");
    }

    #[test]
    fn test_code_set_markers() {
        assert_eq!(with_code_sets("INV-739"), "\u{0181}INV-739");
        assert_eq!(with_code_sets("0123456789012"), "\u{0106}012345678901\u{0181}2");
        assert_eq!(with_code_sets("A12345"), "\u{0181}A1\u{0106}2345");
        assert_eq!(with_code_sets("1234-X"), "\u{0106}1234\u{0181}-X");
        assert_eq!(with_code_sets("5"), "\u{0181}5");
    }

    #[test]
    fn test_digit_runs_use_set_c() {
        // start C + 6 pairs + code B + "2" + checksum = 10 symbols
        assert_eq!(encode_code128("0123456789012").unwrap().len(), 10 * 11 + 13);
        // start B + "A" "1" + code C + 2 pairs + checksum = 7 symbols
        assert_eq!(encode_code128("A12345").unwrap().len(), 7 * 11 + 13);
        // short runs stay in set B
        assert_eq!(encode_code128("INV-739").unwrap().len(), 9 * 11 + 13);
    }

    #[test]
    fn test_empty_data_rejected() {
        assert!(matches!(
            render("", 0.3, 100, 300, DEFAULT_QUIET_ZONE_MM),
            Err(EtiquetaError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_non_ascii_rejected() {
        assert!(matches!(
            encode_code128("Größe"),
            Err(EtiquetaError::InvalidInput(_))
        ));
        assert!(encode_code128("tab\there").is_err());
    }

    #[test]
    fn test_dimensions() {
        let img = render("INV-739", 0.3, 115, 300, 2.0).unwrap();
        let modules = encode_code128("INV-739").unwrap().len() as u32;
        // 0.3mm at 300 DPI = 3.54 dots -> 4, quiet zone 2mm = 23.6 -> 24
        assert_eq!(img.width(), modules * 4 + 48);
        assert_eq!(img.height(), 115);
    }

    #[test]
    fn test_height_round_trips() {
        for dpi in [203, 300, 600] {
            for height in [1, 17, 99, 115, 400] {
                let img = render("A1", 0.25, height, dpi, 0.0).unwrap();
                assert_eq!(img.height(), height, "dpi {}", dpi);
            }
        }
    }

    #[test]
    fn test_output_bilevel() {
        let img = render("UPC-0123456789", 0.19, 50, 300, 2.0).unwrap();
        assert!(img.is_bilevel());
    }

    #[test]
    fn test_quiet_zone_white() {
        let img = render("X", 0.3, 10, 300, 2.0).unwrap();
        for y in 0..img.height() {
            for x in 0..24 {
                assert_eq!(img.as_image().get_pixel(x, y)[0], WHITE);
            }
        }
        // first module after the quiet zone is the start bar
        assert_eq!(img.as_image().get_pixel(24, 0)[0], BLACK);
    }

    #[test]
    fn test_minimum_module_one_pixel() {
        assert_eq!(module_px(0.01, 300), 1);
        assert_eq!(module_px(0.1, 300), 1);
        assert_eq!(module_px(0.3, 300), 4);
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(render("A", 0.0, 10, 300, 2.0).is_err());
        assert!(render("A", 0.3, 0, 300, 2.0).is_err());
        assert!(render("A", f32::NAN, 10, 300, 2.0).is_err());
    }
}
