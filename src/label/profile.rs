//! # Label Profile
//!
//! Immutable geometry of a physical label: canvas size in pixels, margins,
//! resolution and how much of the height the barcode may use.
//!
//! ## Canvas Size
//!
//! ```text
//! canvas = vendor_table[label_code]          (known label at 300 DPI)
//!        | round(mm / 25.4 * dpi) per axis   (anything else)
//! ```
//!
//! Vendor pixel counts are not exact roundings of the millimetre size
//! (54mm at 300 DPI is 638 dots, the 17x54 label prints 566), so the table
//! always wins when it applies.
//!
//! ## Usage
//!
//! ```
//! use etiqueta::label::LabelProfile;
//!
//! let profile = LabelProfile::default();
//! assert_eq!(profile.label_code(), "17x54");
//! assert_eq!(profile.canvas_size_px(), (566, 165));
//!
//! let custom = LabelProfile::from_mm(40.0, 20.0);
//! assert_eq!(custom.label_code(), "20x40");
//! ```

use crate::error::{EtiquetaError, Result};
use crate::printer::labels::{FormFactor, LABEL_TABLE_DPI, LabelSpec};

/// Default resolution of Brother QL printers
pub const DEFAULT_DPI: u32 = 300;

/// Share of the canvas height given to the barcode
pub const DEFAULT_BARCODE_AREA_RATIO: f32 = 0.7;

/// Left/right margin kept clear of the barcode
pub const DEFAULT_SIDE_MARGIN_MM: f32 = 1.0;

/// Convert millimetres to pixels at the given resolution.
#[inline]
pub fn mm_to_px(mm: f32, dpi: u32) -> f32 {
    mm / 25.4 * dpi as f32
}

/// Convert pixels to millimetres at the given resolution.
#[inline]
pub fn px_to_mm(px: f32, dpi: u32) -> f32 {
    px / dpi as f32 * 25.4
}

/// Geometry of a physical label
#[derive(Debug, Clone, PartialEq)]
pub struct LabelProfile {
    label_code: String,
    width_mm: f32,
    height_mm: f32,
    dpi: u32,
    barcode_area_ratio: f32,
    side_margin_mm: f32,
}

impl LabelProfile {
    /// Profile for an arbitrary label size held landscape.
    ///
    /// The label code is `"{height}x{width}"` with both sides rounded to
    /// whole millimetres, the convention the printer family uses.
    pub fn from_mm(width_mm: f32, height_mm: f32) -> Self {
        Self {
            label_code: format!("{}x{}", height_mm.round() as i64, width_mm.round() as i64),
            width_mm,
            height_mm,
            dpi: DEFAULT_DPI,
            barcode_area_ratio: DEFAULT_BARCODE_AREA_RATIO,
            side_margin_mm: DEFAULT_SIDE_MARGIN_MM,
        }
    }

    /// Profile for a die-cut or round label from the printer catalogue.
    pub fn from_label_code(code: &str) -> Result<Self> {
        let spec = LabelSpec::by_code(code)
            .ok_or_else(|| EtiquetaError::InvalidInput(format!("Unknown label code '{}'", code)))?;

        if spec.form_factor == FormFactor::Endless {
            return Err(EtiquetaError::InvalidInput(format!(
                "Label '{}' is endless tape; use LabelProfile::endless with a length",
                code
            )));
        }

        let (tape_mm, length_mm) = spec.tape_size_mm;
        Ok(Self {
            label_code: spec.code.to_string(),
            width_mm: length_mm as f32,
            height_mm: tape_mm as f32,
            ..Self::default()
        })
    }

    /// Profile for a piece of endless tape cut to `length_mm`.
    pub fn endless(code: &str, length_mm: f32) -> Result<Self> {
        let spec = LabelSpec::by_code(code)
            .filter(|s| s.form_factor == FormFactor::Endless)
            .ok_or_else(|| {
                EtiquetaError::InvalidInput(format!("'{}' is not an endless label code", code))
            })?;

        if length_mm <= 0.0 {
            return Err(EtiquetaError::InvalidInput(format!(
                "Label length must be positive, got {}mm",
                length_mm
            )));
        }

        Ok(Self {
            label_code: spec.code.to_string(),
            width_mm: length_mm,
            height_mm: spec.tape_size_mm.0 as f32,
            ..Self::default()
        })
    }

    /// Same label at a different resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi.max(1);
        self
    }

    /// Same label with a different barcode share, clamped to (0, 1].
    pub fn with_barcode_area_ratio(mut self, ratio: f32) -> Self {
        self.barcode_area_ratio = if ratio.is_finite() {
            ratio.clamp(0.01, 1.0)
        } else {
            DEFAULT_BARCODE_AREA_RATIO
        };
        self
    }

    /// Same label with a different side margin.
    pub fn with_side_margin_mm(mut self, mm: f32) -> Self {
        self.side_margin_mm = mm.max(0.0);
        self
    }

    pub fn label_code(&self) -> &str {
        &self.label_code
    }

    pub fn width_mm(&self) -> f32 {
        self.width_mm
    }

    pub fn height_mm(&self) -> f32 {
        self.height_mm
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn barcode_area_ratio(&self) -> f32 {
        self.barcode_area_ratio
    }

    /// Canvas size in pixels as `(width, height)`, both at least 1.
    pub fn canvas_size_px(&self) -> (u32, u32) {
        let width = round_px(self.width_mm, self.dpi);
        let height = round_px(self.height_mm, self.dpi);

        if self.dpi != LABEL_TABLE_DPI {
            return (width, height);
        }

        match LabelSpec::by_code(&self.label_code).map(|s| s.landscape_canvas()) {
            Some((Some(w), h)) => (w.max(1), h.max(1)),
            Some((None, h)) => (width, h.max(1)),
            None => (width, height),
        }
    }

    /// Side margin in pixels.
    pub fn side_margin_px(&self) -> u32 {
        mm_to_px(self.side_margin_mm, self.dpi).round().max(0.0) as u32
    }
}

fn round_px(mm: f32, dpi: u32) -> u32 {
    let px = mm_to_px(mm, dpi).round();
    if px.is_finite() && px >= 1.0 {
        px as u32
    } else {
        1
    }
}

impl Default for LabelProfile {
    /// The 54×17mm "17x54" address label at 300 DPI.
    fn default() -> Self {
        Self::from_mm(54.0, 17.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = LabelProfile::default();
        assert_eq!(profile.label_code(), "17x54");
        assert_eq!(profile.dpi(), 300);
        assert_eq!(profile.canvas_size_px(), (566, 165));
        assert_eq!(profile.side_margin_px(), 12);
    }

    #[test]
    fn test_code_is_height_first() {
        assert_eq!(LabelProfile::from_mm(87.0, 17.0).label_code(), "17x87");
        assert_eq!(LabelProfile::from_mm(29.4, 62.6).label_code(), "63x29");
    }

    #[test]
    fn test_unknown_code_uses_formula() {
        let profile = LabelProfile::from_mm(40.0, 20.0);
        // 40mm at 300 DPI = 472.4 dots, 20mm = 236.2 dots
        assert_eq!(profile.canvas_size_px(), (472, 236));
    }

    #[test]
    fn test_table_only_at_native_dpi() {
        let profile = LabelProfile::default().with_dpi(600);
        assert_eq!(profile.canvas_size_px(), (1276, 402));
    }

    #[test]
    fn test_canvas_never_zero() {
        let profile = LabelProfile::from_mm(0.0, 0.01);
        assert_eq!(profile.canvas_size_px(), (1, 1));
    }

    #[test]
    fn test_from_label_code() {
        let profile = LabelProfile::from_label_code("29x90").unwrap();
        assert_eq!(profile.label_code(), "29x90");
        assert_eq!(profile.canvas_size_px(), (991, 306));

        assert!(LabelProfile::from_label_code("62").is_err());
        assert!(LabelProfile::from_label_code("nope").is_err());
    }

    #[test]
    fn test_endless_profile() {
        let profile = LabelProfile::endless("62", 50.0).unwrap();
        assert_eq!(profile.label_code(), "62");
        // length from the formula, height from the printable tape width
        assert_eq!(profile.canvas_size_px(), (591, 696));

        assert!(LabelProfile::endless("17x54", 50.0).is_err());
        assert!(LabelProfile::endless("62", 0.0).is_err());
    }

    #[test]
    fn test_ratio_clamped() {
        let profile = LabelProfile::default().with_barcode_area_ratio(3.0);
        assert_eq!(profile.barcode_area_ratio(), 1.0);
        let profile = LabelProfile::default().with_barcode_area_ratio(f32::NAN);
        assert_eq!(profile.barcode_area_ratio(), DEFAULT_BARCODE_AREA_RATIO);
    }

    #[test]
    fn test_mm_px_round_trip() {
        for px in [1u32, 17, 100, 165, 566] {
            let mm = px_to_mm(px as f32, 300);
            assert_eq!(mm_to_px(mm, 300).round() as u32, px);
        }
    }
}
