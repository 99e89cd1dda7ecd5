//! # Barcode Fitting
//!
//! Finds the widest barcode that fits a pixel budget without ever growing the
//! modules past their starting width.
//!
//! ## Algorithm
//!
//! ```text
//! height = module_height or target_height
//! module = initial
//! img = render(module, height)
//! while img.width > max_width and module > min:
//!     module = max(module * 0.9, min)
//!     img = render(module, height)
//! if img.height > target_height:
//!     img = nearest_neighbour_scale(img, target_height / img.height)
//! ```
//!
//! The search is shrink-only and bounded: it makes at most
//! `ceil(log(min / initial) / log(0.9))` re-renders. If the symbol still does
//! not fit at the minimum module width, the oversized image is returned; the
//! caller decides what to do with it.
//!
//! The final height clamp uses nearest-neighbour sampling. Any interpolating
//! filter would put gray pixels on the bar edges.

use image::imageops::{self, FilterType};
use tracing::debug;

use super::barcode::{self, BarcodeImage, DEFAULT_QUIET_ZONE_MM};
use crate::error::{EtiquetaError, Result};
use crate::label::profile::mm_to_px;

/// Multiplier applied to the module width on every shrink step
pub const SHRINK_FACTOR: f32 = 0.9;

/// Tunables for [`fit_to_width`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Module width of the first attempt
    pub initial_module_width_mm: f32,
    /// Smallest module width the search will try
    pub min_module_width_mm: f32,
    /// Quiet zone passed through to the renderer
    pub quiet_zone_mm: f32,
    /// Bar height to render at. `None` renders at the target height; taller
    /// bars are clamped down to it, shorter ones are kept.
    pub module_height_mm: Option<f32>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            initial_module_width_mm: 0.3,
            min_module_width_mm: 0.1,
            quiet_zone_mm: DEFAULT_QUIET_ZONE_MM,
            module_height_mm: None,
        }
    }
}

/// Result of a fit, with the search history.
#[derive(Debug, Clone)]
pub struct FitReport {
    pub image: BarcodeImage,
    /// Module width of the last render
    pub module_width_mm: f32,
    /// Image width of every render, in order
    pub attempt_widths: Vec<u32>,
    /// Whether the final clamp downscaled the height
    pub downscaled: bool,
}

impl FitReport {
    /// Whether the returned image fits the width budget.
    pub fn fits(&self, max_width_px: i64) -> bool {
        (self.image.width() as i64) <= max_width_px
    }
}

/// Render `data` as wide as possible within `max_width_px`.
///
/// ## Errors
///
/// [`EtiquetaError::InvalidInput`] when either budget is not positive, or
/// when `data` cannot be encoded.
///
/// ## Example
///
/// ```
/// use etiqueta::render::fit::{fit_to_width, FitOptions};
///
/// let img = fit_to_width("INV-7", 200, 100, 300, &FitOptions::default()).unwrap();
/// assert!(img.width() <= 200);
/// assert_eq!(img.height(), 100);
/// ```
pub fn fit_to_width(
    data: &str,
    max_width_px: i64,
    target_height_px: i64,
    dpi: u32,
    options: &FitOptions,
) -> Result<BarcodeImage> {
    fit_with_report(data, max_width_px, target_height_px, dpi, options).map(|r| r.image)
}

/// Same as [`fit_to_width`] but also returns the search history.
pub fn fit_with_report(
    data: &str,
    max_width_px: i64,
    target_height_px: i64,
    dpi: u32,
    options: &FitOptions,
) -> Result<FitReport> {
    if max_width_px <= 0 || target_height_px <= 0 {
        return Err(EtiquetaError::InvalidInput(format!(
            "Barcode budget must be positive, got {}x{}px",
            max_width_px, target_height_px
        )));
    }
    let target_height = u32::try_from(target_height_px).map_err(|_| {
        EtiquetaError::InvalidInput(format!("Target height {}px is too large", target_height_px))
    })?;
    if !(options.min_module_width_mm > 0.0 && options.initial_module_width_mm > 0.0) {
        return Err(EtiquetaError::InvalidInput(format!(
            "Module widths must be positive (initial {}mm, min {}mm)",
            options.initial_module_width_mm, options.min_module_width_mm
        )));
    }

    let render_height = match options.module_height_mm {
        Some(mm) if mm.is_finite() && mm > 0.0 => (mm_to_px(mm, dpi).round() as u32).max(1),
        Some(mm) => {
            return Err(EtiquetaError::InvalidInput(format!(
                "Module height must be positive, got {}mm",
                mm
            )));
        }
        None => target_height,
    };

    let mut module_width_mm = options.initial_module_width_mm;
    let mut img = barcode::render(data, module_width_mm, render_height, dpi, options.quiet_zone_mm)?;
    let mut attempt_widths = vec![img.width()];

    while img.width() as i64 > max_width_px && module_width_mm > options.min_module_width_mm {
        module_width_mm = (module_width_mm * SHRINK_FACTOR).max(options.min_module_width_mm);
        img = barcode::render(data, module_width_mm, render_height, dpi, options.quiet_zone_mm)?;
        attempt_widths.push(img.width());
    }

    if img.width() as i64 > max_width_px {
        debug!(
            data,
            width = img.width(),
            max_width_px,
            module_width_mm,
            "Barcode still wider than budget at minimum module width"
        );
    }

    let mut downscaled = false;
    if img.height() > target_height {
        let scale = target_height as f32 / img.height() as f32;
        let new_width = ((img.width() as f32 * scale).round() as u32).max(1);
        let scaled = imageops::resize(img.as_image(), new_width, target_height, FilterType::Nearest);
        img = BarcodeImage::new(scaled);
        downscaled = true;
    }

    debug!(
        data,
        module_width_mm,
        width = img.width(),
        height = img.height(),
        attempts = attempt_widths.len(),
        "Fitted barcode"
    );

    Ok(FitReport {
        image: img,
        module_width_mm,
        attempt_widths,
        downscaled,
    })
}

/// Upper bound on shrink steps for the given module range.
pub fn max_shrink_steps(initial_mm: f32, min_mm: f32) -> usize {
    if initial_mm <= min_mm {
        return 0;
    }
    ((min_mm / initial_mm).ln() / SHRINK_FACTOR.ln()).ceil() as usize
}
