//! # Raster Transpiler
//!
//! Turns a composed [`LabelImage`] into the complete Brother QL instruction
//! stream for one label.
//!
//! ## Pipeline
//!
//! ```text
//! LabelImage ─► rotate ─► check size ─► binarize ─► pad to head ─► mirror ─► pack
//!                                                                            │
//!   invalidate, ESC @, ESC i S, ESC i a, ESC i z, ESC i M/A, ESC i K,        │
//!   ESC i d, M n  ◄──────────────────── header ─────────────────────────────┘
//!   g 00 n ... × rows, SUB
//! ```
//!
//! ## Orientation
//!
//! Labels are composed landscape (566×165 for "17x54") but the head prints
//! across the tape, so die-cut images arrive transposed. With
//! [`Rotation::Auto`] an image whose size is the transposed printable area is
//! turned 90° counter-clockwise. Explicit angles are always counter-clockwise.
//!
//! ## Head Placement
//!
//! ```text
//! ├────────────────── head_width_dots (720) ──────────────────┤
//! │      white       │     image      │ right margin + offset │
//! └──────────────────┴────────────────┴───────────────────────┘
//!                        then mirrored into head order
//! ```

use std::fmt;
use std::str::FromStr;

use image::{GrayImage, imageops};
use tracing::debug;

use super::commands;
use super::raster::{self, Plane};
use crate::error::{EtiquetaError, Result};
use crate::label::LabelImage;
use crate::printer::{FormFactor, LabelSpec, PrinterModel};
use crate::render::dither::{self, Binarization};

/// Default darkness threshold in percent
pub const DEFAULT_THRESHOLD: f32 = 70.0;

/// Image rotation before printing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    /// Turn die-cut images 90° when they arrive transposed
    #[default]
    Auto,
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl FromStr for Rotation {
    type Err = EtiquetaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Rotation::Auto),
            "0" => Ok(Rotation::Deg0),
            "90" => Ok(Rotation::Deg90),
            "180" => Ok(Rotation::Deg180),
            "270" => Ok(Rotation::Deg270),
            other => Err(EtiquetaError::InvalidInput(format!(
                "Unknown rotation '{}'. Use auto, 0, 90, 180 or 270",
                other
            ))),
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rotation::Auto => "auto",
            Rotation::Deg0 => "0",
            Rotation::Deg90 => "90",
            Rotation::Deg180 => "180",
            Rotation::Deg270 => "270",
        };
        f.write_str(s)
    }
}

impl Rotation {
    /// Rotate counter-clockwise by the explicit angle. `Auto` and `Deg0` copy.
    fn apply(self, img: &GrayImage) -> GrayImage {
        match self {
            Rotation::Auto | Rotation::Deg0 => img.clone(),
            Rotation::Deg90 => imageops::rotate270(img),
            Rotation::Deg180 => imageops::rotate180(img),
            Rotation::Deg270 => imageops::rotate90(img),
        }
    }
}

/// One label to print, with its conversion options.
#[derive(Debug, Clone)]
pub struct PrintJob<'a> {
    pub image: &'a LabelImage,
    pub label_code: &'a str,
    pub rotate: Rotation,
    /// Darkness percentage (0-100) above which a pixel prints
    pub threshold: f32,
    /// Floyd-Steinberg instead of a fixed threshold
    pub dither: bool,
    /// PackBits-compress raster rows (ignored if the model can't)
    pub compress: bool,
    /// Two-colour black/red printing
    pub red: bool,
    pub high_quality: bool,
    pub cut: bool,
}

impl<'a> PrintJob<'a> {
    /// A job with the defaults used for inventory labels: auto rotation,
    /// 70% threshold, no dithering, no compression, black only, high
    /// quality, cut after the label.
    pub fn new(image: &'a LabelImage, label_code: &'a str) -> Self {
        Self {
            image,
            label_code,
            rotate: Rotation::Auto,
            threshold: DEFAULT_THRESHOLD,
            dither: false,
            compress: false,
            red: false,
            high_quality: true,
            cut: true,
        }
    }

    fn binarization(&self) -> Binarization {
        if self.dither {
            Binarization::FloydSteinberg
        } else {
            Binarization::Threshold(self.threshold)
        }
    }
}

/// Transpile a job for the model with the given name.
///
/// ## Errors
///
/// `PrintFormat` for an unknown model, plus everything
/// [`transpile_for_model`] rejects.
pub fn transpile(job: &PrintJob<'_>, model_name: &str) -> Result<Vec<u8>> {
    let model = PrinterModel::by_name(model_name).ok_or_else(|| {
        EtiquetaError::PrintFormat(format!("Unknown printer model '{}'", model_name))
    })?;
    transpile_for_model(job, &model)
}

/// Transpile a job into a Brother QL instruction stream.
///
/// ## Errors
///
/// `PrintFormat` when:
/// - the label code is unknown, or the label needs a wide printer
/// - red printing is requested without two-colour support
/// - the (rotated) image does not match the label's printable dots
/// - an endless label is shorter or longer than the model allows
///
/// ## Example
///
/// ```
/// use etiqueta::label::{LabelComposer, LabelProfile};
/// use etiqueta::printer::PrinterModel;
/// use etiqueta::protocol::convert::{PrintJob, transpile_for_model};
/// use etiqueta::render::font::CaptionFont;
///
/// let label = LabelComposer::with_font(CaptionFont::Bitmap, 14.0)
///     .compose("INV-739", None, &LabelProfile::default())
///     .unwrap();
/// let job = PrintJob::new(&label, "17x54");
/// let stream = transpile_for_model(&job, &PrinterModel::QL_810W).unwrap();
/// assert_eq!(stream.last(), Some(&0x1A));
/// ```
pub fn transpile_for_model(job: &PrintJob<'_>, model: &PrinterModel) -> Result<Vec<u8>> {
    let label = LabelSpec::by_code(job.label_code).ok_or_else(|| {
        EtiquetaError::PrintFormat(format!("Unknown label code '{}'", job.label_code))
    })?;

    if label.wide_only && !model.is_wide() {
        return Err(EtiquetaError::PrintFormat(format!(
            "Label {} needs a 102mm printer, {} is too narrow",
            label.code, model.name
        )));
    }
    if job.red && !(model.two_color && label.red) {
        return Err(EtiquetaError::PrintFormat(format!(
            "Red printing needs a two-colour model and black/red media ({} on {})",
            model.name, label.code
        )));
    }

    let img = orient(job.image.as_image(), &label, job.rotate)?;
    let (img_w, rows) = img.dimensions();

    if !label.form_factor.has_fixed_length()
        && !(model.min_length_dots..=model.max_length_dots).contains(&rows)
    {
        return Err(EtiquetaError::PrintFormat(format!(
            "Label length {} dots outside {}..={} for {}",
            rows, model.min_length_dots, model.max_length_dots, model.name
        )));
    }

    let head_w = model.head_width_dots();
    let right = label.right_margin_dots + model.additional_offset_r as u32;
    let left = head_w.checked_sub(img_w + right).ok_or_else(|| {
        EtiquetaError::PrintFormat(format!(
            "Image width {} plus margin {} exceeds the {}-dot head",
            img_w, right, head_w
        ))
    })?;

    let dots = dither::binarize(&img, job.binarization());
    let compress = job.compress && model.compression;

    let mut out = Vec::with_capacity(model.invalidate_bytes + 64 + rows as usize * (head_w as usize / 8 + 3));

    out.extend(commands::invalidate(model.invalidate_bytes));
    out.extend(commands::init());
    out.extend(commands::status_request());
    if model.mode_setting {
        out.extend(commands::switch_to_raster());
    }

    let (tape_w, tape_len) = label.tape_size_mm;
    let media_len = if label.form_factor == FormFactor::Endless {
        0
    } else {
        tape_len
    };
    out.extend(commands::media_and_quality(
        label.form_factor.media_type(),
        tape_w,
        media_len,
        rows,
        job.high_quality,
    ));

    if job.cut && model.cutting {
        out.extend(commands::autocut(true));
        out.extend(commands::cut_every(1));
    }
    if model.expanded_mode {
        out.extend(commands::expanded_mode(job.cut, false, job.red));
    }
    out.extend(commands::margins(label.feed_margin));
    if model.compression {
        out.extend(commands::compression(compress));
    }

    let blank_row = vec![0u8; head_w as usize / 8];
    for row in &dots {
        let packed = head_row(row, head_w, left);
        if job.red {
            out.extend(raster::two_color_line(Plane::Black, &packed, compress));
            out.extend(raster::two_color_line(Plane::Red, &blank_row, compress));
        } else {
            out.extend(raster::raster_line(&packed, compress));
        }
    }

    out.extend(commands::print(true));

    debug!(
        model = model.name,
        label = label.code,
        rotate = %job.rotate,
        rows,
        compress,
        bytes = out.len(),
        "Transpiled label"
    );

    Ok(out)
}

/// Rotate the image and check it against the label's printable area.
fn orient(img: &GrayImage, label: &LabelSpec, rotate: Rotation) -> Result<GrayImage> {
    let (expected_w, expected_len) = label.expected_dots();

    match expected_len {
        Some(expected_h) => {
            let rotated = if rotate == Rotation::Auto
                && img.dimensions() == (expected_h, expected_w)
                && expected_h != expected_w
            {
                imageops::rotate270(img)
            } else {
                rotate.apply(img)
            };
            if rotated.dimensions() != (expected_w, expected_h) {
                return Err(EtiquetaError::PrintFormat(format!(
                    "Bad image dimensions: {}x{}. Expecting: {}x{}",
                    rotated.width(),
                    rotated.height(),
                    expected_w,
                    expected_h
                )));
            }
            Ok(rotated)
        }
        None => {
            let rotated = rotate.apply(img);
            if rotated.width() != expected_w {
                return Err(EtiquetaError::PrintFormat(format!(
                    "Bad image width: {}. Endless label {} needs exactly {}",
                    rotated.width(),
                    label.code,
                    expected_w
                )));
            }
            Ok(rotated)
        }
    }
}

/// Place one image row on the head at `left`, mirror it, and pack it.
fn head_row(row: &[bool], head_w: u32, left: u32) -> Vec<u8> {
    let mut head = vec![false; head_w as usize];
    head[left as usize..left as usize + row.len()].copy_from_slice(row);
    head.reverse();
    dither::pack_row(&head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::barcode::{BLACK, WHITE};
    use image::Luma;
    use pretty_assertions::assert_eq;

    fn blank(w: u32, h: u32) -> LabelImage {
        LabelImage::new(GrayImage::from_pixel(w, h, Luma([WHITE])))
    }

    /// Header length for QL-810W, 17x54, cut, no compression support toggle
    fn header_len(model: &PrinterModel) -> usize {
        model.invalidate_bytes + 2 + 3 + 4 + 13 + 4 + 4 + 4 + 5 + 2
    }

    #[test]
    fn test_rotation_from_str() {
        assert_eq!("auto".parse::<Rotation>().unwrap(), Rotation::Auto);
        assert_eq!("90".parse::<Rotation>().unwrap(), Rotation::Deg90);
        assert_eq!(" AUTO ".parse::<Rotation>().unwrap(), Rotation::Auto);
        assert!("45".parse::<Rotation>().is_err());
        assert_eq!(Rotation::Deg270.to_string(), "270");
    }

    #[test]
    fn test_die_cut_stream_layout() {
        let label = blank(566, 165);
        let job = PrintJob::new(&label, "17x54");
        let model = PrinterModel::QL_810W;
        let out = transpile_for_model(&job, &model).unwrap();

        let header = header_len(&model);
        assert_eq!(out.len(), header + 566 * (3 + 90) + 1);
        assert!(out[..400].iter().all(|&b| b == 0));
        assert_eq!(&out[400..402], &[0x1B, 0x40]);
        assert_eq!(&out[402..405], &[0x1B, 0x69, 0x53]);
        assert_eq!(&out[405..409], &[0x1B, 0x69, 0x61, 0x01]);
        assert_eq!(&out[409..416], &[0x1B, 0x69, 0x7A, 0xCE, 0x0B, 17, 54]);
        assert_eq!(&out[416..420], &566u32.to_le_bytes());
        assert_eq!(&out[header - 2..header], &[b'M', 0x00]);
        assert_eq!(&out[header..header + 3], &[b'g', 0x00, 90]);
        assert_eq!(out.last(), Some(&0x1A));
    }

    #[test]
    fn test_black_pixel_lands_mirrored() {
        // After auto-rotation the image is 165 wide; pixel (0,0) of the
        // rotated image sits at head column 720-165 = 555, mirrored to 164.
        let mut raw = GrayImage::from_pixel(165, 566, Luma([WHITE]));
        raw.put_pixel(0, 0, Luma([BLACK]));
        let label = LabelImage::new(raw);
        let job = PrintJob::new(&label, "17x54");
        let out = transpile_for_model(&job, &PrinterModel::QL_810W).unwrap();

        let first_row = header_len(&PrinterModel::QL_810W) + 3;
        let row = &out[first_row..first_row + 90];
        let expected_col = 720 - 1 - 555;
        for (i, &byte) in row.iter().enumerate() {
            if i == expected_col / 8 {
                assert_eq!(byte, 0x80 >> (expected_col % 8));
            } else {
                assert_eq!(byte, 0, "byte {}", i);
            }
        }
    }

    #[test]
    fn test_bad_dimensions() {
        let label = blank(500, 165);
        let job = PrintJob::new(&label, "17x54");
        let err = transpile_for_model(&job, &PrinterModel::QL_810W).unwrap_err();
        assert!(matches!(err, EtiquetaError::PrintFormat(ref m) if m.contains("Bad image dimensions")));
    }

    #[test]
    fn test_explicit_zero_skips_auto_rotation() {
        let label = blank(566, 165);
        let job = PrintJob {
            rotate: Rotation::Deg0,
            ..PrintJob::new(&label, "17x54")
        };
        assert!(transpile_for_model(&job, &PrinterModel::QL_810W).is_err());
    }

    #[test]
    fn test_unknown_label_and_model() {
        let label = blank(566, 165);
        let job = PrintJob::new(&label, "99x99");
        assert!(matches!(
            transpile_for_model(&job, &PrinterModel::QL_810W),
            Err(EtiquetaError::PrintFormat(_))
        ));

        let job = PrintJob::new(&label, "17x54");
        assert!(matches!(transpile(&job, "QL-9000"), Err(EtiquetaError::PrintFormat(_))));
    }

    #[test]
    fn test_red_requires_support() {
        let label = blank(696, 300);
        let job = PrintJob {
            red: true,
            ..PrintJob::new(&label, "62")
        };
        assert!(transpile_for_model(&job, &PrinterModel::QL_810W).is_err());

        let job = PrintJob {
            red: true,
            ..PrintJob::new(&label, "62red")
        };
        assert!(transpile_for_model(&job, &PrinterModel::QL_700).is_err());
        let out = transpile_for_model(&job, &PrinterModel::QL_810W).unwrap();
        assert!(out.windows(3).any(|w| w == [b'w', 0x02, 90]));
    }

    #[test]
    fn test_endless_width_and_length() {
        let label = blank(696, 300);
        let job = PrintJob::new(&label, "62");
        let out = transpile_for_model(&job, &PrinterModel::QL_810W).unwrap();
        // endless: media type 0x0A, no length
        let z = out.windows(3).position(|w| w == [0x1B, 0x69, 0x7A]).unwrap();
        assert_eq!(&out[z + 4..z + 7], &[0x0A, 62, 0]);
        // feed margin 35
        assert!(out.windows(5).any(|w| w == [0x1B, 0x69, 0x64, 35, 0]));

        let narrow = blank(600, 300);
        assert!(transpile_for_model(&PrintJob::new(&narrow, "62"), &PrinterModel::QL_810W).is_err());

        let short = blank(696, 20);
        assert!(transpile_for_model(&PrintJob::new(&short, "62"), &PrinterModel::QL_810W).is_err());
    }

    #[test]
    fn test_compression_shrinks_blank_rows() {
        let label = blank(566, 165);
        let job = PrintJob {
            compress: true,
            ..PrintJob::new(&label, "17x54")
        };
        let out = transpile_for_model(&job, &PrinterModel::QL_810W).unwrap();
        assert!(out.windows(2).any(|w| w == [b'M', 0x02]));
        assert!(out.windows(5).any(|w| w == [b'g', 0x00, 2, 0xA7, 0x00]));

        // QL-700 cannot compress: rows stay raw and no M command is sent
        let out = transpile_for_model(&job, &PrinterModel::QL_700).unwrap();
        assert!(out.windows(3).any(|w| w == [b'g', 0x00, 90]));
    }

    #[test]
    fn test_model_without_mode_setting() {
        let label = blank(566, 165);
        let job = PrintJob::new(&label, "17x54");
        let out = transpile_for_model(&job, &PrinterModel::QL_500).unwrap();
        assert!(!out.windows(4).any(|w| w == [0x1B, 0x69, 0x61, 0x01]));
        assert!(!out.windows(3).any(|w| w == [0x1B, 0x69, 0x4D]));
    }

    #[test]
    fn test_wide_only_label() {
        let label = blank(532, 1164);
        let job = PrintJob::new(&label, "102x51");
        assert!(transpile_for_model(&job, &PrinterModel::QL_810W).is_err());
        let out = transpile_for_model(&job, &PrinterModel::QL_1110NWB).unwrap();
        assert!(out.windows(3).any(|w| w == [b'g', 0x00, 162]));
    }
}
