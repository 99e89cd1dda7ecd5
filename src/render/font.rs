//! # Caption Fonts
//!
//! Resolves the font used for label captions and rasterises text with it.
//!
//! ## Resolution Order
//!
//! | # | Source | Found when |
//! |---|--------|-----------|
//! | 1 | [`FontSource::Configured`] | the configured path parses as a TTF/OTF font |
//! | 2 | [`FontSource::System`] | one of the common system font paths parses |
//! | 3 | [`FontSource::BuiltinBitmap`] | always (Spleen 12x24, scaled) |
//!
//! Each source reports [`FontLookup::Found`] or [`FontLookup::NotFound`];
//! resolution walks the list and takes the first hit, so it cannot fail.
//! Reaching the bitmap font is logged as a warning because captions get
//! noticeably harder to read.
//!
//! Outline fonts are rendered with `ab_glyph` and binarised at 50% coverage;
//! labels are bilevel end to end.

use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, ScaleFont};
use spleen_font::{FONT_12X24, PSF2Font};
use tracing::{debug, warn};

/// Default caption height in pixels
pub const DEFAULT_FONT_SIZE: f32 = 14.0;

/// Fonts commonly present on Linux, macOS and Windows hosts
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Spleen cell size
const BITMAP_CELL: (usize, usize) = (12, 24);

/// Smallest height the bitmap font is scaled to
const BITMAP_MIN_HEIGHT: usize = 12;

/// Font settings for captions
#[derive(Debug, Clone, PartialEq)]
pub struct FontConfig {
    /// Explicit font file, tried first
    pub path: Option<PathBuf>,
    /// Caption height in pixels
    pub size_px: f32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: None,
            size_px: DEFAULT_FONT_SIZE,
        }
    }
}

/// One place a caption font may come from
#[derive(Debug, Clone, PartialEq)]
pub enum FontSource {
    Configured(PathBuf),
    System(Vec<PathBuf>),
    BuiltinBitmap,
}

/// Outcome of trying one [`FontSource`]
pub enum FontLookup {
    Found(CaptionFont),
    NotFound,
}

/// A loaded caption font
#[derive(Clone)]
pub enum CaptionFont {
    /// TTF/OTF outline font and the file it came from
    Outline { font: FontArc, origin: PathBuf },
    /// Built-in Spleen bitmap font
    Bitmap,
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outline { origin, .. } => f.debug_tuple("Outline").field(origin).finish(),
            Self::Bitmap => f.write_str("Bitmap"),
        }
    }
}

/// Rendered caption as a 1-bit mask.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMask {
    pub width: usize,
    pub height: usize,
    /// Row-major, true = black
    pub data: Vec<bool>,
}

impl TextMask {
    fn blank(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![false; width * height],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x]
    }

    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&b| b)
    }
}

impl FontSource {
    /// Try to load this source.
    pub fn load(&self) -> FontLookup {
        match self {
            Self::Configured(path) => load_outline(path),
            Self::System(candidates) => candidates
                .iter()
                .map(|p| load_outline(p))
                .find(|l| matches!(l, FontLookup::Found(_)))
                .unwrap_or(FontLookup::NotFound),
            Self::BuiltinBitmap => FontLookup::Found(CaptionFont::Bitmap),
        }
    }
}

fn load_outline(path: &Path) -> FontLookup {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Font not readable");
            return FontLookup::NotFound;
        }
    };

    match FontArc::try_from_vec(bytes) {
        Ok(font) => FontLookup::Found(CaptionFont::Outline {
            font,
            origin: path.to_path_buf(),
        }),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Not a usable font file");
            FontLookup::NotFound
        }
    }
}

/// The ordered list of sources for a configuration.
pub fn font_chain(config: &FontConfig) -> Vec<FontSource> {
    let mut chain = Vec::with_capacity(3);
    if let Some(path) = &config.path {
        chain.push(FontSource::Configured(path.clone()));
    }
    chain.push(FontSource::System(
        SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
    ));
    chain.push(FontSource::BuiltinBitmap);
    chain
}

/// Walk a source list and return the first font found.
///
/// Falls back to the bitmap font if the list is exhausted.
pub fn resolve_from(chain: &[FontSource]) -> CaptionFont {
    for source in chain {
        if let FontLookup::Found(font) = source.load() {
            match &font {
                CaptionFont::Outline { origin, .. } => {
                    debug!(path = %origin.display(), "Using caption font")
                }
                CaptionFont::Bitmap => {
                    warn!("No TrueType font available, using built-in bitmap font for captions")
                }
            }
            return font;
        }
        if let FontSource::Configured(path) = source {
            warn!(path = %path.display(), "Configured caption font could not be loaded");
        }
    }

    warn!("Font chain exhausted, using built-in bitmap font for captions");
    CaptionFont::Bitmap
}

/// Resolve the caption font for a configuration.
pub fn resolve_font(config: &FontConfig) -> CaptionFont {
    resolve_from(&font_chain(config))
}

impl CaptionFont {
    pub fn is_bitmap(&self) -> bool {
        matches!(self, Self::Bitmap)
    }

    /// Rasterise a single line of text at `size_px`.
    pub fn render(&self, text: &str, size_px: f32) -> TextMask {
        match self {
            Self::Outline { font, .. } => render_outline(font, text, size_px),
            Self::Bitmap => render_bitmap(text, size_px),
        }
    }
}

fn render_outline(font: &FontArc, text: &str, pixel_height: f32) -> TextMask {
    let pixel_height = if pixel_height.is_finite() && pixel_height >= 1.0 {
        pixel_height
    } else {
        DEFAULT_FONT_SIZE
    };
    let scaled = font.as_scaled(pixel_height);

    let mut glyphs = Vec::new();
    let mut caret_x = 0.0f32;
    let mut previous = None;
    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = previous {
            caret_x += scaled.kern(prev, glyph_id);
        }
        glyphs.push((glyph_id, caret_x));
        caret_x += scaled.h_advance(glyph_id);
        previous = Some(glyph_id);
    }

    let width = (caret_x.ceil() as usize).max(1);
    let ascent = scaled.ascent();
    let height = ((ascent - scaled.descent()).ceil() as usize).max(1);

    let mut coverage = vec![0.0f32; width * height];
    for &(glyph_id, glyph_x) in &glyphs {
        let glyph =
            glyph_id.with_scale_and_position(pixel_height, ab_glyph::point(glyph_x, ascent));

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, c| {
                let x = px as i32 + bounds.min.x as i32;
                let y = py as i32 + bounds.min.y as i32;
                if x >= 0 && x < width as i32 && y >= 0 && y < height as i32 {
                    let idx = y as usize * width + x as usize;
                    coverage[idx] = (coverage[idx] + c).min(1.0);
                }
            });
        }
    }

    TextMask {
        width,
        height,
        data: coverage.into_iter().map(|c| c >= 0.5).collect(),
    }
}

fn render_bitmap(text: &str, size_px: f32) -> TextMask {
    let (src_w, src_h) = BITMAP_CELL;
    let cell_h = if size_px.is_finite() {
        (size_px.round() as usize).max(BITMAP_MIN_HEIGHT)
    } else {
        src_h
    };
    let cell_w = (cell_h * src_w / src_h).max(1);

    let count = text.chars().count();
    let mut mask = TextMask::blank((cell_w * count).max(1), cell_h);

    let mut spleen = match PSF2Font::new(FONT_12X24) {
        Ok(font) => font,
        Err(_) => {
            warn!("Built-in bitmap font failed to parse, drawing glyph boxes");
            for i in 0..count {
                draw_box(&mut mask, i * cell_w, cell_w, cell_h);
            }
            return mask;
        }
    };

    for (i, ch) in text.chars().enumerate() {
        let mut src = vec![false; src_w * src_h];
        let utf8 = ch.to_string();
        match spleen.glyph_for_utf8(utf8.as_bytes()) {
            Some(glyph) => {
                for (row_y, row) in glyph.enumerate() {
                    for (col_x, on) in row.enumerate() {
                        if row_y < src_h && col_x < src_w {
                            src[row_y * src_w + col_x] = on;
                        }
                    }
                }
            }
            None => {
                draw_box(&mut mask, i * cell_w, cell_w, cell_h);
                continue;
            }
        }

        // nearest neighbour from the 12x24 cell to the target cell
        let x0 = i * cell_w;
        for dy in 0..cell_h {
            for dx in 0..cell_w {
                let sx = dx * src_w / cell_w;
                let sy = dy * src_h / cell_h;
                if src[sy * src_w + sx] {
                    mask.data[dy * mask.width + x0 + dx] = true;
                }
            }
        }
    }

    mask
}

/// Outline box for characters the bitmap font lacks.
fn draw_box(mask: &mut TextMask, x0: usize, w: usize, h: usize) {
    let stride = mask.width;
    for x in x0..x0 + w {
        mask.data[x] = true;
        mask.data[(h - 1) * stride + x] = true;
    }
    for y in 0..h {
        mask.data[y * stride + x0] = true;
        mask.data[y * stride + x0 + w - 1] = true;
    }
}
