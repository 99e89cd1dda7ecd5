//! # Thresholding and Dithering
//!
//! Converts a grayscale label into print-head dots. Label printers can only
//! burn a dot or leave the paper white, so every pixel must become one bit.
//!
//! ## Threshold Mode
//!
//! The threshold is given as a percentage (0-100) of darkness. It is mapped
//! to a level on the inverted (darkness) scale:
//!
//! ```text
//! level    = clamp(int((100 - threshold) / 100 * 255), 0, 255)
//! darkness = 255 - luma
//! print    = darkness >= level
//! ```
//!
//! At the default of 70% a pixel prints once it is about 30% dark.
//!
//! ## Floyd-Steinberg Mode
//!
//! Error diffusion for photographic content. Each pixel's quantisation error
//! is pushed to its unvisited neighbours:
//!
//! ```text
//!         │  X   │ 7/16
//! ────────┼──────┼──────
//!   3/16  │ 5/16 │ 1/16
//! ```
//!
//! Barcodes should not be dithered: they are already bilevel and error
//! diffusion can only blur bar edges.
//!
//! ## Usage Example
//!
//! ```
//! use etiqueta::render::dither;
//!
//! // Pack a row of boolean values into bytes
//! let row: Vec<bool> = vec![true, true, false, false, true, false, true, false];
//! let packed = dither::pack_row(&row);
//! assert_eq!(packed, vec![0b11001010]); // 0xCA
//! ```

use image::GrayImage;

/// How grayscale becomes dots
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binarization {
    /// Fixed threshold, percentage of darkness (0-100)
    Threshold(f32),
    /// Floyd-Steinberg error diffusion
    FloydSteinberg,
}

/// Map a darkness percentage to a level on the inverted 0-255 scale.
///
/// ## Example
///
/// ```
/// use etiqueta::render::dither::threshold_level;
///
/// assert_eq!(threshold_level(70.0), 76);
/// assert_eq!(threshold_level(0.0), 255);
/// assert_eq!(threshold_level(100.0), 0);
/// ```
pub fn threshold_level(threshold_percent: f32) -> u8 {
    let inverted = 100.0 - threshold_percent;
    let level = (inverted / 100.0 * 255.0) as i32;
    level.clamp(0, 255) as u8
}

/// Decide which pixels print using a fixed threshold.
///
/// Returns one `Vec<bool>` per row, true = black dot.
pub fn threshold(img: &GrayImage, threshold_percent: f32) -> Vec<Vec<bool>> {
    let level = threshold_level(threshold_percent);
    img.rows()
        .map(|row| row.map(|p| 255 - p[0] >= level).collect())
        .collect()
}

/// Decide which pixels print using Floyd-Steinberg error diffusion.
///
/// Returns one `Vec<bool>` per row, true = black dot.
pub fn floyd_steinberg(img: &GrayImage) -> Vec<Vec<bool>> {
    let width = img.width() as usize;
    let height = img.height() as usize;

    // Darkness values: 0.0 = white, 255.0 = black
    let mut buf: Vec<f32> = img.pixels().map(|p| 255.0 - p[0] as f32).collect();
    let mut rows = Vec::with_capacity(height);

    for y in 0..height {
        let mut row = Vec::with_capacity(width);
        for x in 0..width {
            let idx = y * width + x;
            let old = buf[idx];
            let on = old >= 128.0;
            let err = old - if on { 255.0 } else { 0.0 };
            row.push(on);

            if x + 1 < width {
                buf[idx + 1] += err * 7.0 / 16.0;
            }
            if y + 1 < height {
                if x > 0 {
                    buf[idx + width - 1] += err * 3.0 / 16.0;
                }
                buf[idx + width] += err * 5.0 / 16.0;
                if x + 1 < width {
                    buf[idx + width + 1] += err / 16.0;
                }
            }
        }
        rows.push(row);
    }

    rows
}

/// Binarize an image with the chosen method.
pub fn binarize(img: &GrayImage, method: Binarization) -> Vec<Vec<bool>> {
    match method {
        Binarization::Threshold(t) => threshold(img, t),
        Binarization::FloydSteinberg => floyd_steinberg(img),
    }
}

/// Pack a row of boolean pixel values into bytes.
///
/// Converts a slice of bool values (true = black, false = white) into
/// a byte array suitable for printer raster commands.
///
/// ## Bit Packing
///
/// - Bit 7 (MSB) = leftmost pixel
/// - Bit 0 (LSB) = rightmost pixel
/// - 1 = black (print dot), 0 = white (no dot)
///
/// ## Padding
///
/// If the row length is not a multiple of 8, the last byte is padded
/// with zeros (white) on the right.
///
/// ## Example
///
/// ```
/// use etiqueta::render::dither::pack_row;
///
/// // 12 pixels pack into 2 bytes (4 bits padding)
/// let row = vec![true; 12];
/// assert_eq!(pack_row(&row), vec![0xFF, 0xF0]); // 11111111 11110000
/// ```
pub fn pack_row(pixels: &[bool]) -> Vec<u8> {
    let num_bytes = pixels.len().div_ceil(8);
    let mut bytes = vec![0u8; num_bytes];

    for (i, &pixel) in pixels.iter().enumerate() {
        if pixel {
            let byte_idx = i / 8;
            let bit_idx = 7 - (i % 8); // MSB first
            bytes[byte_idx] |= 1 << bit_idx;
        }
    }

    bytes
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn gray(width: u32, height: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([value]))
    }

    #[test]
    fn test_threshold_level() {
        assert_eq!(threshold_level(70.0), 76);
        assert_eq!(threshold_level(50.0), 127);
        assert_eq!(threshold_level(-10.0), 255);
        assert_eq!(threshold_level(150.0), 0);
    }

    #[test]
    fn test_black_always_prints() {
        let rows = threshold(&gray(16, 4, 0), 70.0);
        assert!(rows.iter().flatten().all(|&b| b));
    }

    #[test]
    fn test_white_never_prints() {
        let rows = threshold(&gray(16, 4, 255), 70.0);
        assert!(rows.iter().flatten().all(|&b| !b));
    }

    #[test]
    fn test_light_gray_below_threshold() {
        // darkness 25 < level 76
        let rows = threshold(&gray(8, 1, 230), 70.0);
        assert!(rows[0].iter().all(|&b| !b));
        // darkness 100 >= 76
        let rows = threshold(&gray(8, 1, 155), 70.0);
        assert!(rows[0].iter().all(|&b| b));
    }

    #[test]
    fn test_floyd_steinberg_extremes() {
        assert!(floyd_steinberg(&gray(10, 10, 0)).iter().flatten().all(|&b| b));
        assert!(floyd_steinberg(&gray(10, 10, 255)).iter().flatten().all(|&b| !b));
    }

    #[test]
    fn test_floyd_steinberg_mid_gray() {
        let rows = floyd_steinberg(&gray(32, 32, 128));
        let count = rows.iter().flatten().filter(|&&b| b).count();
        // roughly half of 1024
        assert!(count > 400 && count < 624, "got {}", count);
    }

    #[test]
    fn test_binarize_shape() {
        let rows = binarize(&gray(13, 7, 0), Binarization::Threshold(70.0));
        assert_eq!(rows.len(), 7);
        assert!(rows.iter().all(|r| r.len() == 13));
    }

    #[test]
    fn test_pack_row_8_pixels() {
        assert_eq!(pack_row(&[true; 8]), vec![0xFF]);
        assert_eq!(pack_row(&[false; 8]), vec![0x00]);
        assert_eq!(
            pack_row(&[true, false, true, false, true, false, true, false]),
            vec![0xAA]
        );
    }

    #[test]
    fn test_pack_row_padding() {
        let packed = pack_row(&[true; 9]);
        assert_eq!(packed, vec![0xFF, 0x80]);
    }

    #[test]
    fn test_pack_row_empty() {
        assert_eq!(pack_row(&[]), Vec::<u8>::new());
    }
}
