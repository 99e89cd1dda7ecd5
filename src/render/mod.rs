//! # Rendering Module
//!
//! Bitmap building blocks for labels.
//!
//! ## Modules
//!
//! - [`barcode`]: Code 128 symbol rendering
//! - [`fit`]: Shrink-to-fit search for the module width
//! - [`font`]: Caption font resolution and text rasterisation
//! - [`dither`]: Threshold and Floyd-Steinberg binarisation, row packing
//!
//! ## Usage Example
//!
//! ```
//! use etiqueta::render::fit::{FitOptions, fit_to_width};
//!
//! // Widest symbol within 546px, 115px tall, at 300 DPI
//! let barcode = fit_to_width("INV-739", 546, 115, 300, &FitOptions::default()).unwrap();
//! assert!(barcode.width() <= 546);
//! assert_eq!(barcode.height(), 115);
//! ```

pub mod barcode;
pub mod dither;
pub mod fit;
pub mod font;
