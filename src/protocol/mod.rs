//! # Brother QL Raster Protocol
//!
//! Command builders and the raster transpiler for Brother QL label printers.
//!
//! ## Module Structure
//!
//! - [`commands`]: Session and page setup commands (invalidate, init, media, cut)
//! - [`raster`]: Raster line commands and PackBits compression
//! - [`status`]: 32-byte status frame decoding
//! - [`convert`]: Full label image to instruction stream conversion
//!
//! ## Usage Example
//!
//! ```
//! use etiqueta::protocol::{commands, raster};
//!
//! // Build a tiny one-row print sequence by hand
//! let mut data = Vec::new();
//! data.extend(commands::invalidate(200));
//! data.extend(commands::init());
//! data.extend(commands::media_and_quality(0x0A, 62, 0, 1, true));
//! data.extend(commands::margins(35));
//! data.extend(raster::raster_line(&[0u8; 90], false));
//! data.extend(commands::print(true));
//!
//! assert_eq!(data.last(), Some(&0x1A));
//! ```
//!
//! ## Protocol Reference
//!
//! Brother "Raster Command Reference" (QL-800/810W/820NWB, QL-1100/1110NWB).

pub mod commands;
pub mod convert;
pub mod raster;
pub mod status;

pub use convert::{PrintJob, Rotation, transpile, transpile_for_model};
pub use status::PrinterStatus;
