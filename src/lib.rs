//! # Etiqueta - Barcode Label Library
//!
//! Etiqueta renders Code128 barcode labels for an inventory app and prints
//! them on Brother QL label printers over the network. It provides:
//!
//! - **Rendering**: Code128 barcodes shrunk to fit the label, with a caption
//! - **Protocol implementation**: Brother QL raster command builders
//! - **Transport**: Raw TCP (port 9100) and ARP-based printer discovery
//! - **Service**: The single "print a label for this record" entry point
//!
//! ## Quick Start
//!
//! ```no_run
//! use etiqueta::{
//!     Config, LabelService, PrintStatus,
//!     item::InventoryItem,
//! };
//!
//! // ETIQUETA_PRINTER_HOST, ETIQUETA_PRINT_ENABLED, ...
//! let service = LabelService::new(Config::from_env()?);
//!
//! let item = InventoryItem {
//!     id: Some(739),
//!     ..Default::default()
//! };
//!
//! // Render (and print, if enabled) the label encoding "INV-739"
//! let output = service.print(&item, "unique", None)?;
//! std::fs::write("label.png", output.to_png()?)?;
//!
//! if let PrintStatus::Failed(reason) = &output.print {
//!     eprintln!("Label rendered but not printed: {}", reason);
//! }
//!
//! # Ok::<(), etiqueta::EtiquetaError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`service`] | Mode resolution, compose, optional print |
//! | [`label`] | Label geometry and composition |
//! | [`render`] | Barcode, fitting, caption fonts, binarisation |
//! | [`protocol`] | Brother QL raster command builders |
//! | [`transport`] | TCP transport and MAC discovery |
//! | [`printer`] | Printer models and label media |
//! | [`item`] | Records a label can be printed for |
//! | [`config`] | Environment configuration |
//! | [`error`] | Error types |
//!
//! ## Supported Printers
//!
//! Currently tested with:
//! - Brother QL-810W (62mm, 300 DPI, Wi-Fi) with DK-11204 17x54 labels
//!
//! The rest of the QL-500 to QL-1110NWB range uses the same raster protocol
//! and is described in [`printer::models`].

pub mod config;
pub mod error;
pub mod item;
pub mod label;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod service;
pub mod transport;

// Re-exports for convenience
pub use config::Config;
pub use error::{EtiquetaError, Result};
pub use label::{LabelComposer, LabelImage, LabelProfile};
pub use printer::{LabelSpec, PrinterModel};
pub use service::{LabelMode, LabelOutput, LabelService, PrintStatus};
pub use transport::{NetworkTransport, PrinterEndpoint};
