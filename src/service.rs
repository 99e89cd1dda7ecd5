//! # Label Service
//!
//! The one entry point the inventory app calls: pick the identifier for the
//! requested mode, compose the label, and print it if printing is enabled.
//!
//! ## Flow
//!
//! ```text
//! Idle ─► Resolving(mode) ─► Composing ─┬─ printing disabled ──────────────► Done
//!                                       └─ enabled ─► Transmitting ─► Done
//! ```
//!
//! Request errors (unknown mode, missing UPC, unencodable data) are returned
//! as `Err`. Print errors are not: the composed image is useful on its own,
//! so they are logged and reported in [`LabelOutput::print`]. Nothing is
//! retried here.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{EtiquetaError, Result};
use crate::item::IdentifierSource;
use crate::label::{LabelComposer, LabelImage, LabelProfile};
use crate::printer::{FormFactor, LabelSpec};
use crate::protocol::convert::{PrintJob, Rotation, transpile};
use crate::transport::discovery::{self, NeighborTable, SystemNeighborTable};
use crate::transport::{NetworkTransport, PrintTransport, PrinterEndpoint};

/// What the barcode encodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMode {
    /// The product's retail UPC
    Upc,
    /// The item's own inventory code
    Unique,
}

impl FromStr for LabelMode {
    type Err = EtiquetaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "upc" => Ok(LabelMode::Upc),
            "unique" => Ok(LabelMode::Unique),
            other => Err(EtiquetaError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for LabelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LabelMode::Upc => "upc",
            LabelMode::Unique => "unique",
        })
    }
}

/// Outcome of the print stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintStatus {
    /// Printing is switched off; the label was only rendered
    Disabled,
    /// Sent to the printer at this address
    Printed(String),
    /// Printing failed; the label was still rendered
    Failed(String),
}

/// A rendered label and what happened when printing it.
#[derive(Debug, Clone)]
pub struct LabelOutput {
    pub image: LabelImage,
    pub print: PrintStatus,
}

impl LabelOutput {
    /// The label as PNG bytes (`image/png`).
    pub fn to_png(&self) -> Result<Vec<u8>> {
        self.image.to_png()
    }
}

/// Composes and prints inventory labels.
pub struct LabelService {
    config: Config,
    composer: LabelComposer,
    transport: Box<dyn PrintTransport>,
    neighbors: Box<dyn NeighborTable + Send + Sync>,
}

impl LabelService {
    /// Create a service with the network transport and the system ARP table.
    pub fn new(config: Config) -> Self {
        let composer = LabelComposer::new(&config.font_config());
        let neighbors = SystemNeighborTable::new(config.sweep_subnet.clone());
        Self {
            config,
            composer,
            transport: Box::new(NetworkTransport::new()),
            neighbors: Box::new(neighbors),
        }
    }

    pub fn with_transport<T: PrintTransport + 'static>(mut self, transport: T) -> Self {
        self.transport = Box::new(transport);
        self
    }

    pub fn with_neighbor_table<N: NeighborTable + Send + Sync + 'static>(mut self, table: N) -> Self {
        self.neighbors = Box::new(table);
        self
    }

    pub fn with_composer(mut self, composer: LabelComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn composer(&self) -> &LabelComposer {
        &self.composer
    }

    /// Render a label for `source` and print it if printing is enabled.
    ///
    /// `profile` defaults to the configured label.
    ///
    /// ## Errors
    ///
    /// - `UnknownMode` for a mode other than `upc` or `unique`
    /// - `MissingUpc` for `upc` on a record without one
    /// - `InvalidInput` if the identifier cannot be encoded
    ///
    /// Print failures are never returned; see [`PrintStatus::Failed`].
    pub fn print(
        &self,
        source: &dyn IdentifierSource,
        mode: &str,
        profile: Option<&LabelProfile>,
    ) -> Result<LabelOutput> {
        let mode: LabelMode = mode.parse()?;
        let (data, caption) = label_text(source, mode)?;
        debug!(%mode, %data, %caption, "Resolved label text");

        let profile = match profile {
            Some(p) => p.clone(),
            None => self.config.label_profile()?,
        };
        let image = self.composer.compose(&data, Some(&caption), &profile)?;

        let print = if self.config.print_enabled {
            match self.print_image(&image, profile.label_code()) {
                Ok(endpoint) => {
                    info!(%mode, %data, printer = %endpoint, "Printed label");
                    PrintStatus::Printed(endpoint.address())
                }
                Err(e) if e.is_print_failure() => {
                    warn!(%mode, %data, error = %e, "Printing failed, returning image anyway");
                    PrintStatus::Failed(e.to_string())
                }
                Err(e) => {
                    error!(%mode, %data, error = %e, "Unexpected error while printing");
                    PrintStatus::Failed(e.to_string())
                }
            }
        } else {
            info!(%mode, %data, "[test mode] Skipping actual label print");
            PrintStatus::Disabled
        };

        Ok(LabelOutput { image, print })
    }

    /// Transpile a composed label with the configured options and send it.
    pub fn print_image(&self, image: &LabelImage, label_code: &str) -> Result<PrinterEndpoint> {
        let job = PrintJob {
            rotate: rotation_for(label_code),
            threshold: self.config.threshold,
            ..PrintJob::new(image, label_code)
        };
        let data = transpile(&job, &self.config.printer_model)?;

        let endpoint = self.resolve_endpoint()?;
        self.transport.transmit(&endpoint, &data)?;
        Ok(endpoint)
    }

    /// Where to print: the address found by MAC lookup, else the static host.
    pub fn resolve_endpoint(&self) -> Result<PrinterEndpoint> {
        let discovered = self.config.printer_mac.as_deref().and_then(|mac| {
            let ip =
                discovery::discover_by_mac_with(&*self.neighbors, mac, discovery::DEFAULT_TIMEOUT);
            if ip.is_none() && self.config.printer_host.is_some() {
                warn!(mac, "MAC lookup failed, falling back to configured host");
            }
            ip
        });

        let host = discovered
            .map(|ip| ip.to_string())
            .or_else(|| self.config.printer_host.clone())
            .ok_or_else(|| {
                EtiquetaError::PrinterUnreachable(
                    "No printer address: set ETIQUETA_PRINTER_HOST or ETIQUETA_PRINTER_MAC".into(),
                )
            })?;

        Ok(PrinterEndpoint::new(host, self.config.printer_model.clone())
            .with_port(self.config.printer_port))
    }
}

impl fmt::Debug for LabelService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelService")
            .field("config", &self.config)
            .field("composer", &self.composer)
            .finish_non_exhaustive()
    }
}

/// Barcode data and caption for a record.
///
/// ## Example
///
/// ```
/// use etiqueta::item::{InventoryItem, Product};
/// use etiqueta::service::{LabelMode, label_text};
///
/// let item = InventoryItem {
///     id: Some(739),
///     product: Some(Product { name: "Spool PLA".into(), upc: Some("0123456".into()), sku: None }),
///     ..Default::default()
/// };
/// let (data, caption) = label_text(&item, LabelMode::Upc).unwrap();
/// assert_eq!(data, "0123456");
/// assert_eq!(caption, "Spool PLA | 0123456");
/// ```
pub fn label_text(source: &dyn IdentifierSource, mode: LabelMode) -> Result<(String, String)> {
    match mode {
        LabelMode::Upc => {
            let upc = source
                .upc()
                .filter(|u| !u.trim().is_empty())
                .ok_or(EtiquetaError::MissingUpc)?;
            let caption = match source.display_name() {
                Some(name) => format!("{} | {}", name, upc),
                None => upc.clone(),
            };
            Ok((upc, caption))
        }
        LabelMode::Unique => {
            let code = source.unique_code();
            Ok((code.clone(), code))
        }
    }
}

/// Rotation for a label: endless tape is composed landscape and printed
/// turned a quarter, die-cut labels rotate automatically.
pub fn rotation_for(label_code: &str) -> Rotation {
    match LabelSpec::by_code(label_code) {
        Some(spec) if spec.form_factor == FormFactor::Endless => Rotation::Deg90,
        _ => Rotation::Auto,
    }
}
