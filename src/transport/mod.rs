//! # Printer Transport Layer
//!
//! This module delivers instruction streams to printers and finds them on
//! the network.
//!
//! ## Available Transports
//!
//! - [`network`]: Raw TCP (port 9100) for Wi-Fi and Ethernet Brother QL printers
//!
//! ## Discovery
//!
//! - [`discovery`]: Resolve a printer's IPv4 address from its MAC via the ARP table

use std::fmt;

use crate::error::Result;

pub mod discovery;
pub mod network;

pub use discovery::{NeighborTable, SystemNeighborTable, discover_by_mac, discover_by_mac_with};
pub use network::NetworkTransport;

/// Raw printing port used by Brother network printers
pub const DEFAULT_PORT: u16 = 9100;

/// Where to send a job, resolved per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterEndpoint {
    pub host: String,
    pub port: u16,
    /// Brother model name, e.g. "QL-810W"
    pub model: String,
}

impl PrinterEndpoint {
    pub fn new(host: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            model: model.into(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// `host:port`, the key transmissions are serialised on
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for PrinterEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.model, self.address())
    }
}

/// Sends a finished instruction stream to a printer.
///
/// Implemented by [`NetworkTransport`]; tests substitute recording mocks.
pub trait PrintTransport: Send + Sync {
    /// Deliver `data` to the printer in one connection.
    ///
    /// ## Errors
    ///
    /// `PrinterUnreachable` when no connection can be made, `PrinterProtocol`
    /// when the printer reports an error or the write is cut short.
    fn transmit(&self, endpoint: &PrinterEndpoint, data: &[u8]) -> Result<()>;
}

impl<T: PrintTransport + ?Sized> PrintTransport for Box<T> {
    fn transmit(&self, endpoint: &PrinterEndpoint, data: &[u8]) -> Result<()> {
        (**self).transmit(endpoint, data)
    }
}
