//! # Error Types
//!
//! This module defines error types used throughout the etiqueta library.
//!
//! Errors fall into two groups:
//!
//! - **Request errors** ([`InvalidInput`](EtiquetaError::InvalidInput),
//!   [`MissingUpc`](EtiquetaError::MissingUpc),
//!   [`UnknownMode`](EtiquetaError::UnknownMode)): the caller must fix the request.
//! - **Print errors** ([`PrintFormat`](EtiquetaError::PrintFormat),
//!   [`PrinterUnreachable`](EtiquetaError::PrinterUnreachable),
//!   [`PrinterProtocol`](EtiquetaError::PrinterProtocol)): the label service
//!   downgrades these to a warning and still returns the rendered image.

use thiserror::Error;

/// Main error type for etiqueta operations
#[derive(Debug, Error)]
pub enum EtiquetaError {
    /// Empty barcode data, non-positive dimensions, unknown label code...
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// UPC label requested for a record without a UPC
    #[error("Cannot generate UPC barcode: item has no product or UPC")]
    MissingUpc,

    /// Label mode other than `upc` or `unique`
    #[error("Invalid barcode mode: {0}")]
    UnknownMode(String),

    /// Image does not match what the printer expects for the label
    #[error("Print format error: {0}")]
    PrintFormat(String),

    /// Connection refused, timed out, or no printer address available
    #[error("Printer unreachable: {0}")]
    PrinterUnreachable(String),

    /// Printer accepted the connection but rejected or failed the job
    #[error("Printer protocol error: {0}")]
    PrinterProtocol(String),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Bad configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EtiquetaError {
    /// Whether this error came from the print stage (transpile or transmit).
    ///
    /// The label service never propagates these: the label image has value
    /// on its own.
    pub fn is_print_failure(&self) -> bool {
        matches!(
            self,
            Self::PrintFormat(_) | Self::PrinterUnreachable(_) | Self::PrinterProtocol(_)
        )
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, EtiquetaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_failures() {
        assert!(EtiquetaError::PrintFormat("x".into()).is_print_failure());
        assert!(EtiquetaError::PrinterUnreachable("x".into()).is_print_failure());
        assert!(EtiquetaError::PrinterProtocol("x".into()).is_print_failure());
        assert!(!EtiquetaError::MissingUpc.is_print_failure());
        assert!(!EtiquetaError::InvalidInput("x".into()).is_print_failure());
    }

    #[test]
    fn test_display() {
        let err = EtiquetaError::UnknownMode("qr".into());
        assert_eq!(err.to_string(), "Invalid barcode mode: qr");
    }
}
