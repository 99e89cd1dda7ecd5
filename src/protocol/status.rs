//! # Brother QL Status Frames
//!
//! After `ESC i S`, and on its own while printing, the printer sends fixed
//! 32-byte frames:
//!
//! | Byte | Meaning |
//! |------|---------|
//! | 0    | print head mark, always `0x80` |
//! | 1    | size, `0x20` |
//! | 2    | Brother code, `'B'` |
//! | 8    | error information 1 |
//! | 9    | error information 2 |
//! | 10   | media width (mm) |
//! | 11   | media type |
//! | 17   | media length (mm) |
//! | 18   | status type |
//! | 19   | phase type |

use std::fmt;

use crate::error::{EtiquetaError, Result};

/// Length of every status frame
pub const STATUS_FRAME_LEN: usize = 32;

const ERROR_1: &[(u8, &str)] = &[
    (0x01, "no media"),
    (0x02, "end of media"),
    (0x04, "cutter jam"),
    (0x10, "unit in use"),
    (0x20, "printer turned off"),
    (0x80, "fan doesn't work"),
];

const ERROR_2: &[(u8, &str)] = &[
    (0x01, "replace media"),
    (0x02, "expansion buffer full"),
    (0x04, "communication error"),
    (0x08, "communication buffer full"),
    (0x10, "cover open"),
    (0x20, "cancel key"),
    (0x40, "media cannot be fed"),
    (0x80, "system error"),
];

/// What the frame is reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusType {
    Reply,
    PrintingCompleted,
    ErrorOccurred,
    ExitIfMode,
    TurnedOff,
    Notification,
    PhaseChange,
    Unknown(u8),
}

impl From<u8> for StatusType {
    fn from(value: u8) -> Self {
        match value {
            0x00 => StatusType::Reply,
            0x01 => StatusType::PrintingCompleted,
            0x02 => StatusType::ErrorOccurred,
            0x04 => StatusType::ExitIfMode,
            0x05 => StatusType::TurnedOff,
            0x06 => StatusType::Notification,
            0x07 => StatusType::PhaseChange,
            other => StatusType::Unknown(other),
        }
    }
}

/// A decoded status frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterStatus {
    pub status_type: StatusType,
    pub error_1: u8,
    pub error_2: u8,
    pub media_width_mm: u8,
    pub media_length_mm: u8,
    pub media_type: u8,
}

impl PrinterStatus {
    /// Decode one 32-byte frame.
    ///
    /// ## Example
    ///
    /// ```
    /// use etiqueta::protocol::status::{PrinterStatus, StatusType};
    ///
    /// let mut frame = [0u8; 32];
    /// frame[0] = 0x80;
    /// frame[1] = 0x20;
    /// frame[2] = b'B';
    /// frame[18] = 0x01;
    /// let status = PrinterStatus::parse(&frame).unwrap();
    /// assert_eq!(status.status_type, StatusType::PrintingCompleted);
    /// assert!(!status.is_error());
    /// ```
    pub fn parse(frame: &[u8]) -> Result<Self> {
        if frame.len() != STATUS_FRAME_LEN {
            return Err(EtiquetaError::PrinterProtocol(format!(
                "status frame must be {} bytes, got {}",
                STATUS_FRAME_LEN,
                frame.len()
            )));
        }
        if frame[0] != 0x80 || frame[2] != b'B' {
            return Err(EtiquetaError::PrinterProtocol(format!(
                "not a status frame (header {:02X} {:02X} {:02X})",
                frame[0], frame[1], frame[2]
            )));
        }

        Ok(Self {
            status_type: StatusType::from(frame[18]),
            error_1: frame[8],
            error_2: frame[9],
            media_width_mm: frame[10],
            media_length_mm: frame[17],
            media_type: frame[11],
        })
    }

    /// Names of all error bits set in the frame
    pub fn errors(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        for &(bit, name) in ERROR_1 {
            if self.error_1 & bit != 0 {
                names.push(name);
            }
        }
        for &(bit, name) in ERROR_2 {
            if self.error_2 & bit != 0 {
                names.push(name);
            }
        }
        names
    }

    pub fn is_error(&self) -> bool {
        self.status_type == StatusType::ErrorOccurred || self.error_1 != 0 || self.error_2 != 0
    }

    /// `Err(PrinterProtocol)` naming the errors, if the frame reports any.
    pub fn check(&self) -> Result<()> {
        if self.is_error() {
            Err(EtiquetaError::PrinterProtocol(self.to_string()))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self.errors();
        if errors.is_empty() {
            write!(f, "{:?}", self.status_type)
        } else {
            write!(f, "{:?}: {}", self.status_type, errors.join(", "))
        }
    }
}

/// Split a byte stream into whole frames, ignoring a trailing partial one.
pub fn parse_frames(data: &[u8]) -> Result<Vec<PrinterStatus>> {
    data.chunks_exact(STATUS_FRAME_LEN)
        .map(PrinterStatus::parse)
        .collect()
}
