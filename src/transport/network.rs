//! # Network Transport
//!
//! Raw TCP printing on port 9100, the way Brother's own network backend
//! talks to QL printers.
//!
//! ## Session
//!
//! ```text
//! connect (2s) ─► write stream (2s) ─► flush ─► read status frames ─► close
//! ```
//!
//! The printer answers the `ESC i S` in the stream header with a status
//! frame, and sends more while printing. Reading stops at EOF, at the read
//! timeout, or as soon as a frame reports completion or an error.
//!
//! ## Serialisation
//!
//! Two jobs for the same `host:port` never interleave on the wire: each
//! transmission holds a process-wide lock for that endpoint.

use std::collections::HashMap;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use super::{PrintTransport, PrinterEndpoint};
use crate::error::{EtiquetaError, Result};
use crate::protocol::status::{PrinterStatus, STATUS_FRAME_LEN, StatusType};

/// Default connect, write and read timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// TCP transport for Brother QL network printers.
#[derive(Debug, Clone)]
pub struct NetworkTransport {
    connect_timeout: Duration,
    write_timeout: Duration,
    read_timeout: Duration,
}

impl NetworkTransport {
    pub fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_TIMEOUT,
            write_timeout: DEFAULT_TIMEOUT,
            read_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// How long to wait for status frames after the job is written
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    fn connect(&self, address: &str) -> Result<TcpStream> {
        let addrs: Vec<SocketAddr> = address
            .to_socket_addrs()
            .map_err(|e| EtiquetaError::PrinterUnreachable(format!("{}: {}", address, e)))?
            .collect();

        let mut last_err = None;
        for addr in &addrs {
            match TcpStream::connect_timeout(addr, self.connect_timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }

        Err(EtiquetaError::PrinterUnreachable(match last_err {
            Some(e) if e.kind() == ErrorKind::TimedOut => {
                format!("Connection timeout: {}", address)
            }
            Some(e) => format!("{}: {}", address, e),
            None => format!("{}: no addresses resolved", address),
        }))
    }
}

impl Default for NetworkTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl PrintTransport for NetworkTransport {
    #[instrument(skip(self, data), fields(addr = %endpoint.address(), data_len = data.len()))]
    fn transmit(&self, endpoint: &PrinterEndpoint, data: &[u8]) -> Result<()> {
        let address = endpoint.address();
        let lock = endpoint_lock(&address);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        info!("Connecting to printer");
        let mut stream = self.connect(&address)?;
        stream
            .set_write_timeout(Some(self.write_timeout))
            .and_then(|()| stream.set_read_timeout(Some(self.read_timeout)))
            .map_err(|e| EtiquetaError::PrinterUnreachable(format!("{}: {}", address, e)))?;

        info!("Connected, sending {} bytes", data.len());
        stream.write_all(data).map_err(write_error)?;
        stream.flush().map_err(write_error)?;

        for status in read_status(&mut stream) {
            debug!(status = %status, "Printer status");
            status.check()?;
        }

        info!("Print job sent successfully");
        Ok(())
    }
}

fn write_error(e: io::Error) -> EtiquetaError {
    match e.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => {
            EtiquetaError::PrinterUnreachable(format!("Write timeout: {}", e))
        }
        ErrorKind::WriteZero => EtiquetaError::PrinterProtocol(format!("Short write: {}", e)),
        _ => EtiquetaError::PrinterProtocol(format!("Write failed: {}", e)),
    }
}

/// Collect status frames until EOF, timeout, or a final frame.
///
/// Bytes that do not form a valid frame are logged and dropped.
fn read_status(stream: &mut impl Read) -> Vec<PrinterStatus> {
    let mut frames = Vec::new();
    let mut pending = Vec::with_capacity(STATUS_FRAME_LEN);
    let mut buf = [0u8; 256];

    loop {
        let n = match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => break,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "Reading printer status failed");
                break;
            }
        };
        pending.extend_from_slice(&buf[..n]);

        let mut finished = false;
        while pending.len() >= STATUS_FRAME_LEN {
            let frame: Vec<u8> = pending.drain(..STATUS_FRAME_LEN).collect();
            match PrinterStatus::parse(&frame) {
                Ok(status) => {
                    finished |= matches!(
                        status.status_type,
                        StatusType::PrintingCompleted | StatusType::ErrorOccurred
                    ) || status.is_error();
                    frames.push(status);
                }
                Err(e) => debug!(error = %e, "Ignoring unexpected printer bytes"),
            }
        }
        if finished {
            break;
        }
    }

    frames
}

/// Lock serialising writes to one `host:port`.
fn endpoint_lock(address: &str) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<Mutex<HashMap<String, Arc<Mutex<()>>>>> = OnceLock::new();

    let mut locks = LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(address.to_string()).or_default())
}
