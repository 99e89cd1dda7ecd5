//! # Label Pipeline Tests
//!
//! End-to-end checks of the public API: compose a label, fit barcodes, find
//! the printer by MAC, and print through the service with real and mocked
//! transports.
//!
//! All tests use the built-in bitmap caption font so output does not depend
//! on the fonts installed on the machine.

use etiqueta::item::{InventoryItem, Product};
use etiqueta::protocol::{PrintJob, transpile};
use etiqueta::render::fit::{FitOptions, fit_with_report};
use etiqueta::render::font::CaptionFont;
use etiqueta::transport::PrintTransport;
use etiqueta::transport::discovery::{self, NeighborTable};
use etiqueta::{
    Config, EtiquetaError, LabelComposer, LabelProfile, LabelService, PrintStatus,
    PrinterEndpoint, Result,
};
use pretty_assertions::assert_eq;
use std::io::{Read, Write};
use std::net::{Ipv4Addr, TcpListener};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

// ============================================================================
// HELPERS
// ============================================================================

const PRINTER_MAC: &str = "00:11:22:33:44:55";

const ARP_OUTPUT: &str = "\
? (192.168.1.1) at a4:2b:b0:12:34:56 [ether] on wlan0
? (192.168.1.50) at 00:11:22:33:44:55 [ether] on wlan0
? (192.168.1.77) at de:ad:be:ef:00:01 [ether] on wlan0
";

fn composer() -> LabelComposer {
    LabelComposer::with_font(CaptionFont::Bitmap, 14.0)
}

fn service(config: Config) -> LabelService {
    LabelService::new(config).with_composer(composer())
}

fn item() -> InventoryItem {
    InventoryItem {
        id: Some(739),
        product: Some(Product {
            name: "Spool PLA".into(),
            upc: Some("0123456789012".into()),
            sku: None,
        }),
        ..Default::default()
    }
}

/// ARP table with fixed contents
struct StaticTable(&'static str);

impl NeighborTable for StaticTable {
    fn populate(&self, _timeout: Duration) {}

    fn dump(&self, _timeout: Duration) -> Option<String> {
        Some(self.0.to_string())
    }
}

#[derive(Clone, Default)]
struct RecordingTransport {
    sent: Arc<Mutex<Vec<(PrinterEndpoint, Vec<u8>)>>>,
}

impl PrintTransport for RecordingTransport {
    fn transmit(&self, endpoint: &PrinterEndpoint, data: &[u8]) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((endpoint.clone(), data.to_vec()));
        Ok(())
    }
}

/// Status frame as sent by a Brother QL
fn status_frame(status_type: u8, err1: u8, err2: u8) -> [u8; 32] {
    let mut f = [0u8; 32];
    f[0] = 0x80;
    f[1] = 0x20;
    f[2] = b'B';
    f[8] = err1;
    f[9] = err2;
    f[18] = status_type;
    f
}

fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

// ============================================================================
// COMPOSITION
// ============================================================================

#[test]
fn test_default_label_layout() {
    let label = composer()
        .compose("INV-739", None, &LabelProfile::default())
        .unwrap();

    assert_eq!(label.size(), (566, 165));
    assert!(label.is_bilevel());

    // floor(165 * 0.7) rows of barcode, caption below
    let barcode_h = 115;
    assert!(label.has_ink(0, 0, 566, barcode_h), "barcode region is blank");
    assert!(
        label.has_ink(0, barcode_h, 566, 165 - barcode_h),
        "caption region is blank"
    );
}

#[test]
fn test_caption_defaults_to_data() {
    let profile = LabelProfile::default();
    let implicit = composer().compose("INV-739", None, &profile).unwrap();
    let explicit = composer()
        .compose("INV-739", Some("INV-739"), &profile)
        .unwrap();
    assert!(implicit.as_image() == explicit.as_image());
}

#[test]
fn test_compose_is_deterministic() {
    let profile = LabelProfile::default();
    let a = composer().compose("SHELF-4", Some("Shelf 4"), &profile).unwrap();
    let b = composer().compose("SHELF-4", Some("Shelf 4"), &profile).unwrap();
    assert!(a.as_image() == b.as_image());
}

#[test]
fn test_canvas_size_ignores_content() {
    let profile = LabelProfile::default();
    for data in ["A", "INV-739", "UPC-EXAMPLE-000000000001-WITH-A-VERY-LONG-TAIL"] {
        let label = composer()
            .compose(data, Some("a caption far too long to fit on a 54mm label"), &profile)
            .unwrap();
        assert_eq!(label.size(), profile.canvas_size_px(), "{}", data);
    }
}

#[test]
fn test_unencodable_data_is_rejected() {
    let profile = LabelProfile::default();
    for data in ["", "café"] {
        assert!(
            matches!(
                composer().compose(data, None, &profile),
                Err(EtiquetaError::InvalidInput(_))
            ),
            "{:?}",
            data
        );
    }
}

// ============================================================================
// FITTING
// ============================================================================

#[test]
fn test_fit_shrinks_toward_budget() {
    let options = FitOptions::default();
    let report = fit_with_report("UPC-EXAMPLE-000000000001", 200, 100, 300, &options).unwrap();

    assert!(
        report
            .attempt_widths
            .windows(2)
            .all(|w| w[1] <= w[0]),
        "widths grew: {:?}",
        report.attempt_widths
    );
    if report.image.width() > 200 {
        // Not achievable: the search must have gone all the way down
        assert_eq!(report.module_width_mm, options.min_module_width_mm);
        assert!(report.image.width() <= report.attempt_widths[0]);
    }
    assert_eq!(report.image.height(), 100);
}

#[test]
fn test_fit_rejects_empty_budget() {
    let options = FitOptions::default();
    for (w, h) in [(0, 100), (200, 0), (-5, 100)] {
        assert!(matches!(
            fit_with_report("INV-739", w, h, 300, &options),
            Err(EtiquetaError::InvalidInput(_))
        ));
    }
}

// ============================================================================
// DISCOVERY
// ============================================================================

#[test]
fn test_discover_by_mac_in_arp_table() {
    let ip = discovery::discover_by_mac_with(
        &StaticTable(ARP_OUTPUT),
        PRINTER_MAC,
        Duration::from_millis(100),
    );
    assert_eq!(ip, Some(Ipv4Addr::new(192, 168, 1, 50)));
}

#[test]
fn test_discover_by_mac_is_case_and_separator_insensitive() {
    let ip = discovery::discover_by_mac_with(
        &StaticTable(ARP_OUTPUT),
        "DE-AD-BE-EF-00-01",
        Duration::from_millis(100),
    );
    assert_eq!(ip, Some(Ipv4Addr::new(192, 168, 1, 77)));
}

#[test]
fn test_service_prints_to_discovered_address() {
    let transport = RecordingTransport::default();
    let config = Config {
        print_enabled: true,
        printer_mac: Some(PRINTER_MAC.into()),
        printer_host: Some("192.0.2.10".into()),
        ..Config::default()
    };
    let svc = service(config)
        .with_neighbor_table(StaticTable(ARP_OUTPUT))
        .with_transport(transport.clone());

    let out = svc.print(&item(), "unique", None).unwrap();
    assert_eq!(out.print, PrintStatus::Printed("192.168.1.50:9100".into()));
    assert_eq!(transport.sent.lock().unwrap()[0].0.host, "192.168.1.50");
}

#[test]
fn test_service_falls_back_to_host() {
    let transport = RecordingTransport::default();
    let config = Config {
        print_enabled: true,
        printer_mac: Some("AA:BB:CC:DD:EE:FF".into()),
        printer_host: Some("192.0.2.10".into()),
        ..Config::default()
    };
    let svc = service(config)
        .with_neighbor_table(StaticTable(ARP_OUTPUT))
        .with_transport(transport);

    let out = svc.print(&item(), "unique", None).unwrap();
    assert_eq!(out.print, PrintStatus::Printed("192.0.2.10:9100".into()));
}

// ============================================================================
// PRINTING
// ============================================================================

#[test]
fn test_refused_connection_still_returns_png() {
    let config = Config {
        print_enabled: true,
        printer_host: Some("127.0.0.1".into()),
        printer_port: unused_port(),
        ..Config::default()
    };

    let out = service(config).print(&item(), "upc", None).unwrap();
    assert!(
        matches!(out.print, PrintStatus::Failed(ref m) if m.contains("unreachable")),
        "{:?}",
        out.print
    );

    let png = out.to_png().unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (566, 165));
}

#[test]
fn test_request_errors_are_returned() {
    let svc = service(Config::default());
    assert!(matches!(
        svc.print(&item(), "qr", None),
        Err(EtiquetaError::UnknownMode(_))
    ));

    let bare = InventoryItem {
        id: Some(1),
        ..Default::default()
    };
    assert!(matches!(
        svc.print(&bare, "upc", None),
        Err(EtiquetaError::MissingUpc)
    ));
}

#[test]
fn test_instruction_stream_framing() {
    let label = composer()
        .compose("INV-739", None, &LabelProfile::default())
        .unwrap();
    let stream = transpile(&PrintJob::new(&label, "17x54"), "QL-810W").unwrap();

    // QL-800 series flush with 400 NULs, then ESC @
    assert!(stream[..400].iter().all(|&b| b == 0));
    assert_eq!(&stream[400..402], &[0x1B, 0x40]);
    assert_eq!(stream.last(), Some(&0x1A));

    // One uncompressed raster line per label row: g 00 90 + 90 bytes
    let rows = stream.windows(3).filter(|w| w == &[b'g', 0x00, 90]).count();
    assert!(rows >= 566, "found {} raster lines", rows);
}

#[test]
fn test_print_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let label = composer()
        .compose("INV-739", Some("INV-739"), &LabelProfile::default())
        .unwrap();
    let expected = transpile(&PrintJob::new(&label, "17x54"), "QL-810W").unwrap();
    let expected_len = expected.len();

    let server = thread::spawn(move || {
        let (mut conn, _) = listener.accept().unwrap();
        let mut received = vec![0u8; expected_len];
        conn.read_exact(&mut received).unwrap();
        conn.write_all(&status_frame(0x06, 0, 0)).unwrap();
        conn.write_all(&status_frame(0x01, 0, 0)).unwrap();
        received
    });

    let config = Config {
        print_enabled: true,
        printer_host: Some("127.0.0.1".into()),
        printer_port: port,
        ..Config::default()
    };
    let out = service(config).print(&item(), "unique", None).unwrap();
    let received = server.join().unwrap();

    assert_eq!(out.print, PrintStatus::Printed(format!("127.0.0.1:{}", port)));
    assert!(received == expected, "printer received a different stream");
}

#[test]
fn test_printer_error_frame_is_a_print_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let label = composer()
        .compose("INV-739", Some("INV-739"), &LabelProfile::default())
        .unwrap();
    let job_len = transpile(&PrintJob::new(&label, "17x54"), "QL-810W")
        .unwrap()
        .len();

    let server = thread::spawn(move || {
        let (mut conn, _) = listener.accept().unwrap();
        let mut received = vec![0u8; job_len];
        conn.read_exact(&mut received).unwrap();
        conn.write_all(&status_frame(0x02, 0x00, 0x10)).unwrap();
    });

    let config = Config {
        print_enabled: true,
        printer_host: Some("127.0.0.1".into()),
        printer_port: port,
        ..Config::default()
    };
    let out = service(config).print(&item(), "unique", None).unwrap();
    server.join().unwrap();

    assert!(
        matches!(out.print, PrintStatus::Failed(ref m) if m.contains("cover open")),
        "{:?}",
        out.print
    );
}
