//! # Etiqueta CLI
//!
//! Command-line interface for inventory barcode labels.
//!
//! ## Usage
//!
//! ```bash
//! # Render a label to PNG
//! etiqueta render INV-739 --png label.png
//!
//! # Render for another die-cut label, or an arbitrary size in mm
//! etiqueta render INV-739 --label 29x90
//! etiqueta render INV-739 --size 40x20
//!
//! # Print to a Brother QL on the network
//! etiqueta print INV-739 --host 192.168.68.20
//!
//! # Print a label for an inventory record
//! etiqueta item item.json --mode upc
//!
//! # Find the printer by MAC address
//! etiqueta discover AA:BB:CC:DD:EE:FF
//!
//! # List supported labels and printers
//! etiqueta labels
//! etiqueta models
//! ```
//!
//! Configuration comes from `ETIQUETA_*` environment variables; flags
//! override it. Log verbosity follows `RUST_LOG` (default `etiqueta=info`).

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

use etiqueta::{
    Config, EtiquetaError, LabelImage, LabelProfile, LabelService, PrintStatus,
    item::InventoryItem,
    printer::{PrinterModel, labels::LABELS},
    protocol::{PrintJob, Rotation, transpile},
    service::rotation_for,
    transport::{NetworkTransport, PrintTransport, discovery},
};

/// Etiqueta - Barcode label printer utility
#[derive(Parser, Debug)]
#[command(name = "etiqueta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a barcode label to PNG
    Render {
        /// Data to encode (Code128, printable ASCII)
        data: String,

        /// Caption under the barcode (defaults to the data)
        #[arg(long)]
        caption: Option<String>,

        /// Label code, e.g. 17x54 (defaults to ETIQUETA_LABEL)
        #[arg(long, conflicts_with = "size")]
        label: Option<String>,

        /// Arbitrary label size in mm, as WIDTHxHEIGHT
        #[arg(long, value_name = "WxH")]
        size: Option<String>,

        /// Output file
        #[arg(long, value_name = "FILE", default_value = "label.png")]
        png: PathBuf,
    },

    /// Render a barcode label and send it to the printer
    Print {
        /// Data to encode (Code128, printable ASCII)
        data: String,

        /// Caption under the barcode (defaults to the data)
        #[arg(long)]
        caption: Option<String>,

        /// Label code, e.g. 17x54 (defaults to ETIQUETA_LABEL)
        #[arg(long)]
        label: Option<String>,

        /// Printer host or IP (skips MAC discovery)
        #[arg(long)]
        host: Option<String>,

        /// Printer port
        #[arg(long)]
        port: Option<u16>,

        /// Printer model, e.g. QL-810W
        #[arg(long)]
        model: Option<String>,

        /// Darkness threshold in percent
        #[arg(long)]
        threshold: Option<f32>,

        /// Rotation: auto, 0, 90, 180 or 270 (counter-clockwise)
        #[arg(long, default_value = "auto")]
        rotate: Rotation,

        /// Floyd-Steinberg dithering instead of a fixed threshold
        #[arg(long)]
        dither: bool,

        /// PackBits-compress raster lines
        #[arg(long)]
        compress: bool,

        /// Two-colour printing on black/red media
        #[arg(long)]
        red: bool,

        /// Also save the label as PNG
        #[arg(long, value_name = "FILE")]
        png: Option<PathBuf>,
    },

    /// Render (and, if enabled, print) the label for an inventory record
    Item {
        /// JSON file with the record
        file: PathBuf,

        /// Barcode mode: upc or unique
        #[arg(long, default_value = "unique")]
        mode: String,

        /// Output file
        #[arg(long, value_name = "FILE", default_value = "label.png")]
        png: PathBuf,
    },

    /// Look up a printer's IP address by MAC
    Discover {
        /// MAC address (AA:BB:CC:DD:EE:FF or AA-BB-CC-DD-EE-FF)
        mac: String,

        /// Timeout per lookup command in seconds
        #[arg(long, default_value = "2")]
        timeout: u64,
    },

    /// List supported label types
    Labels,

    /// List supported printer models
    Models,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "etiqueta=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), EtiquetaError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            data,
            caption,
            label,
            size,
            png,
        } => {
            let config = Config::from_env()?;
            let profile = match size {
                Some(size) => parse_size(&size)?.with_dpi(config.dpi),
                None => profile_for(&config, label)?,
            };

            let service = LabelService::new(config);
            let image = service
                .composer()
                .compose(&data, caption.as_deref(), &profile)?;
            save_png(&png, &image)?;
            println!(
                "Saved {} label ({}x{}) to {}",
                profile.label_code(),
                image.width(),
                image.height(),
                png.display()
            );
        }

        Commands::Print {
            data,
            caption,
            label,
            host,
            port,
            model,
            threshold,
            rotate,
            dither,
            compress,
            red,
            png,
        } => {
            let mut config = Config::from_env()?;
            if let Some(host) = host {
                config.printer_host = Some(host);
                config.printer_mac = None;
            }
            if let Some(port) = port {
                config.printer_port = port;
            }
            if let Some(model) = model {
                config.printer_model = model;
            }
            config.threshold = threshold.unwrap_or(config.threshold);
            let profile = profile_for(&config, label)?;

            let service = LabelService::new(config);
            let image = service
                .composer()
                .compose(&data, caption.as_deref(), &profile)?;
            if let Some(path) = &png {
                save_png(path, &image)?;
                println!("Saved to {}", path.display());
            }

            let rotate = match rotate {
                Rotation::Auto => rotation_for(profile.label_code()),
                explicit => explicit,
            };
            let job = PrintJob {
                rotate,
                threshold: service.config().threshold,
                dither,
                compress,
                red,
                ..PrintJob::new(&image, profile.label_code())
            };
            let stream = transpile(&job, &service.config().printer_model)?;
            let endpoint = service.resolve_endpoint()?;

            println!("Printing {} on {}...", data, endpoint);
            NetworkTransport::new().transmit(&endpoint, &stream)?;
            println!("Printed successfully!");
        }

        Commands::Item { file, mode, png } => {
            let json = std::fs::read_to_string(&file)?;
            let item = InventoryItem::from_json(&json)?;

            let service = LabelService::new(Config::from_env()?);
            let output = service.print(&item, &mode, None)?;
            save_png(&png, &output.image)?;
            println!("Saved to {}", png.display());

            match output.print {
                PrintStatus::Disabled => {
                    println!("Printing disabled (set ETIQUETA_PRINT_ENABLED=1 to print)")
                }
                PrintStatus::Printed(address) => println!("Printed on {}", address),
                PrintStatus::Failed(message) => eprintln!("Print failed: {}", message),
            }
        }

        Commands::Discover { mac, timeout } => {
            let config = Config::from_env()?;
            let table = discovery::SystemNeighborTable::new(config.sweep_subnet);
            match discovery::discover_by_mac_with(&table, &mac, Duration::from_secs(timeout)) {
                Some(ip) => println!("{}", ip),
                None => {
                    return Err(EtiquetaError::PrinterUnreachable(format!(
                        "No device found with MAC address {}",
                        mac
                    )));
                }
            }
        }

        Commands::Labels => {
            println!("{:<8} {:<10} {:>10} {:>14}", "CODE", "KIND", "SIZE (mm)", "PRINTABLE");
            for label in LABELS {
                let (w, len) = label.dots_printable;
                let size = if len == 0 {
                    format!("{}", label.tape_size_mm.0)
                } else {
                    format!("{}x{}", label.tape_size_mm.0, label.tape_size_mm.1)
                };
                let printable = if label.form_factor.has_fixed_length() {
                    format!("{}x{}", w, len)
                } else {
                    format!("{} wide", w)
                };
                println!(
                    "{:<8} {:<10} {:>10} {:>14}",
                    label.code,
                    format!("{:?}", label.form_factor),
                    size,
                    printable
                );
            }
        }

        Commands::Models => {
            println!("{:<12} {:>6} {:>7} {:>9} {:>6}", "MODEL", "DOTS", "CUTTER", "COMPRESS", "RED");
            for model in PrinterModel::ALL {
                println!(
                    "{:<12} {:>6} {:>7} {:>9} {:>6}",
                    model.name,
                    model.head_width_dots(),
                    yes_no(model.cutting),
                    yes_no(model.compression),
                    yes_no(model.two_color)
                );
            }
        }
    }

    Ok(())
}

/// Profile for a label code, falling back to the configured label.
fn profile_for(config: &Config, label: Option<String>) -> Result<LabelProfile, EtiquetaError> {
    match label {
        Some(label) => Config {
            label,
            ..config.clone()
        }
        .label_profile(),
        None => config.label_profile(),
    }
}

/// Parse "WIDTHxHEIGHT" in millimetres.
fn parse_size(size: &str) -> Result<LabelProfile, EtiquetaError> {
    let invalid = || EtiquetaError::InvalidInput(format!("Bad size '{}', expected e.g. 54x17", size));

    let (w, h) = size.split_once(['x', 'X']).ok_or_else(invalid)?;
    let w: f32 = w.trim().parse().map_err(|_| invalid())?;
    let h: f32 = h.trim().parse().map_err(|_| invalid())?;
    if !(w > 0.0 && h > 0.0) {
        return Err(invalid());
    }
    Ok(LabelProfile::from_mm(w, h))
}

/// Save a label image as PNG
fn save_png(path: &Path, image: &LabelImage) -> Result<(), EtiquetaError> {
    std::fs::write(path, image.to_png()?)?;
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
