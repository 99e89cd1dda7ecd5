//! # Configuration
//!
//! Process configuration, read once from `ETIQUETA_*` environment variables.
//!
//! | Variable | Type | Default |
//! |----------|------|---------|
//! | `ETIQUETA_DPI` | u32 (1-1200) | 300 |
//! | `ETIQUETA_PRINTER_HOST` | host or IP | unset |
//! | `ETIQUETA_PRINTER_PORT` | u16 | 9100 |
//! | `ETIQUETA_PRINTER_MODEL` | Brother model | `QL-810W` |
//! | `ETIQUETA_PRINTER_MAC` | MAC address | unset |
//! | `ETIQUETA_SWEEP_SUBNET` | `/24` prefix, e.g. `192.168.68` | unset |
//! | `ETIQUETA_LABEL` | label code | `17x54` |
//! | `ETIQUETA_LABEL_LENGTH` | f32 (mm, up to 1000, endless tape only) | 54 |
//! | `ETIQUETA_FONT_PATH` | TTF/OTF path | unset |
//! | `ETIQUETA_FONT_SIZE` | u32 (px, 1-512) | 14 |
//! | `ETIQUETA_PRINT_ENABLED` | bool | false |
//! | `ETIQUETA_THRESHOLD` | f32 (0-100) | 70 |
//!
//! Booleans accept `1/0`, `true/false`, `yes/no` and `on/off`. A value that
//! is set but does not parse is an error; empty values count as unset.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{EtiquetaError, Result};
use crate::label::LabelProfile;
use crate::label::profile::DEFAULT_DPI;
use crate::printer::{FormFactor, LabelSpec, PrinterModel};
use crate::protocol::convert::DEFAULT_THRESHOLD;
use crate::render::font::{DEFAULT_FONT_SIZE, FontConfig};
use crate::transport::DEFAULT_PORT;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "ETIQUETA_";

/// Endless labels are cut to the length of the standard address label
pub const DEFAULT_ENDLESS_LENGTH_MM: f32 = 54.0;

/// Highest accepted resolution; QL heads are 300 DPI, 600 in high-res mode
pub const MAX_DPI: u32 = 1200;

/// Largest caption size in pixels
pub const MAX_FONT_SIZE: u32 = 512;

/// Longest endless label the QL series cuts
pub const MAX_LABEL_LENGTH_MM: f32 = 1000.0;

/// Runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub dpi: u32,
    /// Static printer address, used when MAC discovery is off or fails
    pub printer_host: Option<String>,
    pub printer_port: u16,
    pub printer_model: String,
    /// Printer MAC for ARP discovery
    pub printer_mac: Option<String>,
    /// Subnet prefix swept when broadcast ping is unavailable
    pub sweep_subnet: Option<String>,
    /// Default label code
    pub label: String,
    /// Cut length for endless tape labels
    pub label_length_mm: f32,
    pub font_path: Option<PathBuf>,
    pub font_size: u32,
    /// Send labels to the printer (off = render only)
    pub print_enabled: bool,
    pub threshold: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            printer_host: None,
            printer_port: DEFAULT_PORT,
            printer_model: PrinterModel::QL_810W.name.to_string(),
            printer_mac: None,
            sweep_subnet: None,
            label: "17x54".to_string(),
            label_length_mm: DEFAULT_ENDLESS_LENGTH_MM,
            font_path: None,
            font_size: DEFAULT_FONT_SIZE as u32,
            print_enabled: false,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup (the environment, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, name))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let config = Self {
            dpi: parse_or(get("DPI"), "DPI", defaults.dpi)?,
            printer_host: get("PRINTER_HOST"),
            printer_port: parse_or(get("PRINTER_PORT"), "PRINTER_PORT", defaults.printer_port)?,
            printer_model: get("PRINTER_MODEL").unwrap_or(defaults.printer_model),
            printer_mac: get("PRINTER_MAC"),
            sweep_subnet: get("SWEEP_SUBNET"),
            label: get("LABEL").unwrap_or(defaults.label),
            label_length_mm: parse_or(get("LABEL_LENGTH"), "LABEL_LENGTH", defaults.label_length_mm)?,
            font_path: get("FONT_PATH").map(PathBuf::from),
            font_size: parse_or(get("FONT_SIZE"), "FONT_SIZE", defaults.font_size)?,
            print_enabled: match get("PRINT_ENABLED") {
                Some(v) => parse_bool(&v).ok_or_else(|| invalid("PRINT_ENABLED", &v))?,
                None => defaults.print_enabled,
            },
            threshold: parse_or(get("THRESHOLD"), "THRESHOLD", defaults.threshold)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but make no sense.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_DPI).contains(&self.dpi) {
            return Err(EtiquetaError::Config(format!(
                "ETIQUETA_DPI must be within 1-{}, got {}",
                MAX_DPI, self.dpi
            )));
        }
        if !(1..=MAX_FONT_SIZE).contains(&self.font_size) {
            return Err(EtiquetaError::Config(format!(
                "ETIQUETA_FONT_SIZE must be within 1-{}, got {}",
                MAX_FONT_SIZE, self.font_size
            )));
        }
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(EtiquetaError::Config(format!(
                "ETIQUETA_THRESHOLD must be within 0-100, got {}",
                self.threshold
            )));
        }
        if !(self.label_length_mm > 0.0 && self.label_length_mm <= MAX_LABEL_LENGTH_MM) {
            return Err(EtiquetaError::Config(format!(
                "ETIQUETA_LABEL_LENGTH must be within 0-{}mm, got {}",
                MAX_LABEL_LENGTH_MM,
                self.label_length_mm
            )));
        }
        if PrinterModel::by_name(&self.printer_model).is_none() {
            return Err(EtiquetaError::Config(format!(
                "Unknown printer model '{}'",
                self.printer_model
            )));
        }
        if LabelSpec::by_code(&self.label).is_none() {
            return Err(EtiquetaError::Config(format!(
                "Unknown label code '{}'",
                self.label
            )));
        }
        Ok(())
    }

    pub fn font_config(&self) -> FontConfig {
        FontConfig {
            path: self.font_path.clone(),
            size_px: self.font_size as f32,
        }
    }

    /// Profile for the configured label at the configured resolution.
    pub fn label_profile(&self) -> Result<LabelProfile> {
        let profile = match LabelSpec::by_code(&self.label) {
            Some(spec) if spec.form_factor == FormFactor::Endless => {
                LabelProfile::endless(&self.label, self.label_length_mm)?
            }
            _ => LabelProfile::from_label_code(&self.label)?,
        };
        Ok(profile.with_dpi(self.dpi))
    }
}

fn invalid(name: &str, value: &str) -> EtiquetaError {
    EtiquetaError::Config(format!("{}{}: invalid value '{}'", ENV_PREFIX, name, value))
}

fn parse_or<T: FromStr>(value: Option<String>, name: &str, default: T) -> Result<T> {
    match value {
        Some(v) => v.parse().map_err(|_| invalid(name, &v)),
        None => Ok(default),
    }
}

/// Parse a boolean flag.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
