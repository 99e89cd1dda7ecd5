//! # Printer Module
//!
//! This module provides the Brother QL hardware catalogue.
//!
//! ## Modules
//!
//! - [`models`]: Printer hardware specifications
//! - [`labels`]: Label media types and their dot geometry

pub mod labels;
pub mod models;

pub use labels::{FormFactor, LabelSpec};
pub use models::PrinterModel;
