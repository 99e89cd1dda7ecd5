//! # Label Module
//!
//! Label geometry and composition.
//!
//! ## Modules
//!
//! - [`profile`]: Physical label geometry and mm/px conversion
//! - [`compose`]: Barcode + caption layout on the label canvas
//! - [`image`]: The finished label raster and PNG encoding

pub mod compose;
pub mod image;
pub mod profile;

pub use compose::LabelComposer;
pub use self::image::{CONTENT_TYPE_PNG, LabelImage};
pub use profile::LabelProfile;
