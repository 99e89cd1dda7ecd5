//! # Item Records
//!
//! The label service never sees the host application's records directly.
//! Anything that can name itself implements [`IdentifierSource`]; the two
//! structs here are the inventory app's records in serialisable form.
//!
//! ## JSON Shape
//!
//! ```json
//! {
//!   "id": 739,
//!   "inventory_code": null,
//!   "product": { "name": "Spool PLA", "upc": "0123456789012", "sku": "A00-K0" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EtiquetaError, Result};

/// Prefix of generated inventory codes
pub const INVENTORY_PREFIX: &str = "INV";

/// Code used when a record has neither an explicit code nor an id
pub const UNKNOWN_CODE: &str = "INV-UNKNOWN";

/// Something a label can be printed for.
pub trait IdentifierSource {
    /// Code for `unique` labels. Always available.
    fn unique_code(&self) -> String;

    /// Product UPC for `upc` labels
    fn upc(&self) -> Option<String> {
        None
    }

    /// Human-readable name shown before the UPC in captions
    fn display_name(&self) -> Option<String> {
        None
    }
}

/// Resolve an inventory code: the explicit code, else `INV-{id}`, else
/// [`UNKNOWN_CODE`].
///
/// ## Example
///
/// ```
/// use etiqueta::item::inventory_code;
///
/// assert_eq!(inventory_code(Some("SHELF-4"), Some(7)), "SHELF-4");
/// assert_eq!(inventory_code(None, Some(7)), "INV-7");
/// assert_eq!(inventory_code(Some("  "), None), "INV-UNKNOWN");
/// ```
pub fn inventory_code(explicit: Option<&str>, id: Option<u64>) -> String {
    if let Some(code) = explicit.map(str::trim).filter(|c| !c.is_empty()) {
        return code.to_string();
    }
    match id {
        Some(id) => format!("{}-{}", INVENTORY_PREFIX, id),
        None => {
            warn!("Record has no inventory code and no id, using {}", UNKNOWN_CODE);
            UNKNOWN_CODE.to_string()
        }
    }
}

/// A product type (filament, printer, dryer...)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    /// 13-digit retail barcode
    #[serde(default)]
    pub upc: Option<String>,
    /// Short vendor code
    #[serde(default)]
    pub sku: Option<String>,
}

impl IdentifierSource for Product {
    fn unique_code(&self) -> String {
        inventory_code(self.sku.as_deref(), None)
    }

    fn upc(&self) -> Option<String> {
        self.upc.clone()
    }

    fn display_name(&self) -> Option<String> {
        Some(self.name.clone()).filter(|n| !n.trim().is_empty())
    }
}

/// One physical item on a shelf
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub inventory_code: Option<String>,
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub serial_number: Option<String>,
}

impl InventoryItem {
    /// Parse a record from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| EtiquetaError::InvalidInput(format!("Invalid item JSON: {}", e)))
    }
}

impl IdentifierSource for InventoryItem {
    fn unique_code(&self) -> String {
        inventory_code(self.inventory_code.as_deref(), self.id)
    }

    fn upc(&self) -> Option<String> {
        self.product.as_ref().and_then(|p| p.upc.clone())
    }

    fn display_name(&self) -> Option<String> {
        self.product.as_ref().and_then(|p| p.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inventory_code_chain() {
        assert_eq!(inventory_code(Some("BIN-12"), Some(3)), "BIN-12");
        assert_eq!(inventory_code(Some(""), Some(3)), "INV-3");
        assert_eq!(inventory_code(None, Some(739)), "INV-739");
        assert_eq!(inventory_code(None, None), "INV-UNKNOWN");
    }

    #[test]
    fn test_item_from_json() {
        let item = InventoryItem::from_json(
            r#"{"id": 739, "product": {"name": "Spool PLA", "upc": "0123456"}}"#,
        )
        .unwrap();
        assert_eq!(item.unique_code(), "INV-739");
        assert_eq!(item.upc().as_deref(), Some("0123456"));
        assert_eq!(item.display_name().as_deref(), Some("Spool PLA"));
    }

    #[test]
    fn test_item_without_product() {
        let item = InventoryItem::from_json(r#"{"id": 5}"#).unwrap();
        assert_eq!(item.upc(), None);
        assert_eq!(item.display_name(), None);
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            InventoryItem::from_json("{"),
            Err(EtiquetaError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_product_source() {
        let product = Product {
            name: " ".into(),
            upc: Some("0123".into()),
            sku: Some("A00-K0".into()),
        };
        assert_eq!(product.unique_code(), "A00-K0");
        assert_eq!(product.display_name(), None);
        assert_eq!(product.upc().as_deref(), Some("0123"));
    }
}
