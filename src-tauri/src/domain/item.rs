//! Item Entity
//!
//! A pantry entry: a named item with a non-negative quantity.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::{Document, Fields};

/// Field holding the item name in store documents
pub const NAME_FIELD: &str = "name";
/// Field holding the item quantity in store documents
pub const QUANTITY_FIELD: &str = "quantity";

/// Largest storable quantity (stores keep int64)
pub const MAX_QUANTITY: u64 = i64::MAX as u64;

/// Opaque identifier assigned by the document store
pub type ItemId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier (assigned by the store on creation)
    pub id: ItemId,
    /// Item name, trimmed on submission
    pub name: String,
    /// Quantity on hand, never negative
    pub quantity: u64,
}

impl Item {
    /// A freshly created item (quantity 0)
    pub fn new(id: ItemId, name: String) -> Self {
        Self {
            id,
            name,
            quantity: 0,
        }
    }

    /// Fields written to the store when creating an item
    pub fn new_fields(name: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert(NAME_FIELD.to_string(), Value::from(name));
        fields.insert(QUANTITY_FIELD.to_string(), Value::from(0u64));
        fields
    }

    /// Build an item from a fetched document.
    ///
    /// A missing (or non-integer, or negative) quantity reads as 0.
    pub fn from_document(doc: &Document) -> Self {
        let name = doc
            .fields
            .get(NAME_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let quantity = doc
            .fields
            .get(QUANTITY_FIELD)
            .and_then(quantity_from_value)
            .unwrap_or(0);

        Self {
            id: doc.id.clone(),
            name,
            quantity,
        }
    }

    /// Quantity after applying `delta`, clamped to `0..=MAX_QUANTITY`
    pub fn adjusted_quantity(&self, delta: i64) -> u64 {
        self.quantity.saturating_add_signed(delta).min(MAX_QUANTITY)
    }

    /// Whether a decrement would change anything
    pub fn can_decrement(&self) -> bool {
        self.quantity > 0
    }

    /// Name with its first letter upper-cased, for display
    pub fn display_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

fn quantity_from_value(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        })
        .map(|q| q.min(MAX_QUANTITY))
}

/// Trimmed item name, or `None` if nothing is left after trimming
pub fn normalize_name(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
