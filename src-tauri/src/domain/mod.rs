//! Domain Layer
//!
//! Contains the pantry item entity, the generic store document and the
//! error types shared by the other layers.
//! This layer has NO external dependencies (except serde / serde_json).

mod document;
mod error;
mod item;

pub use document::{Document, Fields};
pub use error::{RemoteError, RemoteResult, SyncError};
pub use item::{normalize_name, Item, ItemId, MAX_QUANTITY, NAME_FIELD, QUANTITY_FIELD};
