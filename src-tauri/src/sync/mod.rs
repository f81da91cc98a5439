//! Sync Layer
//!
//! Keeps an in-memory mirror of the pantry collection in step with the
//! document store.

mod pantry_sync;
mod state;


pub use pantry_sync::{PantrySync, PANTRY_COLLECTION};
pub use state::{ItemView, Notification, PantrySnapshot, SUCCESS_MESSAGE};
