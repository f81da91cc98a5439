//! Commands Layer
//!
//! Tauri command handlers that bridge the frontend to the synchronizer.

mod pantry_cmd;

pub use pantry_cmd::*;
