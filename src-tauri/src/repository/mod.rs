//! Repository Layer
//!
//! Document store abstraction and its backends.

mod traits;
mod db;
mod firestore;
mod memory;

#[cfg(test)]
mod tests;

pub use traits::DocumentStore;
pub use db::SqliteStore;
pub use firestore::FirestoreStore;
pub use memory::{MemoryStore, StoreOp};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{BackendConfig, DEFAULT_DB_FILE, DEFAULT_TIMEOUT_SECS};
use crate::domain::RemoteResult;

/// Build the store selected by the config
pub fn open_store(backend: &BackendConfig, data_dir: &Path) -> RemoteResult<Arc<dyn DocumentStore>> {
    match backend {
        BackendConfig::Local { db_file } => {
            let db_path = data_dir.join(db_file.as_deref().unwrap_or(Path::new(DEFAULT_DB_FILE)));
            log::info!("Opening local pantry store at {}", db_path.display());
            Ok(Arc::new(SqliteStore::open(&db_path)?))
        }
        BackendConfig::Memory => {
            log::warn!("Using in-memory pantry store; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        BackendConfig::Firestore {
            project_id,
            api_key,
            database,
            timeout_secs,
        } => {
            log::info!("Using Firestore project {}", project_id);
            let timeout = Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
            Ok(Arc::new(FirestoreStore::new(
                project_id,
                api_key.clone(),
                database.as_deref(),
                timeout,
            )?))
        }
    }
}
