//! Repository Layer - Core Traits
//!
//! Defines the abstract interface of the remote document store.
//! Implementations can use Firestore, SQLite, in-memory, etc.

use async_trait::async_trait;

use crate::domain::{Document, Fields, RemoteResult};

/// Document collection store keyed by document identity
///
/// All operations are async to support network backends. Each call is
/// atomic on its own; nothing spans multiple calls.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch every document of a collection, in store order
    async fn list_all(&self, collection: &str) -> RemoteResult<Vec<Document>>;

    /// Create a document and return the id the store assigned
    async fn create(&self, collection: &str, fields: Fields) -> RemoteResult<String>;

    /// Delete a document by id
    async fn delete_by_id(&self, collection: &str, id: &str) -> RemoteResult<()>;

    /// Overwrite the given fields of an existing document.
    /// Fails if the document does not exist.
    async fn update_fields(&self, collection: &str, id: &str, fields: Fields) -> RemoteResult<()>;
}
