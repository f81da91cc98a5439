//! Domain Layer - Errors
//!
//! `RemoteError` covers every failing store call; `SyncError` says which
//! pantry operation it broke.

use std::fmt;

/// Result type for document store calls
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failure of a remote store call (network, permission, not-found,
/// rejected write). Sub-kinds are not distinguished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Remote store error: {}", self.message)
    }
}

impl std::error::Error for RemoteError {}

/// A pantry operation that failed on its remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    Fetch(RemoteError),
    Add(RemoteError),
    Remove(RemoteError),
    UpdateQuantity(RemoteError),
}

impl SyncError {
    /// Fixed user-facing message for the failed operation
    pub fn message(&self) -> &'static str {
        match self {
            SyncError::Fetch(_) => "Failed to fetch pantry items",
            SyncError::Add(_) => "Failed to add item",
            SyncError::Remove(_) => "Failed to remove item",
            SyncError::UpdateQuantity(_) => "Failed to update quantity",
        }
    }

    /// The underlying store failure
    pub fn remote(&self) -> &RemoteError {
        match self {
            SyncError::Fetch(e)
            | SyncError::Add(e)
            | SyncError::Remove(e)
            | SyncError::UpdateQuantity(e) => e,
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.remote())
    }
}
