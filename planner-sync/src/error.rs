//! Sync error types.
//!
//! The taxonomy the coordinator dispatches on: validation errors surface
//! directly to the caller, connectivity errors trigger the offline
//! fallback, API errors are replay failures retained by the queue, and
//! storage/serialization errors degrade to cache misses.

use planner_storage::StorageError;
use planner_types::ValidationError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in the sync layer.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("network unreachable: {0}")]
    Connectivity(String),

    #[error("API request failed: {0}")]
    Api(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
}

impl SyncError {
    /// True for network-level failures that should trigger the offline
    /// fallback rather than surface to the caller.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, SyncError::Connectivity(_))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            SyncError::Connectivity(e.to_string())
        } else {
            SyncError::Http(e)
        }
    }
}
