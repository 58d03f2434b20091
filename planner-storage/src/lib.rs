//! Local persistence for the family planner data layer.
//!
//! A synchronous, string-keyed key-value store holding JSON-serialized
//! records, the offline operation queue snapshot, the session snapshot,
//! and preference blobs. All entries live under a fixed application
//! prefix. Reads fall back here whenever the remote store is unreachable.

pub mod error;
pub mod record_cache;

pub use error::{StorageError, StorageResult};
pub use record_cache::{APP_PREFIX, RecordCache};
