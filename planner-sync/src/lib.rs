//! Offline-tolerant data-access layer for the family planner.
//!
//! Provides:
//! - A remote data gateway over the hosted backend's collection API
//! - An offline operation queue with retry policy and dead-letter sink
//! - A sync coordinator that routes writes by connectivity state, mirrors
//!   results into the local record cache, and drains the queue on reconnect

pub mod config;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod queue;
pub mod retry;

pub use config::SyncConfig;
pub use coordinator::{ConnectivityEvent, ConnectivityState, SyncCommand, SyncCoordinator};
pub use error::{SyncError, SyncResult};
pub use gateway::{HttpGateway, RemoteGateway};
pub use notify::{NoticeLevel, SyncNotifier, TracingNotifier};
pub use queue::{DrainReport, OfflineQueue};
pub use retry::{BackoffStrategy, RetryPolicy};
