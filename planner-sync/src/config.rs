//! Sync layer configuration.

use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Configuration for the sync coordinator and HTTP gateway.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL for the hosted backend (e.g., "https://api.example.com").
    pub api_base_url: String,

    /// Interval for the periodic auto-sync timer (seconds). Guards against
    /// missed connectivity-transition events.
    pub auto_sync_interval_secs: u64,

    /// Per-request HTTP timeout (seconds).
    pub request_timeout_secs: u64,

    /// Retry policy applied to queued operations during a drain.
    pub retry: RetryPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.familyplanner.app".to_string(),
            auto_sync_interval_secs: 30,
            request_timeout_secs: 30,
            retry: RetryPolicy::default(),
        }
    }
}
