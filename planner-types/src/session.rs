//! Session snapshot persisted between page sessions.

use crate::record::Family;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The signed-in user and active family, saved through the local cache so
/// the app can start in a useful state while offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Auth-backend user id.
    pub user_id: String,
    pub email: String,
    pub family: Family,
    pub saved_at: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>, family: Family) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            family,
            saved_at: Utc::now(),
        }
    }
}
