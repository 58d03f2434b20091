//! Notification boundary.
//!
//! The coordinator emits human-readable status messages to an external
//! notification-display collaborator; it does not manage notification
//! lifetime or rendering.

use tracing::{error, info, warn};

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Consumer of sync status messages ("Sync complete", "N operations not
/// synced", offline-mode notices).
pub trait SyncNotifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Default notifier that routes messages to the log.
pub struct TracingNotifier;

impl SyncNotifier for TracingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info | NoticeLevel::Success => info!("{message}"),
            NoticeLevel::Warning => warn!("{message}"),
            NoticeLevel::Error => error!("{message}"),
        }
    }
}
