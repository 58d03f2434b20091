//! Queued operations — pending mutations awaiting remote replay.

use crate::ids::RecordId;
use crate::record::{Collection, RecordPayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The mutation a queued operation replays against the backend.
///
/// Creates carry the full record; updates carry a partial JSON diff;
/// deletes carry only the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OperationKind {
    Create {
        record: RecordPayload,
    },
    Update {
        collection: Collection,
        target_id: RecordId,
        patch: serde_json::Value,
    },
    Delete {
        collection: Collection,
        target_id: RecordId,
    },
}

impl OperationKind {
    pub fn collection(&self) -> Collection {
        match self {
            OperationKind::Create { record } => record.collection(),
            OperationKind::Update { collection, .. } => *collection,
            OperationKind::Delete { collection, .. } => *collection,
        }
    }

    pub fn target_id(&self) -> RecordId {
        match self {
            OperationKind::Create { record } => record.id(),
            OperationKind::Update { target_id, .. } => *target_id,
            OperationKind::Delete { target_id, .. } => *target_id,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::Create { .. } => "create",
            OperationKind::Update { .. } => "update",
            OperationKind::Delete { .. } => "delete",
        }
    }
}

/// One pending mutation in the offline queue.
///
/// `seq` is assigned from a single monotonic counter, giving a total order
/// over all operations regardless of which connectivity session enqueued
/// them. Replay happens in strict `seq` order within a drain cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedOperation {
    pub id: Uuid,
    pub seq: u64,
    #[serde(flatten)]
    pub kind: OperationKind,
    pub queued_at: DateTime<Utc>,
    /// Replay attempts so far; bumped on each failed drain.
    #[serde(default)]
    pub attempts: u32,
    /// Earliest instant the next replay attempt is allowed, per the backoff
    /// strategy. Absent until the operation has failed at least once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,
}

impl QueuedOperation {
    pub fn new(seq: u64, kind: OperationKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            seq,
            kind,
            queued_at: Utc::now(),
            attempts: 0,
            not_before: None,
        }
    }

    /// True once `not_before` (if any) has elapsed.
    pub fn eligible_at(&self, now: DateTime<Utc>) -> bool {
        self.not_before.is_none_or(|t| t <= now)
    }
}
