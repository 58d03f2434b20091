//! The offline operation queue.
//!
//! An ordered log of pending mutations awaiting remote replay. A drain
//! snapshots the queue, clears it, and executes each eligible operation in
//! sequence order, awaiting each before the next — no concurrent in-flight
//! requests, so replay order matches enqueue order. Failures are retained
//! in their original relative order; operations enqueued while a drain is
//! in progress land after the retained failures. Operations that exhaust
//! the retry budget move to the dead-letter sink. Network-level failures
//! never count against the budget: the network being down says nothing
//! about the operation itself, so it is retained untouched for the next
//! online session.

use crate::error::SyncResult;
use crate::retry::RetryPolicy;
use chrono::Utc;
use planner_types::{OperationKind, QueuedOperation};
use std::future::Future;
use tracing::{debug, warn};

/// Outcome of one drain cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Operations actually executed this cycle.
    pub attempted: usize,
    pub synced: usize,
    /// Failures retained for a later cycle.
    pub failed: usize,
    /// Operations moved to the dead-letter sink this cycle.
    pub dead_lettered: usize,
    /// Operations skipped because their backoff delay has not elapsed.
    pub deferred: usize,
    /// True when at least one replay failed at the network level. The
    /// coordinator reacts by switching offline.
    pub connection_lost: bool,
}

impl DrainReport {
    pub fn unsynced(&self) -> usize {
        self.failed + self.dead_lettered
    }
}

/// In-memory queue of pending operations. The sync coordinator owns its
/// lifecycle and persists snapshots through the record cache.
pub struct OfflineQueue {
    ops: Vec<QueuedOperation>,
    dead: Vec<QueuedOperation>,
    next_seq: u64,
}

impl OfflineQueue {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            dead: Vec::new(),
            next_seq: 0,
        }
    }

    /// Rebuilds a queue from persisted snapshots, resuming the sequence
    /// counter past every restored operation.
    pub fn from_snapshot(ops: Vec<QueuedOperation>, dead: Vec<QueuedOperation>) -> Self {
        let next_seq = ops
            .iter()
            .chain(dead.iter())
            .map(|op| op.seq + 1)
            .max()
            .unwrap_or(0);
        Self {
            ops,
            dead,
            next_seq,
        }
    }

    /// Appends a new operation with a fresh id, the next sequence number,
    /// and the current timestamp.
    pub fn enqueue(&mut self, kind: OperationKind) -> &QueuedOperation {
        let op = QueuedOperation::new(self.next_seq, kind);
        self.next_seq += 1;
        debug!(
            "queued {} on {} (seq {})",
            op.kind.label(),
            op.kind.collection(),
            op.seq
        );
        let index = self.ops.len();
        self.ops.push(op);
        &self.ops[index]
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Pending operations, in replay order.
    pub fn snapshot(&self) -> Vec<QueuedOperation> {
        self.ops.clone()
    }

    /// Operations that exhausted their retry budget.
    pub fn dead_letters(&self) -> &[QueuedOperation] {
        &self.dead
    }

    pub fn dead_letter_snapshot(&self) -> Vec<QueuedOperation> {
        self.dead.clone()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
        self.dead.clear();
    }

    /// Replays pending operations through `execute`, strictly in sequence
    /// order, awaiting each before the next. An individual failure never
    /// aborts the drain. A drain of an empty queue executes nothing.
    pub async fn drain<F, Fut>(&mut self, policy: &RetryPolicy, mut execute: F) -> DrainReport
    where
        F: FnMut(QueuedOperation) -> Fut,
        Fut: Future<Output = SyncResult<()>>,
    {
        let pending = std::mem::take(&mut self.ops);
        let mut retained: Vec<QueuedOperation> = Vec::new();
        let mut report = DrainReport::default();
        let now = Utc::now();

        for mut op in pending {
            if !op.eligible_at(now) {
                report.deferred += 1;
                retained.push(op);
                continue;
            }

            report.attempted += 1;
            match execute(op.clone()).await {
                Ok(()) => {
                    report.synced += 1;
                }
                Err(e) if e.is_connectivity() => {
                    // The network dropped mid-drain. Retain the operation
                    // without touching its attempt count.
                    warn!(
                        "replay hit a network failure for {} on {}: {e}",
                        op.kind.label(),
                        op.kind.collection()
                    );
                    report.failed += 1;
                    report.connection_lost = true;
                    retained.push(op);
                }
                Err(e) => {
                    op.attempts += 1;
                    if policy.is_exhausted(op.attempts) {
                        warn!(
                            "dead-lettering {} on {} after {} attempts: {e}",
                            op.kind.label(),
                            op.kind.collection(),
                            op.attempts
                        );
                        report.dead_lettered += 1;
                        self.dead.push(op);
                    } else {
                        warn!(
                            "replay failed for {} on {} (attempt {}): {e}",
                            op.kind.label(),
                            op.kind.collection(),
                            op.attempts
                        );
                        op.not_before = policy.next_eligible(op.attempts, Utc::now());
                        report.failed += 1;
                        retained.push(op);
                    }
                }
            }
        }

        // Failures keep their relative order; anything enqueued while the
        // drain ran comes after them.
        retained.append(&mut self.ops);
        self.ops = retained;
        report
    }
}

impl Default for OfflineQueue {
    fn default() -> Self {
        Self::new()
    }
}
