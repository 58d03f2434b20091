//! The sync coordinator.
//!
//! Single data-access entry point for the application: routes every
//! create/update/delete by connectivity state, mirrors remote results into
//! the local record cache, writes optimistic records while offline, and
//! drains the offline queue on reconnect and on a periodic timer.
//!
//! The coordinator is the one context object of the data layer —
//! constructed once at startup, shared behind an `Arc`, with all mutable
//! state held internally.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::gateway::RemoteGateway;
use crate::notify::{NoticeLevel, SyncNotifier};
use crate::queue::{DrainReport, OfflineQueue};
use chrono::Utc;
use planner_storage::RecordCache;
use planner_types::{
    Collection, OperationKind, QueuedOperation, RecordId, RecordPayload, SessionSnapshot, Task,
    TaskStatistics, task_statistics, validate_patch,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Cache key for the persisted queue snapshot.
const QUEUE_KEY: &str = "offline_queue";
/// Cache key for operations that exhausted their retry budget.
const DEAD_LETTER_KEY: &str = "dead_letter_queue";
/// Cache key for the session snapshot.
const SESSION_KEY: &str = "session";

/// Connectivity state of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Online,
    Offline,
}

/// Connectivity signal consumed from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Restored,
    Lost,
}

/// Commands accepted by the coordinator's run loop.
#[derive(Debug)]
pub enum SyncCommand {
    Stop,
    ForceSync,
}

/// Offline-tolerant data-access coordinator.
pub struct SyncCoordinator {
    gateway: Arc<dyn RemoteGateway>,
    cache: RecordCache,
    notifier: Arc<dyn SyncNotifier>,
    config: SyncConfig,
    state: Mutex<ConnectivityState>,
    /// Held for the whole of a drain, so drains are serialized and
    /// enqueues racing a drain land after the retained failures.
    queue: tokio::sync::Mutex<OfflineQueue>,
}

impl SyncCoordinator {
    /// Builds the coordinator, restoring any queue snapshot persisted by a
    /// previous session. `initial` comes from the current connectivity
    /// signal at startup.
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        cache: RecordCache,
        notifier: Arc<dyn SyncNotifier>,
        config: SyncConfig,
        initial: ConnectivityState,
    ) -> Self {
        let ops: Vec<QueuedOperation> = cache.get_value(QUEUE_KEY).unwrap_or_default();
        let dead: Vec<QueuedOperation> = cache.get_value(DEAD_LETTER_KEY).unwrap_or_default();
        let queue = OfflineQueue::from_snapshot(ops, dead);
        if !queue.is_empty() {
            info!("restored {} pending operations from cache", queue.len());
        }
        Self {
            gateway,
            cache,
            notifier,
            config,
            state: Mutex::new(initial),
            queue: tokio::sync::Mutex::new(queue),
        }
    }

    pub fn state(&self) -> ConnectivityState {
        *self.state.lock().unwrap()
    }

    pub fn is_online(&self) -> bool {
        self.state() == ConnectivityState::Online
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    pub async fn queue_len(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn dead_letters(&self) -> Vec<QueuedOperation> {
        self.queue.lock().await.dead_letter_snapshot()
    }

    // ── Connectivity ──

    /// Applies a connectivity transition. `Restored` drains the queue;
    /// `Lost` only flips state — subsequent writes route to the queue.
    pub async fn handle_connectivity(&self, event: ConnectivityEvent) {
        match event {
            ConnectivityEvent::Lost => {
                self.set_state(ConnectivityState::Offline);
                info!("connectivity lost, routing writes to the offline queue");
                self.notifier.notify(
                    NoticeLevel::Warning,
                    "Offline mode on. Changes will sync when the connection returns.",
                );
            }
            ConnectivityEvent::Restored => {
                self.set_state(ConnectivityState::Online);
                info!("connectivity restored");
                self.drain_queue().await;
            }
        }
    }

    /// Periodic timer hook: if online and the queue is non-empty, attempt
    /// a drain. Guards against missed transition events.
    pub async fn tick(&self) {
        if self.is_online() {
            self.drain_queue().await;
        }
    }

    // ── Write dispatch ──

    /// Creates a record. Online, the gateway result is mirrored into the
    /// cache; offline (or on a network-class gateway failure), the
    /// operation is queued and the optimistic record is returned.
    pub async fn create_record(&self, record: RecordPayload) -> SyncResult<RecordPayload> {
        record.validate()?;

        if self.is_online() {
            match self.gateway.create(&record).await {
                Ok(stored) => {
                    self.cache.put(&stored);
                    return Ok(stored);
                }
                Err(e) if e.is_connectivity() => self.fall_offline("create", &e),
                Err(e) => return Err(e),
            }
        }

        self.enqueue(OperationKind::Create {
            record: record.clone(),
        })
        .await;
        self.cache.put(&record);
        Ok(record)
    }

    /// Applies a partial diff to a record. Offline, the diff is merged
    /// over the cached record and the merged form returned optimistically;
    /// updating a record absent from the cache while offline is an error.
    pub async fn update_record(
        &self,
        collection: Collection,
        id: RecordId,
        patch: serde_json::Value,
    ) -> SyncResult<RecordPayload> {
        validate_patch(collection, &patch)?;
        let patch = stamp_updated_at(patch);

        if self.is_online() {
            match self.gateway.update(collection, id, &patch).await {
                Ok(stored) => {
                    self.cache.put(&stored);
                    return Ok(stored);
                }
                Err(e) if e.is_connectivity() => self.fall_offline("update", &e),
                Err(e) => return Err(e),
            }
        }

        let current = self.cache.get(collection, id).ok_or_else(|| {
            SyncError::NotFound(format!("{collection}:{id} is not in the local cache"))
        })?;
        let merged = current.apply_patch(&patch)?;
        self.enqueue(OperationKind::Update {
            collection,
            target_id: id,
            patch,
        })
        .await;
        self.cache.put(&merged);
        Ok(merged)
    }

    /// Deletes a record, removing its cache entry immediately.
    pub async fn delete_record(&self, collection: Collection, id: RecordId) -> SyncResult<()> {
        if self.is_online() {
            match self.gateway.delete(collection, id).await {
                Ok(()) => {
                    self.cache.remove(collection, id);
                    return Ok(());
                }
                Err(e) if e.is_connectivity() => self.fall_offline("delete", &e),
                Err(e) => return Err(e),
            }
        }

        self.enqueue(OperationKind::Delete {
            collection,
            target_id: id,
        })
        .await;
        self.cache.remove(collection, id);
        Ok(())
    }

    // ── Reads ──

    /// Fetches one record, falling back to the cache when offline or when
    /// the remote read fails at the network level.
    pub async fn get_record(
        &self,
        collection: Collection,
        id: RecordId,
    ) -> SyncResult<Option<RecordPayload>> {
        if self.is_online() {
            match self.gateway.fetch_one(collection, id).await {
                Ok(Some(record)) => {
                    self.cache.put(&record);
                    return Ok(Some(record));
                }
                Ok(None) => return Ok(None),
                Err(e) if e.is_connectivity() => self.fall_offline("read", &e),
                Err(e) => return Err(e),
            }
        }
        Ok(self.cache.get(collection, id))
    }

    /// Lists a family's records with optional exact-match filters, remote
    /// when online (mirroring results into the cache), local otherwise.
    pub async fn list_records(
        &self,
        collection: Collection,
        family_id: RecordId,
        filters: &[(String, serde_json::Value)],
    ) -> SyncResult<Vec<RecordPayload>> {
        if self.is_online() {
            match self.gateway.list(collection, family_id, filters).await {
                Ok(records) => {
                    for record in &records {
                        self.cache.put(record);
                    }
                    return Ok(records);
                }
                Err(e) if e.is_connectivity() => self.fall_offline("list", &e),
                Err(e) => return Err(e),
            }
        }
        Ok(self.cache.query_by_family(collection, family_id, filters))
    }

    /// Completion statistics over a family's tasks.
    pub async fn task_statistics(&self, family_id: RecordId) -> SyncResult<TaskStatistics> {
        let records = self
            .list_records(Collection::Tasks, family_id, &[])
            .await?;
        let tasks: Vec<Task> = records
            .into_iter()
            .filter_map(|r| match r {
                RecordPayload::Task(t) => Some(t),
                _ => None,
            })
            .collect();
        Ok(task_statistics(&tasks))
    }

    // ── Queue ──

    /// Replays the queue through the gateway in enqueue order, then
    /// reports aggregate counts to the notifier. A drain with nothing
    /// eligible performs zero gateway calls and stays silent.
    pub async fn drain_queue(&self) -> DrainReport {
        let mut queue = self.queue.lock().await;
        if queue.is_empty() {
            return DrainReport::default();
        }
        info!("draining {} queued operations", queue.len());

        let report = queue
            .drain(&self.config.retry, |op| {
                let gateway = Arc::clone(&self.gateway);
                async move { replay(gateway.as_ref(), &op).await }
            })
            .await;
        self.persist_queue(&queue);
        drop(queue);

        if report.connection_lost {
            info!("drain hit a network failure, switching offline");
            self.set_state(ConnectivityState::Offline);
        }

        if report.attempted > 0 {
            if report.unsynced() == 0 {
                self.notifier.notify(
                    NoticeLevel::Success,
                    &format!("Sync complete: {} operations synced", report.synced),
                );
            } else {
                self.notifier.notify(
                    NoticeLevel::Warning,
                    &format!("{} operations not synced", report.unsynced()),
                );
            }
        }
        report
    }

    // ── Session ──

    /// Persists the session snapshot through the cache.
    pub fn save_session(&self, session: &SessionSnapshot) {
        self.cache.put_value(SESSION_KEY, session);
    }

    /// Restores the saved session. A corrupt snapshot is cleared and
    /// treated as absent.
    pub fn load_session(&self) -> Option<SessionSnapshot> {
        let raw = self.cache.get_raw(SESSION_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("corrupt session snapshot, clearing: {e}");
                self.cache.remove_value(SESSION_KEY);
                None
            }
        }
    }

    pub fn clear_session(&self) {
        self.cache.remove_value(SESSION_KEY);
    }

    // ── Run loop ──

    /// Event loop over connectivity signals, the periodic auto-sync timer,
    /// and commands. Returns when told to stop or when the command channel
    /// closes.
    pub async fn run(
        self: Arc<Self>,
        mut connectivity_rx: mpsc::Receiver<ConnectivityEvent>,
        mut command_rx: mpsc::Receiver<SyncCommand>,
    ) {
        info!(
            "sync coordinator started ({:?}, auto-sync every {}s)",
            self.state(),
            self.config.auto_sync_interval_secs
        );

        let mut auto_sync =
            tokio::time::interval(Duration::from_secs(self.config.auto_sync_interval_secs));
        // Skip first immediate tick
        auto_sync.tick().await;

        loop {
            tokio::select! {
                _ = auto_sync.tick() => {
                    self.tick().await;
                }
                Some(event) = connectivity_rx.recv() => {
                    self.handle_connectivity(event).await;
                }
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(SyncCommand::ForceSync) => {
                            self.drain_queue().await;
                        }
                        Some(SyncCommand::Stop) => {
                            info!("sync coordinator stopping");
                            break;
                        }
                        None => {
                            info!("command channel closed, stopping sync coordinator");
                            break;
                        }
                    }
                }
            }
        }
    }

    // ── Internals ──

    fn set_state(&self, state: ConnectivityState) {
        *self.state.lock().unwrap() = state;
    }

    /// Network-class gateway failure during an online call: flip to
    /// Offline and let the caller's offline path take over.
    fn fall_offline(&self, action: &str, e: &SyncError) {
        debug!("{action} hit a network failure, switching offline: {e}");
        self.set_state(ConnectivityState::Offline);
    }

    async fn enqueue(&self, kind: OperationKind) {
        let mut queue = self.queue.lock().await;
        queue.enqueue(kind);
        self.persist_queue(&queue);
    }

    fn persist_queue(&self, queue: &OfflineQueue) {
        self.cache.put_value(QUEUE_KEY, &queue.snapshot());
        self.cache
            .put_value(DEAD_LETTER_KEY, &queue.dead_letter_snapshot());
    }
}

/// Replays one queued operation through the gateway.
async fn replay(gateway: &dyn RemoteGateway, op: &QueuedOperation) -> SyncResult<()> {
    match &op.kind {
        OperationKind::Create { record } => gateway.create(record).await.map(|_| ()),
        OperationKind::Update {
            collection,
            target_id,
            patch,
        } => gateway
            .update(*collection, *target_id, patch)
            .await
            .map(|_| ()),
        OperationKind::Delete {
            collection,
            target_id,
        } => gateway.delete(*collection, *target_id).await,
    }
}

/// Updates always carry a server-visible `updated_at`, stamped at dispatch.
fn stamp_updated_at(mut patch: serde_json::Value) -> serde_json::Value {
    if let Some(map) = patch.as_object_mut() {
        map.insert("updated_at".to_string(), serde_json::json!(Utc::now()));
    }
    patch
}
