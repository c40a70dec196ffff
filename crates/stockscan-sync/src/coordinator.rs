//! # Sync Coordinator
//!
//! Tracks connectivity and reconciles the offline capture queue.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SyncCoordinator                                  │
//! │                                                                         │
//! │   mount(online) ──► evict > N days ──► online? ──► flush                │
//! │                                                                         │
//! │   ┌──────────┐   Online event (flush)   ┌──────────┐                    │
//! │   │ OFFLINE  │ ───────────────────────► │  ONLINE  │                    │
//! │   │          │ ◄─────────────────────── │          │                    │
//! │   └──────────┘   Offline event          └──────────┘                    │
//! │                  (no flush)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Flush
//! ```text
//! lock ──► cancelled? ──► probe ──┬── fail ──► ProbeFailed (queue untouched)
//!                                 │
//!                                 └── ok ──► cancelled? ──► for each collection:
//!                                            list unsynced ──► mark synced (1 tx)
//!                                            ──► lastSync = now
//! ```
//!
//! A flush does not send payloads anywhere: a healthy probe means every
//! capture queued at that moment is accepted and marked synced.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use stockscan_core::{CapturePayload, Collection};
use stockscan_db::{Database, OfflineQueueRepository};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::SyncSettings;
use crate::error::{SyncError, SyncResult};
use crate::probe::ReachabilityProbe;

// =============================================================================
// Events and Status
// =============================================================================

/// Connectivity change reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Online,
    Offline,
}

/// What the frontend sees: `{ isOnline, lastSync, pendingCount }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub is_online: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub pending_count: i64,
}

/// Outcome of a successful flush.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlushReport {
    /// Records flipped to synced, across all collections.
    pub synced: u64,
    pub availability_captures: u64,
    pub product_fetches: u64,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct ConnectivityState {
    is_online: bool,
    last_sync: Option<DateTime<Utc>>,
}

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Receives coordinator notifications (implemented by the UI layer).
pub trait SyncEventEmitter: Send + Sync {
    fn emit_status(&self, status: &SyncStatus);

    fn emit_flushed(&self, report: &FlushReport);

    /// A flush failed; `retryable` is true when nothing was lost.
    fn emit_error(&self, message: &str, retryable: bool);
}

/// No-op event emitter.
pub struct NoOpEmitter;

impl SyncEventEmitter for NoOpEmitter {
    fn emit_status(&self, _status: &SyncStatus) {}
    fn emit_flushed(&self, _report: &FlushReport) {}
    fn emit_error(&self, _message: &str, _retryable: bool) {}
}

// =============================================================================
// Sync Coordinator
// =============================================================================

pub struct SyncCoordinator {
    queue: OfflineQueueRepository,
    probe: Arc<dyn ReachabilityProbe>,
    settings: SyncSettings,
    state: RwLock<ConnectivityState>,

    /// Serializes flushes.
    flush_lock: Mutex<()>,

    emitter: Arc<dyn SyncEventEmitter>,
}

impl SyncCoordinator {
    /// Creates a coordinator that starts offline with no last sync.
    pub fn new(db: Database, probe: Arc<dyn ReachabilityProbe>, settings: SyncSettings) -> Self {
        SyncCoordinator {
            queue: db.offline_queue(),
            probe,
            settings,
            state: RwLock::new(ConnectivityState::default()),
            flush_lock: Mutex::new(()),
            emitter: Arc::new(NoOpEmitter),
        }
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn SyncEventEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    // =========================================================================
    // Status
    // =========================================================================

    pub async fn is_online(&self) -> bool {
        self.state.read().await.is_online
    }

    pub async fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_sync
    }

    /// Current connectivity plus the number of unsynced captures.
    pub async fn status(&self) -> SyncResult<SyncStatus> {
        let mut pending_count = 0;
        for collection in Collection::ALL {
            pending_count += self.queue.count_unsynced(collection).await?;
        }

        let state = self.state.read().await;
        Ok(SyncStatus {
            is_online: state.is_online,
            last_sync: state.last_sync,
            pending_count,
        })
    }

    async fn publish_status(&self) {
        match self.status().await {
            Ok(status) => self.emitter.emit_status(&status),
            Err(e) => warn!(error = %e, "Failed to read sync status"),
        }
    }

    async fn set_online(&self, online: bool) {
        let changed = {
            let mut state = self.state.write().await;
            let changed = state.is_online != online;
            state.is_online = online;
            changed
        };

        if changed {
            info!(online, "Connectivity changed");
        }
        self.publish_status().await;
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Records the initial connectivity, evicts stale captures and flushes
    /// if online.
    ///
    /// Eviction failures are logged, never returned.
    pub async fn mount(
        &self,
        online: bool,
        cancel: &CancellationToken,
    ) -> SyncResult<Option<FlushReport>> {
        match self.queue.evict_older_than(self.settings.eviction_days).await {
            Ok(0) => {}
            Ok(evicted) => info!(evicted, days = self.settings.eviction_days, "Evicted stale captures"),
            Err(e) => warn!(error = %e, "Eviction failed"),
        }

        self.set_online(online).await;

        if online {
            self.flush(cancel).await.map(Some)
        } else {
            Ok(None)
        }
    }

    /// Applies a connectivity event. Only `Online` triggers a flush.
    pub async fn handle_event(
        &self,
        event: ConnectivityEvent,
        cancel: &CancellationToken,
    ) -> SyncResult<Option<FlushReport>> {
        match event {
            ConnectivityEvent::Online => {
                self.set_online(true).await;
                self.flush(cancel).await.map(Some)
            }
            ConnectivityEvent::Offline => {
                self.set_online(false).await;
                Ok(None)
            }
        }
    }

    // =========================================================================
    // Flush
    // =========================================================================

    /// Probes the backend and, if reachable, marks every unsynced capture
    /// synced.
    ///
    /// ## Returns
    /// * `Ok(report)` - probe healthy, `report.synced` records flipped
    /// * `Err(SyncError::ProbeFailed)` - probe failed, queue untouched
    /// * `Err(SyncError::Cancelled)` - cancelled before marking
    pub async fn flush(&self, cancel: &CancellationToken) -> SyncResult<FlushReport> {
        let _guard = self.flush_lock.lock().await;

        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let probed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SyncError::Cancelled),
            result = self.probe.probe() => result,
        };

        if let Err(e) = probed {
            warn!(error = %e, "Sync probe failed, captures stay queued");
            self.emitter.emit_error(&e.to_string(), e.is_retryable());
            return Err(e);
        }

        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let report = match self.mark_all_synced().await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Flush failed while marking captures");
                self.emitter.emit_error(&e.to_string(), e.is_retryable());
                return Err(e);
            }
        };

        self.state.write().await.last_sync = Some(report.at);

        info!(
            synced = report.synced,
            availability_captures = report.availability_captures,
            product_fetches = report.product_fetches,
            "Flush complete"
        );

        self.emitter.emit_flushed(&report);
        self.publish_status().await;

        Ok(report)
    }

    async fn mark_all_synced(&self) -> SyncResult<FlushReport> {
        let mut report = FlushReport {
            synced: 0,
            availability_captures: 0,
            product_fetches: 0,
            at: Utc::now(),
        };

        for collection in Collection::ALL {
            let pending = self.queue.list_unsynced(collection).await?;
            if pending.is_empty() {
                continue;
            }

            let mut ids = Vec::with_capacity(pending.len());
            for capture in pending {
                match capture.payload {
                    CapturePayload::AvailabilityCapture(_) => report.availability_captures += 1,
                    CapturePayload::ProductFetch(_) => report.product_fetches += 1,
                }
                ids.push(capture.id);
            }

            let marked = self.queue.mark_synced(collection, &ids).await?;
            debug!(collection = %collection, marked, "Marked captures synced");
            report.synced += marked;
        }

        report.at = Utc::now();
        Ok(report)
    }

    // =========================================================================
    // Background Loop
    // =========================================================================

    /// Consumes connectivity events until `cancel` fires or every sender
    /// is dropped. Flush failures are logged and the loop keeps going.
    pub async fn run(
        self: Arc<Self>,
        mut events: mpsc::Receiver<ConnectivityEvent>,
        cancel: CancellationToken,
    ) {
        info!("Sync coordinator started");

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("Sync coordinator received shutdown");
                    break;
                }

                event = events.recv() => match event {
                    Some(event) => {
                        debug!(?event, "Connectivity event");
                        if let Err(e) = self.handle_event(event, &cancel).await {
                            warn!(error = %e, "Connectivity event handling failed");
                        }
                    }
                    None => break,
                },
            }
        }

        info!("Sync coordinator stopped");
    }

    /// Spawns [`run`](Self::run) and returns the event sender.
    pub fn spawn(
        self: &Arc<Self>,
        cancel: CancellationToken,
    ) -> (mpsc::Sender<ConnectivityEvent>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(16);
        let task = tokio::spawn(Arc::clone(self).run(rx, cancel));
        (tx, task)
    }
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
