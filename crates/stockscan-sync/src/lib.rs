//! # stockscan-sync: Connectivity and Queue Reconciliation
//!
//! Watches connectivity and reconciles the offline capture queue once the
//! backend answers again. Also owns the scanner's configuration file.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Architecture                                │
//! │                                                                         │
//! │  platform online/offline ──► mpsc ──► SyncCoordinator::run              │
//! │                                            │                            │
//! │                      ┌─────────────────────┼──────────────────┐         │
//! │                      ▼                     ▼                  ▼         │
//! │            ┌──────────────────┐  ┌──────────────────┐  ┌────────────┐   │
//! │            │ ReachabilityProbe│  │ OfflineQueue     │  │ SyncEvent  │   │
//! │            │ GET health URL   │  │ list / mark /    │  │ Emitter    │   │
//! │            │                  │  │ evict (SQLite)   │  │ (UI)       │   │
//! │            └──────────────────┘  └──────────────────┘  └────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`coordinator`] - `SyncCoordinator`: mount, events, flush, status
//! - [`probe`] - Reachability probe trait and HTTP implementation
//! - [`config`] - `StoreOpsConfig` (TOML + environment)
//! - [`error`] - Sync error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockscan_sync::{HttpProbe, StoreOpsConfig, SyncCoordinator};
//!
//! let config = StoreOpsConfig::load(None)?;
//! let probe = Arc::new(HttpProbe::new(
//!     transport,
//!     config.probe_url()?,
//!     config.sync.probe_timeout(),
//! ));
//! let coordinator = Arc::new(SyncCoordinator::new(db, probe, config.sync.clone()));
//!
//! coordinator.mount(true, &cancel).await?;
//! let (events, task) = coordinator.spawn(cancel.clone());
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod probe;

pub use config::{
    DatabaseSettings, StoreConfig, StoreOpsConfig, SyncSettings, MAX_EVICTION_DAYS,
};
pub use coordinator::{
    ConnectivityEvent, FlushReport, NoOpEmitter, SyncCoordinator, SyncEventEmitter, SyncStatus,
};
pub use error::{SyncError, SyncResult};
pub use probe::{HttpProbe, ReachabilityProbe};
