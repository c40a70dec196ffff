//! # stockscan-db: Offline Queue Storage
//!
//! Durable local storage for user actions captured while the device is
//! offline. It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        stockscan Data Flow                              │
//! │                                                                         │
//! │  Scanner app (offline capture)      SyncCoordinator (flush)            │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockscan-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────────┐  ┌─────────────┐  │   │
//! │  │   │   Database    │    │   Repositories    │  │ Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │    (queue.rs)     │  │ (embedded)  │  │   │
//! │  │   │               │    │                   │  │             │  │   │
//! │  │   │ SqlitePool    │◄───│ OfflineQueue-     │  │ 001_offline │  │   │
//! │  │   │ WAL mode      │    │   Repository      │  │   _queue    │  │   │
//! │  │   └───────────────┘    └───────────────────┘  └─────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   SQLite: availability_captures, product_fetches               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Opening the queue database (file or in-memory)
//! - `migrations` - Embedded queue schema, applied on open
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockscan_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/stockscan.db")).await?;
//!
//! let queue = db.offline_queue();
//! let unsynced = queue.list_unsynced(Collection::ProductFetches).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, QueueLocation};

pub use repository::queue::OfflineQueueRepository;
