//! # Queue Database Handle
//!
//! Opens the SQLite file that backs the offline queue.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig::new(path)  or  DbConfig::in_memory()                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new ── open pool (WAL, busy timeout) ── apply migrations     │
//! │       │                                                                 │
//! │       ├──► capture path:   enqueue_availability_capture / product_fetch │
//! │       └──► SyncCoordinator: count_unsynced / mark_synced / evict        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The scanner process and its background flush may both hold a
//! connection, so writers wait on `busy_timeout` instead of failing with
//! `SQLITE_BUSY`.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::queue::OfflineQueueRepository;

/// Where the queue lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueLocation {
    File(PathBuf),
    /// Private to one pool; gone when the pool closes.
    Memory,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: QueueLocation,
    pub max_connections: u32,
    /// How long a writer waits on a locked database file.
    pub busy_timeout: Duration,
}

impl DbConfig {
    /// Queue stored in `path`; the file is created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: QueueLocation::File(path.into()),
            max_connections: 4,
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// Throwaway queue for tests.
    pub fn in_memory() -> Self {
        DbConfig {
            location: QueueLocation::Memory,
            // Each in-memory connection is its own database
            max_connections: 1,
            busy_timeout: Duration::from_secs(1),
        }
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.location {
            QueueLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal),
            QueueLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
        };

        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the offline queue database.
///
/// Built once by the application root and cloned into whoever needs the
/// queue; clones share one pool.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new(path)).await?;
/// let coordinator = SyncCoordinator::new(db.clone(), probe, config.sync.clone());
/// db.offline_queue().enqueue_product_fetch(fetch).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and applies pending migrations.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let options = config.connect_options()?;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            // Keeps an in-memory queue alive between calls
            .min_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        migrations::run_migrations(&pool).await?;

        match &config.location {
            QueueLocation::File(path) => {
                info!(path = %path.display(), "Offline queue database ready")
            }
            QueueLocation::Memory => info!("In-memory offline queue ready"),
        }

        Ok(Database { pool })
    }

    /// Raw pool, for migration status and test fixtures.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn offline_queue(&self) -> OfflineQueueRepository {
        OfflineQueueRepository::new(self.pool.clone())
    }

    /// Waits for in-flight queries, then closes every connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_queue_has_both_collections() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        for table in ["availability_captures", "product_fetches"] {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            )
            .bind(table)
            .fetch_one(db.pool())
            .await
            .unwrap();
            assert_eq!(count, 1, "missing table {table}");
        }
    }

    #[tokio::test]
    async fn test_file_queue_survives_reopen() {
        let path = std::env::temp_dir().join(format!(
            "stockscan-pool-{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        sqlx::query(
            "INSERT INTO product_fetches (id, payload, ts, synced) VALUES ('1042-123456', '{}', 0, 0)",
        )
        .execute(db.pool())
        .await
        .unwrap();
        db.close().await;

        let reopened = Database::new(DbConfig::new(&path)).await.unwrap();
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_fetches")
            .fetch_one(reopened.pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);

        reopened.close().await;
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_in_memory_uses_single_connection() {
        let config = DbConfig::in_memory();
        assert_eq!(config.location, QueueLocation::Memory);
        assert_eq!(config.max_connections, 1);
    }
}
