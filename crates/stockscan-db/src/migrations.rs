//! Embedded schema for the offline queue.
//!
//! Files live in the workspace `migrations/sqlite/` directory and are
//! compiled into the binary, so a fresh device gets its tables on the
//! first `Database::new`. Applied versions are tracked in
//! `_sqlx_migrations`; add a new `NNN_description.sql` rather than
//! editing a shipped one.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies any migration this device has not seen yet.
pub(crate) async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    debug!(known = MIGRATOR.migrations.len(), "Queue schema up to date");
    Ok(())
}
