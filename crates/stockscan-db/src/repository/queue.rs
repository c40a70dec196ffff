//! # Offline Queue Repository
//!
//! Durable keyed collections of user actions captured while offline.
//!
//! ## Collections
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Offline Queue Layout                                 │
//! │                                                                         │
//! │  availability-captures  (table availability_captures)                  │
//! │  ├── id      fresh UUID v4 per capture, never collapses                │
//! │  ├── ts      epoch ms                                                  │
//! │  ├── payload {"type":"AvailabilityCapture","payload":{...}}            │
//! │  └── synced  0 → 1                                                     │
//! │                                                                         │
//! │  product-fetches        (table product_fetches)                        │
//! │  ├── id      internal SKU, re-enqueue overwrites ts + payload          │
//! │  ├── ts      epoch ms                                                  │
//! │  ├── payload {"type":"ProductFetch","payload":{...}}                   │
//! │  └── synced  0 → 1                                                     │
//! │                                                                         │
//! │  Both tables are indexed on `synced` for the unsynced scan.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write Discipline
//! Every write runs in its own transaction, so a concurrent flush and a
//! capture can never interleave a partial read-modify-write. `synced` only
//! ever moves from 0 to 1; no statement here writes 0 to an existing row.

use chrono::{DateTime, TimeDelta, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockscan_core::validation::{validate_location_id, validate_sku};
use stockscan_core::{
    AvailabilityCapture, CapturePayload, Collection, CoreError, PendingCapture, ProductFetch,
};

/// Raw row shape shared by both collection tables.
#[derive(Debug, sqlx::FromRow)]
struct CaptureRow {
    id: String,
    ts: i64,
    payload: String,
    synced: i64,
}

/// Table backing a collection.
fn table(collection: Collection) -> &'static str {
    match collection {
        Collection::AvailabilityCaptures => "availability_captures",
        Collection::ProductFetches => "product_fetches",
    }
}

fn decode(collection: Collection, row: CaptureRow) -> DbResult<PendingCapture> {
    let payload: CapturePayload = serde_json::from_str(&row.payload)
        .map_err(|e| DbError::invalid_payload(collection.name(), &row.id, e))?;
    payload.ensure_collection(collection)?;

    let ts = DateTime::<Utc>::from_timestamp_millis(row.ts).ok_or_else(|| {
        DbError::QueryFailed(format!("timestamp out of range in {collection}/{}", row.id))
    })?;

    Ok(PendingCapture {
        id: row.id,
        ts,
        payload,
        synced: row.synced != 0,
    })
}

fn encode(collection: Collection, id: &str, payload: &CapturePayload) -> DbResult<String> {
    serde_json::to_string(payload).map_err(|e| DbError::invalid_payload(collection.name(), id, e))
}

/// Repository for the offline capture queue.
#[derive(Debug, Clone)]
pub struct OfflineQueueRepository {
    pool: SqlitePool,
}

impl OfflineQueueRepository {
    /// Creates a new OfflineQueueRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OfflineQueueRepository { pool }
    }

    // =========================================================================
    // Enqueue
    // =========================================================================

    /// Queues an availability capture under a fresh id.
    ///
    /// Two captures are always two records, even with identical payloads.
    pub async fn enqueue_availability_capture(
        &self,
        capture: AvailabilityCapture,
    ) -> DbResult<PendingCapture> {
        validate_sku(&capture.sku).map_err(CoreError::from)?;
        validate_location_id(&capture.location_id).map_err(CoreError::from)?;

        let collection = Collection::AvailabilityCaptures;
        let id = Uuid::new_v4().to_string();
        let ts = Utc::now();
        let payload = CapturePayload::AvailabilityCapture(capture);
        let json = encode(collection, &id, &payload)?;

        debug!(id = %id, sku = %payload.sku(), "Queuing availability capture");

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO availability_captures (id, ts, payload, synced)
            VALUES (?1, ?2, ?3, 0)
            "#,
        )
        .bind(&id)
        .bind(ts.timestamp_millis())
        .bind(&json)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(PendingCapture {
            id,
            ts,
            payload,
            synced: false,
        })
    }

    /// Queues a product fetch keyed by its SKU.
    ///
    /// Re-enqueueing a SKU that is already queued refreshes the stored
    /// timestamp and payload in place; its `synced` flag is left as is.
    pub async fn enqueue_product_fetch(&self, fetch: ProductFetch) -> DbResult<PendingCapture> {
        let sku = validate_sku(&fetch.sku)
            .map_err(CoreError::from)?
            .to_string();
        validate_location_id(&fetch.location_id).map_err(CoreError::from)?;

        let collection = Collection::ProductFetches;
        let ts = Utc::now();
        let payload = CapturePayload::ProductFetch(ProductFetch { sku: sku.clone(), ..fetch });
        let json = encode(collection, &sku, &payload)?;

        debug!(sku = %sku, "Queuing product fetch");

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO product_fetches (id, ts, payload, synced)
            VALUES (?1, ?2, ?3, 0)
            ON CONFLICT(id) DO UPDATE SET
                ts = excluded.ts,
                payload = excluded.payload
            "#,
        )
        .bind(&sku)
        .bind(ts.timestamp_millis())
        .bind(&json)
        .execute(&mut *tx)
        .await?;

        let synced: i64 = sqlx::query_scalar("SELECT synced FROM product_fetches WHERE id = ?1")
            .bind(&sku)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(PendingCapture {
            id: sku,
            ts,
            payload,
            synced: synced != 0,
        })
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// All records of `collection` with `synced = 0`, oldest first.
    pub async fn list_unsynced(&self, collection: Collection) -> DbResult<Vec<PendingCapture>> {
        let sql = format!(
            "SELECT id, ts, payload, synced FROM {} WHERE synced = 0 ORDER BY ts ASC, id ASC",
            table(collection)
        );

        let rows = sqlx::query_as::<_, CaptureRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|row| decode(collection, row)).collect()
    }

    /// One record by id.
    pub async fn get(&self, collection: Collection, id: &str) -> DbResult<Option<PendingCapture>> {
        let sql = format!(
            "SELECT id, ts, payload, synced FROM {} WHERE id = ?1",
            table(collection)
        );

        let row = sqlx::query_as::<_, CaptureRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| decode(collection, row)).transpose()
    }

    /// Counts unsynced records in `collection`.
    pub async fn count_unsynced(&self, collection: Collection) -> DbResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE synced = 0", table(collection));
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    // =========================================================================
    // Sync State
    // =========================================================================

    /// Flips `synced` to true for each named id, all or nothing.
    ///
    /// Ids that do not exist are skipped. Returns the number of records that
    /// were flipped by this call (already-synced records are not counted).
    pub async fn mark_synced(&self, collection: Collection, ids: &[String]) -> DbResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let select = format!("SELECT synced FROM {} WHERE id = ?1", table(collection));
        let update = format!("UPDATE {} SET synced = 1 WHERE id = ?1", table(collection));

        let mut tx = self.pool.begin().await?;
        let mut flipped = 0u64;

        for id in ids {
            let current: Option<i64> = sqlx::query_scalar(&select)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

            match current {
                None => debug!(collection = %collection, id = %id, "Skipping unknown id"),
                Some(0) => {
                    sqlx::query(&update).bind(id).execute(&mut *tx).await?;
                    flipped += 1;
                }
                Some(_) => {}
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(collection = %collection, flipped, "Marked records synced");
        Ok(flipped)
    }

    // =========================================================================
    // Housekeeping
    // =========================================================================

    /// Deletes records older than `days` from every collection.
    ///
    /// Returns the number of records deleted. A window reaching past the
    /// earliest representable time deletes nothing.
    pub async fn evict_older_than(&self, days: u32) -> DbResult<u64> {
        let Some(cutoff) = TimeDelta::try_days(i64::from(days))
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            debug!(days, "Eviction window out of range, nothing to evict");
            return Ok(0);
        };
        let cutoff = cutoff.timestamp_millis();

        let mut tx = self.pool.begin().await?;
        let mut deleted = 0u64;

        for collection in Collection::ALL {
            let sql = format!("DELETE FROM {} WHERE ts < ?1", table(collection));
            deleted += sqlx::query(&sql)
                .bind(cutoff)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        if deleted > 0 {
            info!(deleted, days, "Evicted stale captures");
        }
        Ok(deleted)
    }

    /// Wipes a collection. Only for an explicit user-triggered data reset.
    pub async fn clear(&self, collection: Collection) -> DbResult<u64> {
        let sql = format!("DELETE FROM {}", table(collection));

        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query(&sql).execute(&mut *tx).await?.rows_affected();
        tx.commit().await?;

        info!(collection = %collection, deleted, "Cleared collection");
        Ok(deleted)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
