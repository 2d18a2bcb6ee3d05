//! Database operations for the `auctions` table.

use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use sqlx::PgPool;
use uuid::Uuid;

use gavel_core::Auction;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `auctions` table.
///
/// `status` and `condition` carry the raw persisted codes; use the
/// [`gavel_core`] enums to interpret them.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuctionRow {
    pub id: Uuid,
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub condition: String,
    pub status: String,
    /// Epoch seconds marking the start of the bidding window.
    pub started_at: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts a new auction record and returns the persisted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails. A failed insert means the
/// auction was not created; the caller may retry the whole operation.
pub async fn insert_auction(pool: &PgPool, auction: &Auction) -> Result<AuctionRow, DbError> {
    let row = sqlx::query_as::<_, AuctionRow>(
        "INSERT INTO auctions (id, product_name, category, description, condition, status, started_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, product_name, category, description, condition, status, \
                   started_at, created_at, updated_at",
    )
    .bind(auction.id)
    .bind(&auction.product_name)
    .bind(&auction.category)
    .bind(&auction.description)
    .bind(auction.condition.as_str())
    .bind(auction.status.as_str())
    .bind(auction.started_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches a single auction by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_auction(pool: &PgPool, id: Uuid) -> Result<AuctionRow, DbError> {
    let row = sqlx::query_as::<_, AuctionRow>(
        "SELECT id, product_name, category, description, condition, status, \
                started_at, created_at, updated_at \
         FROM auctions \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` auctions, ordered by `created_at DESC`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_auctions(pool: &PgPool, limit: i64) -> Result<Vec<AuctionRow>, DbError> {
    let rows = sqlx::query_as::<_, AuctionRow>(
        "SELECT id, product_name, category, description, condition, status, \
                started_at, created_at, updated_at \
         FROM auctions \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Conditionally closes an auction: `active` → `completed`.
///
/// The status guard makes the operation idempotent and safe to race — the
/// one-shot timer and the expiry sweeper can both fire for the same record
/// and exactly one of them observes a modification. Returns `true` if this
/// call performed the transition, `false` if the row was already closed,
/// still `new`, or does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn close_auction_if_active(pool: &PgPool, id: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE auctions \
         SET status = 'completed', updated_at = NOW() \
         WHERE id = $1 AND status = 'active'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Streams auctions that are still `active` but whose bidding window started
/// before `cutoff` (epoch seconds).
///
/// Returns a cursor-backed stream so the sweeper can process an unbounded
/// match set with bounded memory; the cursor is released when the stream is
/// dropped. Per-row decode failures surface as `Err` items, so callers can
/// skip malformed rows and keep iterating.
pub fn stream_expired_auctions(
    pool: &PgPool,
    cutoff: i64,
) -> BoxStream<'_, Result<AuctionRow, sqlx::Error>> {
    sqlx::query_as::<_, AuctionRow>(
        "SELECT id, product_name, category, description, condition, status, \
                started_at, created_at, updated_at \
         FROM auctions \
         WHERE status = 'active' AND started_at < $1",
    )
    .bind(cutoff)
    .fetch(pool)
}
