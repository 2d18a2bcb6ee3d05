//! Live integration tests for gavel-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/gavel-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use chrono::Utc;
use futures::StreamExt;
use gavel_core::{Auction, ProductCondition};
use gavel_db::{
    close_auction_if_active, get_auction, insert_auction, list_auctions, stream_expired_auctions,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_auction(product_name: &str) -> Auction {
    Auction::new(product_name, "electronics", "test listing", ProductCondition::Used)
}

/// Insert an auction whose bidding window started `age_secs` seconds ago.
async fn insert_aged_auction(pool: &sqlx::PgPool, product_name: &str, age_secs: i64) -> Uuid {
    let mut auction = make_auction(product_name);
    auction.started_at = Utc::now().timestamp() - age_secs;
    let row = insert_auction(pool, &auction)
        .await
        .unwrap_or_else(|e| panic!("insert_aged_auction failed for '{product_name}': {e}"));
    row.id
}

// ---------------------------------------------------------------------------
// Section 1: Create / read
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn insert_and_get_round_trip(pool: sqlx::PgPool) {
    let auction = make_auction("Record player");
    let inserted = insert_auction(&pool, &auction).await.expect("insert failed");

    assert_eq!(inserted.id, auction.id);
    assert_eq!(inserted.status, "active");
    assert_eq!(inserted.condition, "used");
    assert_eq!(inserted.started_at, auction.started_at);

    let fetched = get_auction(&pool, auction.id).await.expect("get failed");
    assert_eq!(fetched.product_name, "Record player");
    assert_eq!(fetched.status, "active");
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_missing_auction_is_not_found(pool: sqlx::PgPool) {
    let result = get_auction(&pool, Uuid::new_v4()).await;
    assert!(matches!(result, Err(gavel_db::DbError::NotFound)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_returns_most_recent_first(pool: sqlx::PgPool) {
    insert_aged_auction(&pool, "first", 0).await;
    insert_aged_auction(&pool, "second", 0).await;

    let rows = list_auctions(&pool, 10).await.expect("list failed");
    assert_eq!(rows.len(), 2);
}

// ---------------------------------------------------------------------------
// Section 2: Conditional close
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn close_is_idempotent(pool: sqlx::PgPool) {
    let id = insert_aged_auction(&pool, "Espresso machine", 60).await;

    let first = close_auction_if_active(&pool, id).await.expect("first close failed");
    let second = close_auction_if_active(&pool, id).await.expect("second close failed");

    assert!(first, "first close must perform the transition");
    assert!(!second, "second close must be a no-op");

    let row = get_auction(&pool, id).await.expect("get failed");
    assert_eq!(row.status, "completed");
}

#[sqlx::test(migrations = "../../migrations")]
async fn close_of_missing_auction_is_noop(pool: sqlx::PgPool) {
    let modified = close_auction_if_active(&pool, Uuid::new_v4())
        .await
        .expect("close failed");
    assert!(!modified);
}

// ---------------------------------------------------------------------------
// Section 3: Expiry stream
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn stream_matches_only_overdue_active_auctions(pool: sqlx::PgPool) {
    let overdue = insert_aged_auction(&pool, "overdue", 3600).await;
    let fresh = insert_aged_auction(&pool, "fresh", 0).await;
    let closed = insert_aged_auction(&pool, "closed", 3600).await;
    close_auction_if_active(&pool, closed).await.expect("close failed");

    let cutoff = Utc::now().timestamp() - 10;
    let mut matched = Vec::new();
    {
        let mut stream = stream_expired_auctions(&pool, cutoff);
        while let Some(row) = stream.next().await {
            matched.push(row.expect("row decode failed").id);
        }
    }

    assert_eq!(matched, vec![overdue]);
    assert!(!matched.contains(&fresh));
}

#[sqlx::test(migrations = "../../migrations")]
async fn stream_is_empty_when_nothing_overdue(pool: sqlx::PgPool) {
    insert_aged_auction(&pool, "fresh", 0).await;

    let cutoff = Utc::now().timestamp() - 10;
    let count = stream_expired_auctions(&pool, cutoff).count().await;
    assert_eq!(count, 0);
}
