//! Command implementations for auction management.

use anyhow::Context;
use uuid::Uuid;

use gavel_core::{Auction, ProductCondition};
use gavel_expiry::AuctionService;

/// Persist a new auction through the service facade (arming its one-shot
/// close timer) and print the created record.
///
/// The timer dies with this short-lived process; the daemon's sweeper
/// closes the auction once its window elapses.
pub async fn create(
    pool: sqlx::PgPool,
    product_name: String,
    category: String,
    description: String,
    condition: String,
) -> anyhow::Result<()> {
    let condition: ProductCondition = condition
        .parse()
        .with_context(|| format!("invalid condition '{condition}' (new | used | refurbished)"))?;

    let service = AuctionService::new(pool);
    let row = service
        .create_auction(Auction::new(product_name, category, description, condition))
        .await
        .context("failed to create auction")?;

    println!("created auction {} (closes after the configured window)", row.id);
    Ok(())
}

/// Fetch one auction and print it as JSON.
pub async fn get(pool: sqlx::PgPool, id: Uuid) -> anyhow::Result<()> {
    let row = gavel_db::get_auction(&pool, id)
        .await
        .with_context(|| format!("auction {id} not found"))?;
    println!("{}", render(&row)?);
    Ok(())
}

/// List the most recent auctions.
pub async fn list(pool: sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let rows = gavel_db::list_auctions(&pool, limit)
        .await
        .context("failed to list auctions")?;
    if rows.is_empty() {
        println!("no auctions");
        return Ok(());
    }
    for row in &rows {
        println!(
            "{}  {:<12} {:<24} started_at={}",
            row.id, row.status, row.product_name, row.started_at
        );
    }
    Ok(())
}

/// Manually drive the conditional close for one auction.
pub async fn close(pool: sqlx::PgPool, id: Uuid) -> anyhow::Result<()> {
    let modified = gavel_db::close_auction_if_active(&pool, id)
        .await
        .context("failed to close auction")?;
    if modified {
        println!("auction {id} closed");
    } else {
        println!("auction {id} was not active; nothing to do");
    }
    Ok(())
}

fn render(row: &gavel_db::AuctionRow) -> anyhow::Result<String> {
    let value = serde_json::json!({
        "id": row.id,
        "product_name": row.product_name,
        "category": row.category,
        "description": row.description,
        "condition": row.condition,
        "status": row.status,
        "started_at": row.started_at,
        "created_at": row.created_at,
        "updated_at": row.updated_at,
    });
    serde_json::to_string_pretty(&value).context("failed to render auction")
}
