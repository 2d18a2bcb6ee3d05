//! Periodic safety-net sweep over persisted auction state.

use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use sqlx::PgPool;
use tokio::sync::watch;

use crate::executor::{CloseExecutor, CloseOutcome};
use crate::policy;

const DEFAULT_SWEEP_INTERVAL_MS: u64 = 1_000;

/// Epoch-seconds cutoff below which a still-active auction is overdue.
#[must_use]
pub fn expiry_cutoff(now: i64, duration: Duration) -> i64 {
    let secs = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
    now.saturating_sub(secs)
}

/// Fixed-interval loop that closes every overdue auction the store still
/// reports as `active`.
///
/// The sweep is the mandatory recovery path: it needs no in-memory state,
/// so it catches auctions whose one-shot timer was lost to a restart or a
/// failed registration. The tick interval is short (1 s by default)
/// because it bounds the worst-case closing latency for such auctions.
pub struct ExpirySweeper {
    pool: PgPool,
    executor: CloseExecutor,
    interval: Duration,
}

impl ExpirySweeper {
    #[must_use]
    pub fn new(pool: PgPool, executor: CloseExecutor) -> Self {
        Self {
            pool,
            executor,
            interval: Duration::from_millis(DEFAULT_SWEEP_INTERVAL_MS),
        }
    }

    #[must_use]
    pub fn with_interval(pool: PgPool, executor: CloseExecutor, interval: Duration) -> Self {
        Self {
            pool,
            executor,
            interval,
        }
    }

    /// Runs the sweep loop until `shutdown` flips to `true`.
    ///
    /// Cancellation is observed around the blocking wait: once signalled,
    /// the loop exits within one tick and performs no further store
    /// operations.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        tracing::info!(interval = ?self.interval, "expiry sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if *shutdown.borrow() {
                        break;
                    }
                    self.sweep_once().await;
                }
                changed = shutdown.changed() => {
                    // A dropped sender counts as cancellation too.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("expiry sweeper stopped");
    }

    /// One sweep pass. Returns the number of auctions this pass closed.
    ///
    /// An empty match set is a normal, silent outcome. Individual close
    /// failures and undecodable rows are logged and skipped; a query
    /// failure ends the pass early and the next tick is the retry.
    pub async fn sweep_once(&self) -> usize {
        let cutoff = expiry_cutoff(Utc::now().timestamp(), policy::auction_duration());
        let mut closed = 0;

        // Scope the cursor so it is released before the next tick.
        {
            let mut stream = gavel_db::stream_expired_auctions(&self.pool, cutoff);
            while let Some(item) = stream.next().await {
                match item {
                    Ok(row) => {
                        if self.executor.close_if_active(row.id).await == CloseOutcome::Closed {
                            closed += 1;
                        }
                    }
                    Err(e) => {
                        // One malformed record must not abort the sweep.
                        tracing::warn!(error = %e, "skipping undecodable auction row");
                    }
                }
            }
        }

        if closed > 0 {
            tracing::info!(closed, "expiry sweep closed overdue auctions");
        }
        closed
    }
}
