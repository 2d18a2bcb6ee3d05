//! Entry point used by the auction catalog and the process bootstrap.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use gavel_core::{AppConfig, Auction};
use gavel_db::{AuctionRow, DbError};

use crate::executor::CloseExecutor;
use crate::policy;
use crate::registry::TimerRegistry;
use crate::sweeper::ExpirySweeper;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Owns the scheduler's moving parts and wires the two close paths
/// together: the per-auction one-shot timer armed at creation, and the
/// periodic sweep started by [`start_monitor`].
///
/// [`start_monitor`]: AuctionService::start_monitor
pub struct AuctionService {
    pool: PgPool,
    registry: Arc<TimerRegistry>,
    executor: CloseExecutor,
    sweep_interval: Duration,
}

impl AuctionService {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let executor = CloseExecutor::new(pool.clone());
        Self {
            pool,
            registry: Arc::new(TimerRegistry::new()),
            executor,
            sweep_interval: Duration::from_millis(1_000),
        }
    }

    #[must_use]
    pub fn from_config(pool: PgPool, config: &AppConfig) -> Self {
        let executor =
            CloseExecutor::with_timeout(pool.clone(), Duration::from_secs(config.close_timeout_secs));
        Self {
            pool,
            registry: Arc::new(TimerRegistry::new()),
            executor,
            sweep_interval: Duration::from_millis(config.sweep_interval_ms),
        }
    }

    /// The registry holding pending close timers. Exposed so the bootstrap
    /// can schedule the periodic stale-handle cleanup against it.
    #[must_use]
    pub fn timer_registry(&self) -> &Arc<TimerRegistry> {
        &self.registry
    }

    /// Persists a new auction and arranges its future auto-close.
    ///
    /// Arming the timer is pure in-memory bookkeeping — it never talks to
    /// the store and never fails the call. Should the timer be lost (the
    /// process restarts before it fires), the expiry sweeper recovers the
    /// auction on a later tick.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Db`] only if the initial persistence fails,
    /// in which case the auction was not created and no auto-close is
    /// armed; the caller may retry the whole operation.
    pub async fn create_auction(&self, auction: Auction) -> Result<AuctionRow, ServiceError> {
        let row = gavel_db::insert_auction(&self.pool, &auction).await?;
        self.arm_close_timer(&row);
        Ok(row)
    }

    /// Registers the one-shot close timer for a persisted auction.
    ///
    /// Fires at `started_at + auction_duration()`; a window that already
    /// elapsed fires immediately. The callback deregisters its own handle
    /// first, then runs the conditional close outside the registry lock.
    fn arm_close_timer(&self, row: &AuctionRow) {
        let delay = close_delay(row.started_at, policy::auction_duration(), Utc::now().timestamp());
        let id = row.id;
        let registry = Arc::clone(&self.registry);
        let executor = self.executor.clone();

        self.registry.register(id, delay, move || async move {
            registry.deregister(id);
            executor.close_if_active(id).await;
        });
    }

    /// Starts the expiry sweeper loop on a background task and returns
    /// immediately.
    ///
    /// The loop runs until [`MonitorHandle::shutdown`] is called (or the
    /// handle is dropped). Pending one-shot timers are not cancelled on
    /// shutdown; one may still fire while the process exits, and its store
    /// call failing silently at that point is harmless because a future
    /// process's sweeper recovers the record.
    #[must_use]
    pub fn start_monitor(&self) -> MonitorHandle {
        let (shutdown, signal) = watch::channel(false);
        let sweeper =
            ExpirySweeper::with_interval(self.pool.clone(), self.executor.clone(), self.sweep_interval);
        let task = tokio::spawn(sweeper.run(signal));
        MonitorHandle { shutdown, task }
    }
}

/// Running sweeper loop, stoppable through its watch channel.
pub struct MonitorHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Signals cancellation and waits for the loop to exit. The sweeper
    /// observes the signal within one tick and performs no further store
    /// operations afterwards.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "expiry sweeper task ended abnormally");
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Remaining wait before an auction started at `started_at` (epoch seconds)
/// should close, clamped to zero for windows that already elapsed.
fn close_delay(started_at: i64, duration: Duration, now: i64) -> Duration {
    let secs = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
    let fire_at = started_at.saturating_add(secs);
    let remaining = fire_at.saturating_sub(now);
    u64::try_from(remaining).map_or(Duration::ZERO, Duration::from_secs)
}
