//! Idempotent conditional close against the store.

use std::time::Duration;

use sqlx::PgPool;
use uuid::Uuid;

const DEFAULT_CLOSE_TIMEOUT_SECS: u64 = 5;

/// Result of a single close attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// This call performed the `active` → `completed` transition.
    Closed,
    /// Zero rows modified: the auction was already completed, still `new`,
    /// or no longer exists. The expected outcome when the one-shot timer
    /// and the sweeper race on the same record.
    AlreadyClosed,
    /// The store operation failed or timed out. Logged and swallowed; the
    /// record stays `active` and overdue, so the next sweep tick retries.
    Failed,
}

/// Performs the conditional store mutation "set status to completed if
/// currently active" under a bounded deadline.
///
/// Both callers (timer fire, sweep loop) are background tasks with no
/// synchronous client waiting on the result, so no outcome here is ever a
/// hard fault.
#[derive(Clone)]
pub struct CloseExecutor {
    pool: PgPool,
    op_timeout: Duration,
}

impl CloseExecutor {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            op_timeout: Duration::from_secs(DEFAULT_CLOSE_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_timeout(pool: PgPool, op_timeout: Duration) -> Self {
        Self { pool, op_timeout }
    }

    /// Attempts the conditional close and reports what happened.
    pub async fn close_if_active(&self, id: Uuid) -> CloseOutcome {
        let attempt = gavel_db::close_auction_if_active(&self.pool, id);
        match tokio::time::timeout(self.op_timeout, attempt).await {
            Ok(Ok(true)) => {
                tracing::info!(auction_id = %id, "auction closed automatically");
                CloseOutcome::Closed
            }
            Ok(Ok(false)) => {
                tracing::debug!(auction_id = %id, "auction already closed; nothing to do");
                CloseOutcome::AlreadyClosed
            }
            Ok(Err(e)) => {
                tracing::error!(auction_id = %id, error = %e, "failed to close auction");
                CloseOutcome::Failed
            }
            Err(_) => {
                tracing::error!(
                    auction_id = %id,
                    timeout_secs = self.op_timeout.as_secs(),
                    "close attempt timed out"
                );
                CloseOutcome::Failed
            }
        }
    }
}
