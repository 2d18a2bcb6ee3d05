//! In-memory bookkeeping for pending one-shot close timers.
//!
//! The registry owns the only shared mutable state in the scheduler: a map
//! from auction id to the handle of its pending deferred close. Absence of
//! a handle for an active auction is a normal condition — the process may
//! have restarted, or registration may have been skipped — and the expiry
//! sweeper recovers such auctions on its next tick.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

struct TimerHandle {
    task: JoinHandle<()>,
    fire_at: Instant,
}

/// Mutex-guarded map of pending close timers.
///
/// Critical sections cover map mutation only; the close mutation itself
/// always runs on the spawned task, outside the lock, so a close in flight
/// never blocks registration of new timers.
#[derive(Default)]
pub struct TimerRegistry {
    timers: Mutex<HashMap<Uuid, TimerHandle>>,
}

impl TimerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `on_fire` to run after `delay` and stores the handle under
    /// `id`.
    ///
    /// Registration is a pure in-memory operation and never fails. An
    /// auction has at most one live timer: if an entry for `id` already
    /// exists, the new registration wins and the superseded task is
    /// aborted.
    ///
    /// The callback is responsible for calling [`deregister`] on itself
    /// before doing its work; handles whose callback forgot are reclaimed
    /// by [`sweep_stale`].
    ///
    /// [`deregister`]: TimerRegistry::deregister
    /// [`sweep_stale`]: TimerRegistry::sweep_stale
    pub fn register<F, Fut>(&self, id: Uuid, delay: Duration, on_fire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let now = Instant::now();
        // A delay too large to represent saturates; the handle's fire time is
        // informational only.
        let fire_at = now.checked_add(delay).unwrap_or(now);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire().await;
        });

        let previous = {
            let mut timers = self.lock();
            timers.insert(id, TimerHandle { task, fire_at })
        };
        if let Some(previous) = previous {
            // Last-writer-wins: stop the superseded timer outside the lock.
            previous.task.abort();
            tracing::debug!(auction_id = %id, "replaced pending close timer");
        } else {
            tracing::debug!(auction_id = %id, delay_secs = delay.as_secs(), "registered close timer");
        }
    }

    /// Removes the handle for `id` without stopping the underlying task.
    ///
    /// Called from within the fire callback itself to signal "this timer
    /// has completed". Returns `true` if a handle was present.
    pub fn deregister(&self, id: Uuid) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Drops handles whose task has already finished but failed to
    /// deregister. Returns the number of handles reclaimed.
    ///
    /// Leak prevention, not a correctness requirement; scheduled on a long
    /// period (hourly) by the daemon.
    pub fn sweep_stale(&self) -> usize {
        let mut timers = self.lock();
        let before = timers.len();
        timers.retain(|_, handle| !handle.task.is_finished());
        before - timers.len()
    }

    /// Number of handles currently held, fired-but-stale ones included.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Scheduled fire instant of the pending timer for `id`, if any.
    #[must_use]
    pub fn fire_at(&self, id: Uuid) -> Option<Instant> {
        self.lock().get(&id).map(|handle| handle.fire_at)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, TimerHandle>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;

    fn flag_setter(flag: &Arc<AtomicBool>) -> impl FnOnce() -> futures::future::Ready<()> {
        let flag = Arc::clone(flag);
        move || {
            flag.store(true, Ordering::SeqCst);
            futures::future::ready(())
        }
    }

    #[tokio::test]
    async fn timer_fires_after_delay() {
        let registry = Arc::new(TimerRegistry::new());
        let fired = Arc::new(AtomicBool::new(false));
        let id = Uuid::new_v4();

        registry.register(id, Duration::from_millis(20), flag_setter(&fired));
        assert!(registry.fire_at(id).is_some());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(fired.load(Ordering::SeqCst), "callback did not run");
    }

    #[tokio::test]
    async fn fire_callback_can_deregister_itself() {
        let registry = Arc::new(TimerRegistry::new());
        let fired = Arc::new(AtomicBool::new(false));
        let id = Uuid::new_v4();

        let callback_registry = Arc::clone(&registry);
        let callback_fired = Arc::clone(&fired);
        registry.register(id, Duration::from_millis(20), move || async move {
            callback_registry.deregister(id);
            callback_fired.store(true, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(fired.load(Ordering::SeqCst));
        assert_eq!(registry.pending(), 0, "callback should have deregistered");
    }

    #[tokio::test]
    async fn registration_replaces_previous_timer() {
        let registry = Arc::new(TimerRegistry::new());
        let first = Arc::new(AtomicBool::new(false));
        let second = Arc::new(AtomicBool::new(false));
        let id = Uuid::new_v4();

        registry.register(id, Duration::from_secs(3600), flag_setter(&first));
        registry.register(id, Duration::from_millis(20), flag_setter(&second));
        assert_eq!(registry.pending(), 1, "one live timer per auction");

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(second.load(Ordering::SeqCst), "replacement timer must fire");
        assert!(!first.load(Ordering::SeqCst), "superseded timer must not fire");
    }

    #[tokio::test]
    async fn deregister_does_not_stop_the_task() {
        let registry = Arc::new(TimerRegistry::new());
        let fired = Arc::new(AtomicBool::new(false));
        let id = Uuid::new_v4();

        registry.register(id, Duration::from_millis(20), flag_setter(&fired));
        assert!(registry.deregister(id));
        assert_eq!(registry.pending(), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(
            fired.load(Ordering::SeqCst),
            "deregister removes bookkeeping only; the deferred action still runs"
        );
    }

    #[tokio::test]
    async fn sweep_stale_reclaims_fired_handles() {
        let registry = Arc::new(TimerRegistry::new());
        let fired = Arc::new(AtomicBool::new(false));
        let id = Uuid::new_v4();

        // Callback that "forgets" to deregister.
        registry.register(id, Duration::from_millis(20), flag_setter(&fired));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(fired.load(Ordering::SeqCst));
        assert_eq!(registry.pending(), 1, "stale handle should linger");

        assert_eq!(registry.sweep_stale(), 1);
        assert_eq!(registry.pending(), 0);
    }

    #[tokio::test]
    async fn sweep_stale_keeps_pending_timers() {
        let registry = Arc::new(TimerRegistry::new());
        let fired = Arc::new(AtomicBool::new(false));

        registry.register(Uuid::new_v4(), Duration::from_secs(3600), flag_setter(&fired));
        assert_eq!(registry.sweep_stale(), 0);
        assert_eq!(registry.pending(), 1);
    }
}
