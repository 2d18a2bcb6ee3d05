//! Background job scheduler for coarse periodic maintenance.
//!
//! Initialises a [`JobScheduler`] at daemon startup and registers the
//! timer-registry cleanup job. The fine-grained expiry sweep is not a cron
//! job — it runs on its own interval loop inside `gavel-expiry`.

use std::sync::Arc;

use gavel_expiry::TimerRegistry;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    registry: Arc<TimerRegistry>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_timer_cleanup_job(&scheduler, registry).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the hourly timer-registry cleanup job.
///
/// Runs at the top of every hour by default (`0 0 * * * *`) and can be
/// overridden with `GAVEL_TIMER_CLEANUP_CRON`. Reclaims handles whose
/// one-shot close timer fired but failed to deregister — a leak-prevention
/// safety net, not a correctness requirement, hence the long period.
async fn register_timer_cleanup_job(
    scheduler: &JobScheduler,
    registry: Arc<TimerRegistry>,
) -> Result<(), JobSchedulerError> {
    let cron =
        std::env::var("GAVEL_TIMER_CLEANUP_CRON").unwrap_or_else(|_| "0 0 * * * *".to_string());

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let registry = Arc::clone(&registry);

        Box::pin(async move {
            let reclaimed = registry.sweep_stale();
            if reclaimed > 0 {
                tracing::info!(reclaimed, "scheduler: reclaimed stale close-timer handles");
            } else {
                tracing::debug!("scheduler: no stale close-timer handles");
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered timer cleanup job");
    Ok(())
}
