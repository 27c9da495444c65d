//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring search-cache purge.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, a
/// job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(pool: PgPool) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_cache_purge_job(&scheduler, pool).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the hourly search-cache purge (`0 10 * * * *`, ten past the hour).
///
/// Expired rows stop being served immediately on read; the purge only keeps
/// the table from growing without bound.
async fn register_cache_purge_job(
    scheduler: &JobScheduler,
    pool: PgPool,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async("0 10 * * * *", move |_uuid, _lock| {
        let pool = Arc::clone(&pool);

        Box::pin(async move {
            match dreamwell_db::purge_expired_search_cache(&pool).await {
                Ok(0) => {}
                Ok(purged) => {
                    tracing::info!(purged, "scheduler: purged expired search-cache rows");
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: search-cache purge failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
