//! Cron-driven full sync.
//!
//! Registers the `all` pipeline on `A24_SYNC_CRON` with a
//! [`JobScheduler`] and keeps the process alive until Ctrl-C.

use std::sync::Arc;

use a24_core::AppConfig;
use a24_sync::SyncPhase;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::sync::{run_sync, TRIGGER_SCHEDULE};

/// Run scheduled syncs until interrupted.
///
/// A tick that fires while the previous run is still going is skipped, so
/// two runs never write to the shop at the same time.
///
/// # Errors
///
/// Returns an error if the cron expression is invalid or the scheduler
/// cannot be started or stopped.
pub(crate) async fn run_schedule(pool: PgPool, config: AppConfig) -> anyhow::Result<()> {
    let mut scheduler = JobScheduler::new().await?;
    let cron = config.sync_cron.clone();
    let pool = Arc::new(pool);
    let config = Arc::new(config);
    let in_flight = Arc::new(Mutex::new(()));

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);
        let in_flight = Arc::clone(&in_flight);

        Box::pin(async move {
            let Ok(_guard) = in_flight.try_lock() else {
                tracing::warn!("scheduler: previous sync still running; skipping this tick");
                return;
            };
            tracing::info!("scheduler: starting sync run");
            match run_sync(&pool, &config, SyncPhase::All, false, TRIGGER_SCHEDULE).await {
                Ok(report) => tracing::info!(
                    records_processed = report.records_processed(),
                    problems = report.problems(),
                    "scheduler: sync run complete"
                ),
                Err(e) => tracing::error!(error = %format!("{e:#}"), "scheduler: sync run failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    tracing::info!(cron = %cron, "scheduler: registered sync job; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("scheduler: shutting down");
    scheduler.shutdown().await?;
    Ok(())
}
