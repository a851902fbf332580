use crate::error::Result;
use crate::services::quota_service::QuotaTracker;
use std::sync::Arc;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};

pub const MINUTE_WINDOW: Duration = Duration::from_secs(60);
pub const DAY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Starts the two repeating quota resets. Keep the returned scheduler alive.
pub async fn start_quota_resets(
    tracker: Arc<QuotaTracker>,
    minute_window: Duration,
    day_window: Duration,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let minute_tracker = tracker.clone();
    scheduler
        .add(Job::new_repeated(minute_window, move |_id, _scheduler| {
            minute_tracker.reset_minute_window();
            tracing::debug!("Per-minute model quota window reset");
        })?)
        .await?;

    let day_tracker = tracker;
    scheduler
        .add(Job::new_repeated(day_window, move |_id, _scheduler| {
            day_tracker.reset_day_window();
            tracing::info!("Daily model quota window reset");
        })?)
        .await?;

    scheduler.start().await?;
    tracing::info!(
        minute_window_secs = minute_window.as_secs(),
        day_window_secs = day_window.as_secs(),
        "Quota reset jobs scheduled"
    );
    Ok(scheduler)
}
