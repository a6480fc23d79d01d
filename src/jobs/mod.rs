//! Periodic background work.
//!
//! Tasks implement [`JobTask`] and are registered on the cron scheduler
//! from config. A failing run is logged and retried naturally on the next
//! tick, nothing here escalates to the run loop.

mod scheduler;
mod task;
pub mod tasks;

pub use scheduler::Scheduler;
pub use task::JobTask;

use std::sync::Arc;

use crate::config::Settings;
use crate::error::AppResult;
use crate::gateway::ChatGateway;
use crate::services::Services;

/// Wires the standard production jobs onto the scheduler.
pub async fn register_standard_jobs(
    scheduler: &Scheduler,
    services: &Services,
    settings: &Settings,
    gateway: Arc<dyn ChatGateway>,
) -> AppResult<()> {
    let jobs = &settings.jobs;

    scheduler
        .register(
            &jobs.daily_reset_cron,
            Arc::new(tasks::DailyResetTask::new(services.stats.clone())),
        )
        .await?;
    scheduler
        .register(
            &jobs.monthly_reset_cron,
            Arc::new(tasks::MonthlyResetTask::new(services.stats.clone())),
        )
        .await?;
    scheduler
        .register(
            &jobs.leaderboard_cron,
            Arc::new(tasks::LeaderboardTask::new(
                services.stats.clone(),
                gateway,
                settings.telegram.dev_chat_id,
            )),
        )
        .await?;
    scheduler
        .register(
            &jobs.checkpoint_poll_cron,
            Arc::new(tasks::CheckpointPollTask::new(services.checkpoints.clone())),
        )
        .await?;

    // Fires at the start of the digest window; the task itself spreads the
    // actual send over the window with a fresh random delay every day.
    let digest_cron = format!("0 0 {} * * *", jobs.digest_hour_start);
    scheduler
        .register(
            &digest_cron,
            Arc::new(tasks::DutyDigestTask::new(
                services.duty.clone(),
                services.notifications.clone(),
                jobs.digest_hour_start,
                jobs.digest_hour_end,
            )),
        )
        .await?;

    Ok(())
}
