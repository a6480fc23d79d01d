//! The production job set.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, Local};
use rand::Rng;

use crate::error::AppResult;
use crate::gateway::ChatGateway;
use crate::jobs::JobTask;
use crate::models::{FocusGroup, StatWindow};
use crate::services::{CheckpointService, DutyService, NotificationService, StatsService};

/// Zeroes the today window after midnight.
pub struct DailyResetTask {
    stats: StatsService,
}

impl DailyResetTask {
    pub fn new(stats: StatsService) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl JobTask for DailyResetTask {
    fn name(&self) -> &'static str {
        "daily_counter_reset"
    }

    async fn run(&self) -> AppResult<()> {
        self.stats.reset_window(StatWindow::Today).await
    }
}

/// Zeroes the month window, scheduled for the first of the month.
pub struct MonthlyResetTask {
    stats: StatsService,
}

impl MonthlyResetTask {
    pub fn new(stats: StatsService) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl JobTask for MonthlyResetTask {
    fn name(&self) -> &'static str {
        "monthly_counter_reset"
    }

    async fn run(&self) -> AppResult<()> {
        self.stats.reset_window(StatWindow::Month).await
    }
}

/// Sends the usage leaderboard to the dev chat.
pub struct LeaderboardTask {
    stats: StatsService,
    gateway: Arc<dyn ChatGateway>,
    dev_chat_id: i64,
}

impl LeaderboardTask {
    pub fn new(stats: StatsService, gateway: Arc<dyn ChatGateway>, dev_chat_id: i64) -> Self {
        Self {
            stats,
            gateway,
            dev_chat_id,
        }
    }
}

#[async_trait]
impl JobTask for LeaderboardTask {
    fn name(&self) -> &'static str {
        "usage_leaderboard"
    }

    async fn run(&self) -> AppResult<()> {
        let text = self.stats.leaderboard_text().await?;
        self.gateway.send_text(self.dev_chat_id, &text).await
    }
}

/// One ERP poll cycle.
pub struct CheckpointPollTask {
    checkpoints: CheckpointService,
}

impl CheckpointPollTask {
    pub fn new(checkpoints: CheckpointService) -> Self {
        Self { checkpoints }
    }
}

#[async_trait]
impl JobTask for CheckpointPollTask {
    fn name(&self) -> &'static str {
        "checkpoint_poll"
    }

    async fn run(&self) -> AppResult<()> {
        self.checkpoints.poll_once().await
    }
}

/// Tomorrow's on-call reminder for news subscribers.
///
/// The cron fires at the start of the window; each run then sleeps a fresh
/// random offset inside the window so the digest lands at a different time
/// every day.
pub struct DutyDigestTask {
    duty: DutyService,
    notifications: NotificationService,
    window_start: u32,
    window_end: u32,
}

impl DutyDigestTask {
    pub fn new(
        duty: DutyService,
        notifications: NotificationService,
        window_start: u32,
        window_end: u32,
    ) -> Self {
        Self {
            duty,
            notifications,
            window_start,
            window_end,
        }
    }
}

fn random_offset(window_start: u32, window_end: u32) -> Duration {
    let span_secs = u64::from(window_end.saturating_sub(window_start)) * 3600;
    if span_secs == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs(rand::rng().random_range(0..span_secs))
}

#[async_trait]
impl JobTask for DutyDigestTask {
    fn name(&self) -> &'static str {
        "duty_digest"
    }

    async fn run(&self) -> AppResult<()> {
        let offset = random_offset(self.window_start, self.window_end);
        tracing::info!(delay_secs = offset.as_secs(), "Duty digest scheduled within window");
        tokio::time::sleep(offset).await;

        let tomorrow = Local::now()
            .date_naive()
            .checked_add_days(Days::new(1))
            .unwrap_or_else(|| Local::now().date_naive());
        let Some(text) = self.duty.digest_text(tomorrow).await? else {
            tracing::debug!("No duty window starting tomorrow, digest skipped");
            return Ok(());
        };
        self.notifications.broadcast(FocusGroup::News, &text).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::fresh_pool;
    use crate::gateway::testing::{Outbound, RecordingGateway};
    use crate::repositories::StatisticsRepository;

    #[tokio::test]
    async fn leaderboard_lands_in_the_dev_chat() {
        let (_dir, pool) = fresh_pool().await;
        let gateway = Arc::new(RecordingGateway::new());
        let task = LeaderboardTask::new(
            StatsService::new(StatisticsRepository::new(pool)),
            gateway.clone(),
            777,
        );

        task.run().await.expect("run");
        assert!(matches!(
            &gateway.outbound()[0],
            Outbound::Text { chat_id: 777, text } if text.contains("Top functions today:")
        ));
    }

    #[test]
    fn digest_offset_stays_inside_the_window() {
        for _ in 0..100 {
            assert!(random_offset(14, 17) < Duration::from_secs(3 * 3600));
        }
    }

    #[test]
    fn zero_width_window_means_no_delay() {
        assert_eq!(random_offset(14, 14), Duration::ZERO);
        // An inverted window degrades to no delay instead of panicking.
        assert_eq!(random_offset(17, 14), Duration::ZERO);
    }
}
