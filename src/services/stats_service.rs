//! Usage counters and the leaderboard.

use crate::error::AppResult;
use crate::menu::MenuAction;
use crate::models::StatWindow;
use crate::repositories::StatisticsRepository;

const LEADERBOARD_SIZE: i64 = 3;

fn pluralize(count: i32) -> String {
    if count == 1 {
        "1 request".to_string()
    } else {
        format!("{count} requests")
    }
}

#[derive(Clone)]
pub struct StatsService {
    statistics: StatisticsRepository,
}

impl StatsService {
    pub fn new(statistics: StatisticsRepository) -> Self {
        Self { statistics }
    }

    /// Counts one inbound event for the user. Unregistered users have no
    /// counter row and are skipped silently.
    pub async fn record_user_event(&self, user_id: i64) -> AppResult<()> {
        self.statistics.record_user_event(user_id).await
    }

    pub async fn record_action(&self, action: MenuAction) -> AppResult<()> {
        self.statistics.record_function_call(action.key()).await
    }

    pub async fn reset_window(&self, window: StatWindow) -> AppResult<()> {
        self.statistics.reset_functions(window).await?;
        self.statistics.reset_users(window).await
    }

    /// Three sections (today, this month, all time), top three actions
    /// each, display names from the menu, "no data" for an empty window.
    pub async fn leaderboard_text(&self) -> AppResult<String> {
        let mut sections = Vec::with_capacity(3);
        for (window, title) in [
            (StatWindow::Today, "Top functions today:"),
            (StatWindow::Month, "Top functions this month:"),
            (StatWindow::AllTime, "Top functions all time:"),
        ] {
            let top = self.statistics.top_functions(window, LEADERBOARD_SIZE).await?;
            let mut lines = vec![title.to_string()];
            if top.is_empty() {
                lines.push("no data".to_string());
            } else {
                for (position, usage) in top.iter().enumerate() {
                    let display = MenuAction::display_name_for_key(&usage.name)
                        .unwrap_or(usage.name.as_str());
                    lines.push(format!(
                        "{}. {display} \u{2014} {}",
                        position + 1,
                        pluralize(usage.count)
                    ));
                }
            }
            sections.push(lines.join("\n"));
        }
        Ok(sections.join("\n\n"))
    }
}
