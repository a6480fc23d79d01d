//! On-call schedule display and the calendar entry flow.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::calendar;
use crate::error::{AppError, AppResult};
use crate::gateway::{Button, Keyboard};
use crate::models::NewDutyWindow;
use crate::repositories::DutyRepository;
use crate::sessions::DutySessions;

const NO_DUTY_DATA: &str = "No duty data yet.";
const SCHEDULE_LIMIT: i64 = 10;

fn fmt_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Read side: texts shown for the "who is on call" menu entries and the
/// nightly digest.
#[derive(Clone)]
pub struct DutyService {
    duty: DutyRepository,
}

impl DutyService {
    pub fn new(duty: DutyRepository) -> Self {
        Self { duty }
    }

    pub async fn next_duty_text(&self, today: NaiveDate) -> AppResult<String> {
        match self.duty.next_window(today).await? {
            Some(window) => Ok(format!(
                "Next on call: {}\n{} to {}",
                window.assignee,
                fmt_date(window.first_date),
                fmt_date(window.last_date),
            )),
            None => Ok(NO_DUTY_DATA.to_string()),
        }
    }

    pub async fn schedule_text(&self, today: NaiveDate) -> AppResult<String> {
        let windows = self.duty.upcoming_windows(today, SCHEDULE_LIMIT).await?;
        if windows.is_empty() {
            return Ok(NO_DUTY_DATA.to_string());
        }
        let mut lines = vec!["Upcoming duties:".to_string()];
        for window in windows {
            lines.push(format!(
                "{} \u{2013} {}: {}",
                fmt_date(window.first_date),
                fmt_date(window.last_date),
                window.assignee,
            ));
        }
        Ok(lines.join("\n"))
    }

    /// Digest line when a window starts on the given day, `None` otherwise.
    pub async fn digest_text(&self, start_day: NaiveDate) -> AppResult<Option<String>> {
        Ok(self.duty.window_starting(start_day).await?.map(|window| {
            format!(
                "Reminder: {} is on call starting {} (until {}).",
                window.assignee,
                fmt_date(window.first_date),
                fmt_date(window.last_date),
            )
        }))
    }
}

/// One reply of the entry flow: text plus an optional inline keyboard,
/// applied by the dispatcher as an in-place edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowStep {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl FlowStep {
    fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

const PROMPT_START: &str = "Pick the first day of the duty:";
const PROMPT_END: &str = "Now pick the last day of the duty:";
const PROMPT_ASSIGNEE: &str = "Pick who is on call:";
const STALE_FLOW: &str = "The entry form has expired. Start again from the menu.";

/// The duty entry state machine. State lives in [`DutySessions`], every
/// decision takes `today` as an argument so behaviour is deterministic
/// under test. Write side of the schedule.
#[derive(Clone)]
pub struct DutyFlowService {
    sessions: Arc<DutySessions>,
    duty: DutyRepository,
    assignees: Vec<String>,
}

impl DutyFlowService {
    pub fn new(sessions: Arc<DutySessions>, duty: DutyRepository, assignees: Vec<String>) -> Self {
        Self {
            sessions,
            duty,
            assignees,
        }
    }

    /// Opens a fresh session and shows the current month.
    pub fn begin(&self, user_id: i64, today: NaiveDate) -> FlowStep {
        self.sessions.begin(user_id);
        FlowStep::with_keyboard(PROMPT_START, calendar::month_keyboard(today))
    }

    /// Re-renders the picker on another month without touching the session.
    pub fn month_view(&self, user_id: i64, anchor: NaiveDate) -> FlowStep {
        let prompt = match self.sessions.get(user_id) {
            Some(pending) if pending.first_date.is_some() => PROMPT_END,
            _ => PROMPT_START,
        };
        FlowStep::with_keyboard(prompt, calendar::month_keyboard(anchor))
    }

    /// Applies a picked day to whichever date the session is waiting for.
    /// Invalid picks re-prompt without advancing the flow.
    pub fn pick_date(&self, user_id: i64, date: NaiveDate, today: NaiveDate) -> FlowStep {
        let Some(pending) = self.sessions.get(user_id) else {
            return FlowStep::text_only(STALE_FLOW);
        };

        match pending.first_date {
            None => {
                if date < today {
                    return FlowStep::with_keyboard(
                        format!("The start date cannot be in the past.\n{PROMPT_START}"),
                        calendar::month_keyboard(today),
                    );
                }
                self.sessions.set_first_date(user_id, date);
                FlowStep::with_keyboard(PROMPT_END, calendar::month_keyboard(date))
            }
            Some(first_date) => {
                if pending.last_date.is_some() {
                    // Already past the date steps, point back at the names.
                    return FlowStep::with_keyboard(PROMPT_ASSIGNEE, self.assignee_keyboard());
                }
                if date < first_date {
                    return FlowStep::with_keyboard(
                        format!("The end date cannot be before the start.\n{PROMPT_END}"),
                        calendar::month_keyboard(date),
                    );
                }
                self.sessions.set_last_date(user_id, date);
                FlowStep::with_keyboard(PROMPT_ASSIGNEE, self.assignee_keyboard())
            }
        }
    }

    /// Commits the window under the picked name. The session is dropped
    /// whether the insert succeeds or collides.
    pub async fn pick_assignee(&self, user_id: i64, name: &str) -> AppResult<FlowStep> {
        if !self.assignees.iter().any(|a| a == name) {
            return Ok(FlowStep::text_only(STALE_FLOW));
        }
        let Some(pending) = self.sessions.take(user_id) else {
            return Ok(FlowStep::text_only(STALE_FLOW));
        };
        let (Some(first_date), Some(last_date)) = (pending.first_date, pending.last_date) else {
            return Ok(FlowStep::text_only(STALE_FLOW));
        };

        let inserted = self
            .duty
            .insert_window(NewDutyWindow {
                first_date,
                last_date,
                assignee: name.to_string(),
            })
            .await;

        match inserted {
            Ok(window) => Ok(FlowStep::text_only(format!(
                "Duty saved: {}, {} to {}.",
                window.assignee,
                fmt_date(window.first_date),
                fmt_date(window.last_date),
            ))),
            Err(AppError::Duplicate { .. }) => Ok(FlowStep::text_only(
                "Those dates collide with an existing duty window. Nothing was saved.",
            )),
            Err(other) => Err(other),
        }
    }

    /// Drops any in-progress session. Safe with nothing pending.
    pub fn cancel(&self, user_id: i64) -> FlowStep {
        match self.sessions.take(user_id) {
            Some(_) => FlowStep::text_only("Duty entry cancelled."),
            None => FlowStep::text_only("Nothing to cancel."),
        }
    }

    fn assignee_keyboard(&self) -> Keyboard {
        let mut keyboard = Keyboard::new();
        for name in &self.assignees {
            keyboard.push_row(vec![Button::callback(name.clone(), format!("name;{name}"))]);
        }
        keyboard.push_row(vec![Button::callback("Cancel", "cancel")]);
        keyboard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::fresh_pool;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn assignees() -> Vec<String> {
        vec!["Pavel".to_string(), "Dmitry".to_string()]
    }

    async fn flow() -> (tempfile::TempDir, DutyFlowService, DutyRepository) {
        let (dir, pool) = fresh_pool().await;
        let repo = DutyRepository::new(pool);
        let service = DutyFlowService::new(Arc::new(DutySessions::new()), repo.clone(), assignees());
        (dir, service, repo)
    }

    #[tokio::test]
    async fn full_flow_commits_a_window() {
        let (_dir, service, repo) = flow().await;
        let today = d(2025, 7, 1);

        let step = service.begin(1, today);
        assert_eq!(step.text, PROMPT_START);

        let step = service.pick_date(1, d(2025, 7, 7), today);
        assert_eq!(step.text, PROMPT_END);

        let step = service.pick_date(1, d(2025, 7, 13), today);
        assert_eq!(step.text, PROMPT_ASSIGNEE);

        let step = service.pick_assignee(1, "Pavel").await.expect("commit");
        assert!(step.text.starts_with("Duty saved: Pavel, 07.07.2025 to 13.07.2025"));

        let saved = repo.window_starting(d(2025, 7, 7)).await.expect("row").unwrap();
        assert_eq!(saved.assignee, "Pavel");
    }

    #[tokio::test]
    async fn past_start_date_reprompts_without_advancing() {
        let (_dir, service, _repo) = flow().await;
        let today = d(2025, 7, 10);
        service.begin(1, today);

        let step = service.pick_date(1, d(2025, 7, 5), today);
        assert!(step.text.contains("cannot be in the past"));

        // The next valid pick still lands on the start date.
        let step = service.pick_date(1, d(2025, 7, 12), today);
        assert_eq!(step.text, PROMPT_END);
    }

    #[tokio::test]
    async fn end_before_start_reprompts() {
        let (_dir, service, _repo) = flow().await;
        let today = d(2025, 7, 1);
        service.begin(1, today);
        service.pick_date(1, d(2025, 7, 10), today);

        let step = service.pick_date(1, d(2025, 7, 8), today);
        assert!(step.text.contains("cannot be before the start"));

        let step = service.pick_date(1, d(2025, 7, 10), today);
        assert_eq!(step.text, PROMPT_ASSIGNEE);
    }

    #[tokio::test]
    async fn colliding_window_reports_and_drops_session() {
        let (_dir, service, repo) = flow().await;
        let today = d(2025, 7, 1);

        repo.insert_window(NewDutyWindow {
            first_date: d(2025, 7, 7),
            last_date: d(2025, 7, 13),
            assignee: "Dmitry".to_string(),
        })
        .await
        .expect("seed");

        service.begin(1, today);
        service.pick_date(1, d(2025, 7, 7), today);
        service.pick_date(1, d(2025, 7, 20), today);

        let step = service.pick_assignee(1, "Pavel").await.expect("collide");
        assert!(step.text.contains("collide"));

        // Session is gone, a late retry is stale.
        let step = service.pick_assignee(1, "Pavel").await.expect("stale");
        assert_eq!(step.text, STALE_FLOW);
    }

    #[tokio::test]
    async fn cancel_mid_flow_clears_state_and_repeats_as_noop() {
        let (_dir, service, _repo) = flow().await;
        let today = d(2025, 7, 1);
        service.begin(1, today);
        service.pick_date(1, d(2025, 7, 10), today);

        assert_eq!(service.cancel(1).text, "Duty entry cancelled.");
        assert_eq!(service.cancel(1).text, "Nothing to cancel.");

        // The dropped session cannot be resumed with a late date pick.
        let step = service.pick_date(1, d(2025, 7, 12), today);
        assert_eq!(step.text, STALE_FLOW);
    }

    #[tokio::test]
    async fn unknown_assignee_is_rejected() {
        let (_dir, service, _repo) = flow().await;
        let today = d(2025, 7, 1);
        service.begin(1, today);
        service.pick_date(1, d(2025, 7, 7), today);
        service.pick_date(1, d(2025, 7, 13), today);

        let step = service.pick_assignee(1, "Mallory").await.expect("reject");
        assert_eq!(step.text, STALE_FLOW);
    }

    #[tokio::test]
    async fn display_texts_fall_back_without_data() {
        let (_dir, _service, repo) = flow().await;
        let duty = DutyService::new(repo);
        let today = d(2025, 7, 1);

        assert_eq!(duty.next_duty_text(today).await.expect("next"), NO_DUTY_DATA);
        assert_eq!(duty.schedule_text(today).await.expect("list"), NO_DUTY_DATA);
        assert_eq!(duty.digest_text(today).await.expect("digest"), None);
    }

    #[tokio::test]
    async fn display_texts_use_dotted_dates() {
        let (_dir, _service, repo) = flow().await;
        let duty = DutyService::new(repo.clone());
        repo.insert_window(NewDutyWindow {
            first_date: d(2025, 7, 7),
            last_date: d(2025, 7, 13),
            assignee: "Pavel".to_string(),
        })
        .await
        .expect("seed");

        let text = duty.next_duty_text(d(2025, 7, 1)).await.expect("next");
        assert_eq!(text, "Next on call: Pavel\n07.07.2025 to 13.07.2025");

        let digest = duty.digest_text(d(2025, 7, 7)).await.expect("digest");
        assert!(digest.unwrap().contains("starting 07.07.2025"));
    }
}
