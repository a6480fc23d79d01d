//! Best-effort broadcasts to subscriber groups.

use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::gateway::{Button, ChatGateway, Keyboard};
use crate::models::FocusGroup;
use crate::repositories::UserRepository;

/// Callback data of the dismiss button under a notification.
pub const DISMISS_DATA: &str = "dismiss";

#[derive(Clone)]
pub struct NotificationService {
    users: UserRepository,
    gateway: Arc<dyn ChatGateway>,
}

/// What a broadcast achieved.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub blocked: usize,
    pub failed: usize,
}

impl NotificationService {
    pub fn new(users: UserRepository, gateway: Arc<dyn ChatGateway>) -> Self {
        Self { users, gateway }
    }

    fn dismiss_keyboard() -> Keyboard {
        let mut keyboard = Keyboard::new();
        keyboard.push_row(vec![Button::callback("Ok", DISMISS_DATA)]);
        keyboard
    }

    /// Sends `text` to every reachable member of the group. A recipient
    /// who blocked the bot is flipped unreachable and skipped next time;
    /// any other delivery failure is logged and does not stop the rest.
    pub async fn broadcast(&self, group: FocusGroup, text: &str) -> AppResult<BroadcastReport> {
        let recipients = self.users.recipient_ids(group).await?;
        let keyboard = Self::dismiss_keyboard();
        let mut report = BroadcastReport::default();

        for chat_id in recipients {
            match self
                .gateway
                .send_text_with_keyboard(chat_id, text, &keyboard)
                .await
            {
                Ok(()) => report.delivered += 1,
                Err(AppError::RecipientBlocked { .. }) => {
                    report.blocked += 1;
                    tracing::info!(chat_id, "Recipient blocked the bot, marking unreachable");
                    self.users.set_use_bot(chat_id, false).await?;
                }
                Err(error) => {
                    report.failed += 1;
                    tracing::warn!(chat_id, %error, "Broadcast delivery failed");
                }
            }
        }
        tracing::info!(
            group = group.as_str(),
            delivered = report.delivered,
            blocked = report.blocked,
            failed = report.failed,
            "Broadcast finished"
        );
        Ok(report)
    }
}
