//! Inbound event routing.
//!
//! Two entry points: slash commands from plain messages and callback data
//! from inline keyboards. Every menu action runs through one wrapper that
//! contains faults, logs them, apologises to the user, and counts the
//! action on success. No handler fault can take the run loop down.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::calendar::{self, CalendarOp};
use crate::error::AppResult;
use crate::gateway::{Button, ChatGateway, Keyboard, MessageRef, Update, UpdateKind, UserIdentity};
use crate::menu::{MenuAction, MenuTree, NodeKind, render};
use crate::models::Tier;
use crate::services::{DISMISS_DATA, FlowStep, Services};

const START_GREETING: &str = "Hi! I am the IT department assistant bot.\n\
    To use the menu you need to register first.\n\
    By pressing \"Register\" you agree that your name and username are \
    stored for duty scheduling and notifications.";
const NOT_REGISTERED: &str = "You are not registered yet.\n\
    Press \"Register\" to get access to the menu.";
const FALLBACK_TEXT: &str = "I only understand the menu. Try /menu.";
const APOLOGY: &str = "Something went wrong. Please try again later.";
const MENU_NOT_FOUND: &str = "Menu not found";
const ADMIN_ONLY: &str = "This function requires admin rights.";
const ERP_UNAVAILABLE: &str = "Could not deliver the answer to the ERP. Try again later.";

pub struct Dispatcher {
    services: Services,
    tree: Arc<MenuTree>,
    gateway: Arc<dyn ChatGateway>,
}

fn registration_keyboard() -> Keyboard {
    let mut keyboard = Keyboard::new();
    keyboard.push_row(vec![Button::callback("Register", "register")]);
    keyboard
}

/// Gate forged or stale callbacks: hiding a button is not enough.
fn action_allowed(action: MenuAction, tier: Tier) -> bool {
    match action {
        MenuAction::Register => true,
        MenuAction::DutyEntry
        | MenuAction::Promote
        | MenuAction::Demote
        | MenuAction::ListUsers => tier.is_admin(),
        MenuAction::DutyNext
        | MenuAction::DutyList
        | MenuAction::ToggleNews
        | MenuAction::ToggleMarketplace
        | MenuAction::ComingSoon => tier.is_registered(),
    }
}

impl Dispatcher {
    pub fn new(services: Services, tree: Arc<MenuTree>, gateway: Arc<dyn ChatGateway>) -> Self {
        Self {
            services,
            tree,
            gateway,
        }
    }

    pub async fn handle_update(&self, update: Update, today: NaiveDate) -> AppResult<()> {
        match update.kind {
            UpdateKind::Message {
                chat_id,
                from,
                text,
            } => self.handle_command(chat_id, &from, &text, today).await,
            UpdateKind::Callback {
                callback_id,
                from,
                message,
                data,
            } => {
                self.handle_callback(&callback_id, &from, message, &data, today)
                    .await
            }
        }
    }

    pub async fn handle_command(
        &self,
        chat_id: i64,
        from: &UserIdentity,
        text: &str,
        _today: NaiveDate,
    ) -> AppResult<()> {
        // Typing hint only; the reply goes out even when it fails.
        if let Err(error) = self.gateway.send_chat_action(chat_id, "typing").await {
            tracing::debug!(chat_id, %error, "Chat action failed");
        }

        let command = text.split_whitespace().next().unwrap_or("");
        match command {
            "/start" => {
                self.gateway
                    .send_text_with_keyboard(chat_id, START_GREETING, &registration_keyboard())
                    .await
            }
            "/menu" => {
                let tier = self.services.access.resolve_tier(from.id).await?;
                if !tier.is_registered() {
                    return self
                        .gateway
                        .send_text_with_keyboard(chat_id, NOT_REGISTERED, &registration_keyboard())
                        .await;
                }
                let screen = render(&self.tree, "main_menu", tier)?;
                self.gateway
                    .send_text_with_keyboard(chat_id, &screen.text, &screen.keyboard)
                    .await
            }
            "/promote" | "/demote" => {
                let tier = self.services.access.resolve_tier(from.id).await?;
                if !tier.is_admin() {
                    return self.gateway.send_text(chat_id, ADMIN_ONLY).await;
                }
                let reply = match text.split_whitespace().nth(1).and_then(|s| s.parse().ok()) {
                    Some(target_id) if command == "/promote" => {
                        self.services.users.promote(target_id).await?
                    }
                    Some(target_id) => self.services.users.demote(target_id).await?,
                    None => format!("Usage: {command} <user id>"),
                };
                self.gateway.send_text(chat_id, &reply).await
            }
            _ => self.gateway.send_text(chat_id, FALLBACK_TEXT).await,
        }
    }

    pub async fn handle_callback(
        &self,
        callback_id: &str,
        from: &UserIdentity,
        message: MessageRef,
        data: &str,
        today: NaiveDate,
    ) -> AppResult<()> {
        // Count the interaction; a missing counter row is not worth failing
        // the event for.
        if let Err(error) = self.services.stats.record_user_event(from.id).await {
            tracing::warn!(user_id = from.id, %error, "User statistics update failed");
        }

        if data == DISMISS_DATA {
            self.gateway.delete_message(message).await?;
            return self.gateway.answer_callback(callback_id, None).await;
        }

        if data == "cancel" {
            let step = self.services.duty_flow.cancel(from.id);
            self.apply_step(message, step).await?;
            return self.gateway.answer_callback(callback_id, None).await;
        }

        if calendar::is_calendar_callback(data) {
            return self
                .handle_calendar(callback_id, from, message, data, today)
                .await;
        }

        if let Some(name) = data.strip_prefix("name;") {
            let step = self.services.duty_flow.pick_assignee(from.id, name).await?;
            self.apply_step(message, step).await?;
            return self.gateway.answer_callback(callback_id, None).await;
        }

        if let Some(rest) = data.strip_prefix("event;") {
            return self.handle_event_answer(callback_id, message, rest).await;
        }

        let tier = self.services.access.resolve_tier(from.id).await?;
        match self.tree.get(data) {
            None => {
                self.gateway
                    .answer_callback(callback_id, Some(MENU_NOT_FOUND))
                    .await
            }
            // Navigation is registered-only, same as /menu; hiding the
            // entry buttons is not enough against stale or forged data.
            Some(NodeKind::Screen { .. }) | Some(NodeKind::Redirect(_))
                if !tier.is_registered() =>
            {
                self.gateway
                    .edit_message(message, NOT_REGISTERED, Some(&registration_keyboard()))
                    .await?;
                self.gateway.answer_callback(callback_id, None).await
            }
            Some(NodeKind::Screen { .. }) | Some(NodeKind::Redirect(_)) => {
                let screen = render(&self.tree, data, tier)?;
                self.gateway
                    .edit_message(message, &screen.text, Some(&screen.keyboard))
                    .await?;
                self.gateway.answer_callback(callback_id, None).await
            }
            // Link targets render as URL buttons and never come back as
            // callbacks; treat a forged one like an unknown key.
            Some(NodeKind::Link(_)) => {
                self.gateway
                    .answer_callback(callback_id, Some(MENU_NOT_FOUND))
                    .await
            }
            Some(NodeKind::Action(action)) => {
                let action = *action;
                self.dispatch_action(callback_id, from, message, action, tier, today)
                    .await
            }
        }
    }

    /// Relays a downtime-event choice (`event;<id>;<type>`) to the ERP.
    /// The prompt resolves only on an acknowledged submission, so an
    /// unanswered event keeps its keyboard and can be retried.
    async fn handle_event_answer(
        &self,
        callback_id: &str,
        message: MessageRef,
        rest: &str,
    ) -> AppResult<()> {
        let Some((event_id, choice)) = rest.split_once(';') else {
            return self
                .gateway
                .answer_callback(callback_id, Some(MENU_NOT_FOUND))
                .await;
        };
        match self.services.events.answer(event_id, choice).await {
            Ok(Some(confirmation)) => {
                self.gateway.edit_message(message, &confirmation, None).await?;
                self.gateway.answer_callback(callback_id, None).await
            }
            Ok(None) => {
                self.gateway
                    .answer_callback(callback_id, Some(ERP_UNAVAILABLE))
                    .await
            }
            Err(error) => {
                tracing::error!(event_id, %error, "Event answer submission failed");
                self.gateway
                    .answer_callback(callback_id, Some(ERP_UNAVAILABLE))
                    .await
            }
        }
    }

    async fn handle_calendar(
        &self,
        callback_id: &str,
        from: &UserIdentity,
        message: MessageRef,
        data: &str,
        today: NaiveDate,
    ) -> AppResult<()> {
        let step = match calendar::parse_callback(data) {
            None => {
                return self
                    .gateway
                    .answer_callback(callback_id, Some(MENU_NOT_FOUND))
                    .await;
            }
            Some(CalendarOp::Noop) => {
                return self.gateway.answer_callback(callback_id, None).await;
            }
            Some(CalendarOp::Cancel) => self.services.duty_flow.cancel(from.id),
            Some(CalendarOp::Day(date)) => self.services.duty_flow.pick_date(from.id, date, today),
            Some(CalendarOp::Prev(anchor)) => self
                .services
                .duty_flow
                .month_view(from.id, calendar::previous_month(anchor)),
            Some(CalendarOp::Next(anchor)) => self
                .services
                .duty_flow
                .month_view(from.id, calendar::next_month(anchor)),
        };
        self.apply_step(message, step).await?;
        self.gateway.answer_callback(callback_id, None).await
    }

    /// The uniform action wrapper: any handler fault is logged, answered
    /// with a generic apology, and swallowed; a success increments the
    /// action's usage counter.
    async fn dispatch_action(
        &self,
        callback_id: &str,
        from: &UserIdentity,
        message: MessageRef,
        action: MenuAction,
        tier: Tier,
        today: NaiveDate,
    ) -> AppResult<()> {
        if !action_allowed(action, tier) {
            let text = if tier.is_registered() {
                ADMIN_ONLY
            } else {
                NOT_REGISTERED
            };
            return self.gateway.answer_callback(callback_id, Some(text)).await;
        }

        match self.run_action(from, action, today).await {
            Ok(step) => {
                self.apply_step(message, step).await?;
                if let Err(error) = self.services.stats.record_action(action).await {
                    tracing::warn!(action = action.key(), %error, "Action counter update failed");
                }
            }
            Err(error) => {
                tracing::error!(
                    action = action.key(),
                    user_id = from.id,
                    %error,
                    "Menu action failed"
                );
                self.apply_step(message, FlowStep {
                    text: APOLOGY.to_string(),
                    keyboard: None,
                })
                .await?;
            }
        }
        self.gateway.answer_callback(callback_id, None).await
    }

    async fn run_action(
        &self,
        from: &UserIdentity,
        action: MenuAction,
        today: NaiveDate,
    ) -> AppResult<FlowStep> {
        let text_step = |text: String| FlowStep {
            text,
            keyboard: None,
        };
        Ok(match action {
            MenuAction::Register => text_step(self.services.users.register(from, today).await?),
            MenuAction::DutyNext => text_step(self.services.duty.next_duty_text(today).await?),
            MenuAction::DutyList => text_step(self.services.duty.schedule_text(today).await?),
            MenuAction::DutyEntry => self.services.duty_flow.begin(from.id, today),
            MenuAction::ToggleNews => text_step(self.services.users.toggle_news(from.id).await?),
            MenuAction::ToggleMarketplace => {
                text_step(self.services.users.toggle_marketplace(from.id).await?)
            }
            MenuAction::Promote => text_step("Send /promote <user id> to grant rights.".to_string()),
            MenuAction::Demote => text_step("Send /demote <user id> to revoke rights.".to_string()),
            MenuAction::ListUsers => text_step(self.services.users.user_list_text().await?),
            MenuAction::ComingSoon => {
                let name = from.first_name.as_deref().unwrap_or("friend");
                text_step(format!(
                    "Hang tight, {name}. This feature will be available later. Stay tuned!"
                ))
            }
        })
    }

    async fn apply_step(&self, message: MessageRef, step: FlowStep) -> AppResult<()> {
        self.gateway
            .edit_message(message, &step.text, step.keyboard.as_ref())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::fresh_pool;
    use crate::external::ErpPort;
    use crate::gateway::testing::{Outbound, RecordingGateway};
    use crate::repositories::Repositories;
    use crate::sessions::DutySessions;
    use async_trait::async_trait;

    struct IdleErp;

    #[async_trait]
    impl ErpPort for IdleErp {
        async fn submit_event(&self, _params: &[(String, String)]) -> AppResult<bool> {
            Ok(true)
        }

        async fn poll_checkpoints(&self) -> AppResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    struct RefusingErp;

    #[async_trait]
    impl ErpPort for RefusingErp {
        async fn submit_event(&self, _params: &[(String, String)]) -> AppResult<bool> {
            Ok(false)
        }

        async fn poll_checkpoints(&self) -> AppResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
    }

    fn identity(id: i64) -> UserIdentity {
        UserIdentity {
            id,
            first_name: Some("Ada".into()),
            last_name: None,
            username: Some("ada".into()),
        }
    }

    fn message() -> MessageRef {
        MessageRef {
            chat_id: 100,
            message_id: 5,
        }
    }

    async fn dispatcher_with_erp(
        erp: Arc<dyn ErpPort>,
    ) -> (tempfile::TempDir, Arc<RecordingGateway>, Dispatcher) {
        let (dir, pool) = fresh_pool().await;
        let gateway = Arc::new(RecordingGateway::new());
        let mut settings = crate::config::Settings::default();
        settings.duty.assignees = vec!["Pavel".to_string()];
        let services = Services::new(
            Repositories::new(pool),
            gateway.clone(),
            erp,
            Arc::new(DutySessions::new()),
            &settings,
        );
        let dispatcher = Dispatcher::new(services, Arc::new(MenuTree::standard()), gateway.clone());
        (dir, gateway, dispatcher)
    }

    async fn dispatcher() -> (tempfile::TempDir, Arc<RecordingGateway>, Dispatcher) {
        dispatcher_with_erp(Arc::new(IdleErp)).await
    }

    async fn register(dispatcher: &Dispatcher, id: i64) {
        dispatcher
            .handle_callback("cb", &identity(id), message(), "register", today())
            .await
            .expect("register");
    }

    #[tokio::test]
    async fn start_offers_registration() {
        let (_dir, gateway, dispatcher) = dispatcher().await;
        dispatcher
            .handle_command(100, &identity(100), "/start", today())
            .await
            .expect("start");

        let outbound = gateway.outbound();
        let Outbound::TextWithKeyboard { text, keyboard, .. } = &outbound[1] else {
            panic!("expected greeting with keyboard");
        };
        assert!(text.contains("register"));
        assert_eq!(keyboard.rows[0][0].label, "Register");
    }

    #[tokio::test]
    async fn command_replies_follow_a_typing_hint() {
        let (_dir, gateway, dispatcher) = dispatcher().await;
        dispatcher
            .handle_command(100, &identity(100), "/start", today())
            .await
            .expect("start");

        let outbound = gateway.outbound();
        assert!(matches!(
            &outbound[0],
            Outbound::ChatAction { chat_id: 100, action } if action == "typing"
        ));
    }

    #[tokio::test]
    async fn menu_is_gated_on_registration() {
        let (_dir, gateway, dispatcher) = dispatcher().await;
        dispatcher
            .handle_command(100, &identity(100), "/menu", today())
            .await
            .expect("menu");

        let outbound = gateway.outbound();
        let Outbound::TextWithKeyboard { text, .. } = &outbound[1] else {
            panic!("expected registration prompt");
        };
        assert!(text.contains("not registered"));
    }

    #[tokio::test]
    async fn unregistered_screen_callback_prompts_registration() {
        let (_dir, gateway, dispatcher) = dispatcher().await;
        dispatcher
            .handle_callback("cb", &identity(100), message(), "main_menu", today())
            .await
            .expect("callback");

        let outbound = gateway.outbound();
        assert!(outbound.iter().any(|o| matches!(
            o,
            Outbound::Edit { text, .. } if text == NOT_REGISTERED
        )));
        assert!(!outbound.iter().any(|o| matches!(
            o,
            Outbound::Edit { text, .. } if text == "Main menu:"
        )));
    }

    #[tokio::test]
    async fn registered_user_gets_the_main_menu() {
        let (_dir, gateway, dispatcher) = dispatcher().await;
        register(&dispatcher, 100).await;
        dispatcher
            .handle_command(100, &identity(100), "/menu", today())
            .await
            .expect("menu");

        let outbound = gateway.outbound();
        let last = outbound.last().unwrap();
        let Outbound::TextWithKeyboard { text, .. } = last else {
            panic!("expected menu, got {last:?}");
        };
        assert_eq!(text, "Main menu:");
    }

    #[tokio::test]
    async fn unknown_callback_answers_menu_not_found() {
        let (_dir, gateway, dispatcher) = dispatcher().await;
        register(&dispatcher, 100).await;
        dispatcher
            .handle_callback("cb", &identity(100), message(), "no_such_key", today())
            .await
            .expect("callback");

        assert!(gateway.outbound().iter().any(|o| matches!(
            o,
            Outbound::CallbackAnswer { text: Some(t), .. } if t == MENU_NOT_FOUND
        )));
    }

    #[tokio::test]
    async fn screen_callback_edits_in_place() {
        let (_dir, gateway, dispatcher) = dispatcher().await;
        register(&dispatcher, 100).await;
        dispatcher
            .handle_callback("cb", &identity(100), message(), "core_functions", today())
            .await
            .expect("navigate");

        assert!(gateway.outbound().iter().any(|o| matches!(
            o,
            Outbound::Edit { text, .. } if text == "Core functions:"
        )));
    }

    #[tokio::test]
    async fn non_admin_cannot_run_admin_actions() {
        let (_dir, gateway, dispatcher) = dispatcher().await;
        register(&dispatcher, 100).await;
        dispatcher
            .handle_callback("cb", &identity(100), message(), "list_users", today())
            .await
            .expect("denied");

        assert!(gateway.outbound().iter().any(|o| matches!(
            o,
            Outbound::CallbackAnswer { text: Some(t), .. } if t == ADMIN_ONLY
        )));
    }

    #[tokio::test]
    async fn acknowledged_event_answer_resolves_the_prompt() {
        let (_dir, gateway, dispatcher) = dispatcher().await;
        dispatcher
            .handle_callback("cb", &identity(100), message(), "event;4711;repair", today())
            .await
            .expect("event");

        assert!(gateway.outbound().iter().any(|o| matches!(
            o,
            Outbound::Edit { text, .. } if text == "Downtime event recorded: repair."
        )));
    }

    #[tokio::test]
    async fn refused_event_answer_keeps_the_prompt() {
        let (_dir, gateway, dispatcher) = dispatcher_with_erp(Arc::new(RefusingErp)).await;
        dispatcher
            .handle_callback("cb", &identity(100), message(), "event;4711;repair", today())
            .await
            .expect("event");

        let outbound = gateway.outbound();
        assert!(outbound.iter().any(|o| matches!(
            o,
            Outbound::CallbackAnswer { text: Some(t), .. } if t == ERP_UNAVAILABLE
        )));
        assert!(!outbound.iter().any(|o| matches!(o, Outbound::Edit { .. })));
    }

    #[tokio::test]
    async fn dismiss_deletes_the_message() {
        let (_dir, gateway, dispatcher) = dispatcher().await;
        dispatcher
            .handle_callback("cb", &identity(100), message(), DISMISS_DATA, today())
            .await
            .expect("dismiss");

        assert!(gateway
            .outbound()
            .iter()
            .any(|o| matches!(o, Outbound::Delete { .. })));
    }

    #[tokio::test]
    async fn fallback_text_points_at_the_menu() {
        let (_dir, gateway, dispatcher) = dispatcher().await;
        dispatcher
            .handle_command(100, &identity(100), "hello there", today())
            .await
            .expect("fallback");

        assert!(gateway.outbound().iter().any(|o| matches!(
            o,
            Outbound::Text { text, .. } if text == FALLBACK_TEXT
        )));
    }

    #[tokio::test]
    async fn promote_command_requires_admin() {
        let (_dir, gateway, dispatcher) = dispatcher().await;
        register(&dispatcher, 100).await;
        dispatcher
            .handle_command(100, &identity(100), "/promote 200", today())
            .await
            .expect("denied");

        assert!(gateway.outbound().iter().any(|o| matches!(
            o,
            Outbound::Text { text, .. } if text == ADMIN_ONLY
        )));
    }
}
