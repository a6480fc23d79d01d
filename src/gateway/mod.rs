//! Outbound chat surface.
//!
//! [`ChatGateway`] is the only way the core talks back to users, so every
//! service stays testable against the in-memory recorder and the wire
//! client lives behind one seam.

mod telegram;

pub use telegram::TelegramGateway;

use async_trait::async_trait;

use crate::error::AppResult;

/// Inline keyboard: rows of buttons, rendered top to bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_row(&mut self, row: Vec<Button>) {
        self.rows.push(row);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub kind: ButtonKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonKind {
    /// Opaque data echoed back in a callback event.
    Callback(String),
    /// External link opened client-side, never dispatched back.
    Url(String),
}

impl Button {
    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: ButtonKind::Callback(data.into()),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: ButtonKind::Url(url.into()),
        }
    }
}

/// Who sent an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// Address of one already-sent message, used for edits and deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}

/// One inbound event from the transport.
#[derive(Debug, Clone)]
pub struct Update {
    pub id: i64,
    pub kind: UpdateKind,
}

#[derive(Debug, Clone)]
pub enum UpdateKind {
    Message {
        chat_id: i64,
        from: UserIdentity,
        text: String,
    },
    Callback {
        callback_id: String,
        from: UserIdentity,
        message: MessageRef,
        data: String,
    },
}

/// Every outbound operation the core uses.
///
/// A recipient who blocked the bot surfaces as
/// [`crate::error::AppError::RecipientBlocked`] so broadcast code can react
/// without string-matching transport errors.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> AppResult<()>;

    async fn send_text_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &Keyboard,
    ) -> AppResult<()>;

    async fn edit_message(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> AppResult<()>;

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> AppResult<()>;

    async fn delete_message(&self, message: MessageRef) -> AppResult<()>;

    async fn send_chat_action(&self, chat_id: i64, action: &str) -> AppResult<()>;
}

/// Inbound side of the transport, separate from [`ChatGateway`] so the run
/// loop can long-poll while services only ever see the outbound trait.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Blocks up to `timeout` seconds for updates past `offset`.
    async fn next_updates(&self, offset: i64, timeout: u64) -> AppResult<Vec<Update>>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Everything a test gateway was asked to do, in call order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Outbound {
        Text { chat_id: i64, text: String },
        TextWithKeyboard { chat_id: i64, text: String, keyboard: Keyboard },
        Edit { message: MessageRef, text: String },
        CallbackAnswer { callback_id: String, text: Option<String> },
        Delete { message: MessageRef },
        ChatAction { chat_id: i64, action: String },
    }

    /// In-memory gateway recording calls; chats in `blocked` reject sends
    /// the way a real blocked recipient would.
    #[derive(Default)]
    pub(crate) struct RecordingGateway {
        pub(crate) sent: Mutex<Vec<Outbound>>,
        pub(crate) blocked: Mutex<HashSet<i64>>,
    }

    impl RecordingGateway {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn block(&self, chat_id: i64) {
            self.blocked.lock().unwrap().insert(chat_id);
        }

        pub(crate) fn outbound(&self) -> Vec<Outbound> {
            self.sent.lock().unwrap().clone()
        }

        fn check_blocked(&self, chat_id: i64) -> AppResult<()> {
            if self.blocked.lock().unwrap().contains(&chat_id) {
                return Err(AppError::RecipientBlocked { chat_id });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ChatGateway for RecordingGateway {
        async fn send_text(&self, chat_id: i64, text: &str) -> AppResult<()> {
            self.check_blocked(chat_id)?;
            self.sent.lock().unwrap().push(Outbound::Text {
                chat_id,
                text: text.to_string(),
            });
            Ok(())
        }

        async fn send_text_with_keyboard(
            &self,
            chat_id: i64,
            text: &str,
            keyboard: &Keyboard,
        ) -> AppResult<()> {
            self.check_blocked(chat_id)?;
            self.sent.lock().unwrap().push(Outbound::TextWithKeyboard {
                chat_id,
                text: text.to_string(),
                keyboard: keyboard.clone(),
            });
            Ok(())
        }

        async fn edit_message(
            &self,
            message: MessageRef,
            text: &str,
            _keyboard: Option<&Keyboard>,
        ) -> AppResult<()> {
            self.sent.lock().unwrap().push(Outbound::Edit {
                message,
                text: text.to_string(),
            });
            Ok(())
        }

        async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> AppResult<()> {
            self.sent.lock().unwrap().push(Outbound::CallbackAnswer {
                callback_id: callback_id.to_string(),
                text: text.map(str::to_string),
            });
            Ok(())
        }

        async fn delete_message(&self, message: MessageRef) -> AppResult<()> {
            self.sent.lock().unwrap().push(Outbound::Delete { message });
            Ok(())
        }

        async fn send_chat_action(&self, chat_id: i64, action: &str) -> AppResult<()> {
            self.check_blocked(chat_id)?;
            self.sent.lock().unwrap().push(Outbound::ChatAction {
                chat_id,
                action: action.to_string(),
            });
            Ok(())
        }
    }
}
