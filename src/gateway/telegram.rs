//! Bot API wire client.
//!
//! Thin JSON-over-HTTP layer: each trait method maps to one API method,
//! every call carries a timeout, and API-level failures become structured
//! errors. A 403 "bot was blocked by the user" response is the one failure
//! with its own variant, broadcast code depends on telling it apart.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::TelegramConfig;
use crate::error::{AppError, AppResult};
use crate::gateway::{
    ButtonKind, ChatGateway, Keyboard, MessageRef, Update, UpdateKind, UpdateSource, UserIdentity,
};

const BLOCKED_MARKER: &str = "bot was blocked by the user";

pub struct TelegramGateway {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ApiEnvelope {
    ok: bool,
    description: Option<String>,
    error_code: Option<i64>,
    result: Option<Value>,
}

#[derive(Deserialize)]
struct ApiUpdate {
    update_id: i64,
    message: Option<ApiMessage>,
    callback_query: Option<ApiCallback>,
}

#[derive(Deserialize)]
struct ApiMessage {
    message_id: i64,
    from: Option<ApiUser>,
    chat: ApiChat,
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiUser {
    id: i64,
    first_name: Option<String>,
    last_name: Option<String>,
    username: Option<String>,
}

#[derive(Deserialize)]
struct ApiChat {
    id: i64,
}

#[derive(Deserialize)]
struct ApiCallback {
    id: String,
    from: ApiUser,
    message: Option<ApiMessage>,
    data: Option<String>,
}

impl From<ApiUser> for UserIdentity {
    fn from(user: ApiUser) -> Self {
        UserIdentity {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
        }
    }
}

impl TelegramGateway {
    pub fn new(config: &TelegramConfig) -> AppResult<Self> {
        // The client timeout must outlast a full long-poll cycle.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout + 10))
            .build()
            .map_err(|e| AppError::transport("client setup", e))?;
        Ok(Self {
            http,
            base_url: format!("{}/bot{}", config.api_base, config.token),
        })
    }

    async fn call(&self, method: &str, chat_id: Option<i64>, payload: Value) -> AppResult<Value> {
        let url = format!("{}/{}", self.base_url, method);
        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::transport(method.to_string(), e))?;

        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|e| AppError::transport(method.to_string(), e))?;

        if envelope.ok {
            return Ok(envelope.result.unwrap_or(Value::Null));
        }

        let description = envelope.description.unwrap_or_else(|| "no description".into());
        if envelope.error_code == Some(403) && description.contains(BLOCKED_MARKER) {
            if let Some(chat_id) = chat_id {
                return Err(AppError::RecipientBlocked { chat_id });
            }
        }
        Err(AppError::transport(
            method.to_string(),
            anyhow::anyhow!("api error {}: {description}", envelope.error_code.unwrap_or(0)),
        ))
    }
}

fn keyboard_json(keyboard: &Keyboard) -> Value {
    let rows: Vec<Vec<Value>> = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| match &button.kind {
                    ButtonKind::Callback(data) => {
                        json!({ "text": button.label, "callback_data": data })
                    }
                    ButtonKind::Url(url) => json!({ "text": button.label, "url": url }),
                })
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

#[async_trait]
impl ChatGateway for TelegramGateway {
    async fn send_text(&self, chat_id: i64, text: &str) -> AppResult<()> {
        self.call(
            "sendMessage",
            Some(chat_id),
            json!({ "chat_id": chat_id, "text": text }),
        )
        .await?;
        Ok(())
    }

    async fn send_text_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &Keyboard,
    ) -> AppResult<()> {
        self.call(
            "sendMessage",
            Some(chat_id),
            json!({
                "chat_id": chat_id,
                "text": text,
                "reply_markup": keyboard_json(keyboard),
            }),
        )
        .await?;
        Ok(())
    }

    async fn edit_message(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> AppResult<()> {
        let mut payload = json!({
            "chat_id": message.chat_id,
            "message_id": message.message_id,
            "text": text,
        });
        if let Some(keyboard) = keyboard {
            payload["reply_markup"] = keyboard_json(keyboard);
        }
        self.call("editMessageText", Some(message.chat_id), payload)
            .await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> AppResult<()> {
        let mut payload = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            payload["text"] = Value::String(text.to_string());
        }
        self.call("answerCallbackQuery", None, payload).await?;
        Ok(())
    }

    async fn delete_message(&self, message: MessageRef) -> AppResult<()> {
        self.call(
            "deleteMessage",
            Some(message.chat_id),
            json!({ "chat_id": message.chat_id, "message_id": message.message_id }),
        )
        .await?;
        Ok(())
    }

    async fn send_chat_action(&self, chat_id: i64, action: &str) -> AppResult<()> {
        self.call(
            "sendChatAction",
            Some(chat_id),
            json!({ "chat_id": chat_id, "action": action }),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl UpdateSource for TelegramGateway {
    async fn next_updates(&self, offset: i64, timeout: u64) -> AppResult<Vec<Update>> {
        let result = self
            .call(
                "getUpdates",
                None,
                json!({
                    "offset": offset,
                    "timeout": timeout,
                    "allowed_updates": ["message", "callback_query"],
                }),
            )
            .await?;

        let raw: Vec<ApiUpdate> = serde_json::from_value(result)
            .map_err(|e| AppError::transport("getUpdates decode", e))?;

        let mut updates = Vec::with_capacity(raw.len());
        for item in raw {
            let kind = if let Some(message) = item.message {
                match (message.from, message.text) {
                    (Some(from), Some(text)) => Some(UpdateKind::Message {
                        chat_id: message.chat.id,
                        from: from.into(),
                        text,
                    }),
                    // Joins, stickers, edits and other non-text traffic
                    _ => None,
                }
            } else if let Some(callback) = item.callback_query {
                match (callback.message, callback.data) {
                    (Some(message), Some(data)) => Some(UpdateKind::Callback {
                        callback_id: callback.id,
                        from: callback.from.into(),
                        message: MessageRef {
                            chat_id: message.chat.id,
                            message_id: message.message_id,
                        },
                        data,
                    }),
                    _ => None,
                }
            } else {
                None
            };

            if let Some(kind) = kind {
                updates.push(Update {
                    id: item.update_id,
                    kind,
                });
            } else {
                tracing::debug!(update_id = item.update_id, "Skipping unsupported update");
            }
        }
        Ok(updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_serialization_shapes_rows() {
        let mut keyboard = Keyboard::new();
        keyboard.push_row(vec![crate::gateway::Button::callback("Next", "duty_next")]);
        keyboard.push_row(vec![crate::gateway::Button::url("Docs", "https://example.com")]);

        let value = keyboard_json(&keyboard);
        assert_eq!(value["inline_keyboard"][0][0]["callback_data"], "duty_next");
        assert_eq!(value["inline_keyboard"][1][0]["url"], "https://example.com");
    }

    #[test]
    fn update_decoding_keeps_text_and_callback_traffic() {
        let raw = json!([
            {
                "update_id": 7,
                "message": {
                    "message_id": 1,
                    "from": { "id": 100, "first_name": "Ada" },
                    "chat": { "id": 100 },
                    "text": "/start"
                }
            },
            {
                "update_id": 8,
                "callback_query": {
                    "id": "cb-1",
                    "from": { "id": 100, "first_name": "Ada" },
                    "message": { "message_id": 2, "chat": { "id": 100 } },
                    "data": "main_menu"
                }
            },
            { "update_id": 9 }
        ]);

        let decoded: Vec<ApiUpdate> = serde_json::from_value(raw).expect("decode");
        assert_eq!(decoded.len(), 3);
        assert!(decoded[0].message.is_some());
        assert_eq!(
            decoded[1].callback_query.as_ref().unwrap().data.as_deref(),
            Some("main_menu")
        );
        assert!(decoded[2].message.is_none() && decoded[2].callback_query.is_none());
    }
}
