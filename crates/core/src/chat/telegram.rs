//! Telegram Bot API transport (long polling).

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::config::TelegramConfig;
use crate::metrics::EXTERNAL_SERVICE_DURATION;

use super::{
    ChatError, ChatId, ChatTransport, EventSource, InboundEvent, InlineButton, MessageId,
    MessageRef, UserId,
};

/// Slack on top of the long-poll timeout before the HTTP request gives up.
const POLL_GRACE_SECS: u64 = 10;

/// Telegram Bot API client.
pub struct TelegramTransport {
    client: Client,
    config: TelegramConfig,
    /// Next update id to request (last seen + 1).
    offset: AtomicI64,
}

impl TelegramTransport {
    pub fn new(config: TelegramConfig) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(
                config.poll_timeout_secs as u64 + POLL_GRACE_SECS,
            ))
            .build()
            .map_err(|e| ChatError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            offset: AtomicI64::new(0),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.token,
            method
        )
    }

    /// Call a Bot API method and unwrap the `{ok, result}` envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, ChatError> {
        let start = Instant::now();
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await
            // reqwest errors include the URL, which carries the token
            .map_err(|e| ChatError::ConnectionFailed(e.without_url().to_string()))?;

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.without_url().to_string()))?;

        EXTERNAL_SERVICE_DURATION
            .with_label_values(&["telegram", method])
            .observe(start.elapsed().as_secs_f64());

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                error_code,
                description,
                ..
            } => Err(ChatError::Api {
                code: error_code.unwrap_or_default(),
                description: description.unwrap_or_else(|| "missing result".to_string()),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct Message {
    message_id: i64,
    chat: Chat,
    #[serde(default)]
    from: Option<User>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct User {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    id: String,
    from: User,
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Serialize)]
struct KeyboardButton<'a> {
    text: &'a str,
    callback_data: &'a str,
}

impl Update {
    fn into_event(self) -> Option<InboundEvent> {
        if let Some(query) = self.callback_query {
            let message = query.message.as_ref().map(|m| MessageRef {
                chat: ChatId(m.chat.id),
                message: MessageId(m.message_id),
            });
            // Buttons on messages we can no longer see still answer in the user's chat
            let chat = message
                .map(|m| m.chat)
                .unwrap_or(ChatId(query.from.id));
            return Some(InboundEvent::ButtonPressed {
                user: UserId(query.from.id),
                chat,
                callback_id: query.id,
                message,
                payload: query.data.unwrap_or_default(),
            });
        }

        let message = self.message?;
        Some(InboundEvent::Message {
            user: UserId(message.from?.id),
            chat: ChatId(message.chat.id),
            text: message.text?,
        })
    }
}

fn message_ref(message: Message) -> MessageRef {
    MessageRef {
        chat: ChatId(message.chat.id),
        message: MessageId(message.message_id),
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageRef, ChatError> {
        let message: Message = self
            .call("sendMessage", json!({ "chat_id": chat.0, "text": text }))
            .await?;
        Ok(message_ref(message))
    }

    async fn send_with_buttons(
        &self,
        chat: ChatId,
        text: &str,
        buttons: &[InlineButton],
    ) -> Result<MessageRef, ChatError> {
        let keyboard: Vec<Vec<KeyboardButton<'_>>> = buttons
            .iter()
            .map(|b| {
                vec![KeyboardButton {
                    text: &b.label,
                    callback_data: &b.payload,
                }]
            })
            .collect();

        let message: Message = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": chat.0,
                    "text": text,
                    "reply_markup": { "inline_keyboard": keyboard },
                }),
            )
            .await?;
        Ok(message_ref(message))
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), ChatError> {
        // Returns the edited Message, or `true` for inline messages
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                json!({
                    "chat_id": message.chat.0,
                    "message_id": message.message.0,
                    "text": text,
                }),
            )
            .await?;
        Ok(())
    }

    async fn answer_button(&self, callback_id: &str) -> Result<(), ChatError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                json!({ "callback_query_id": callback_id }),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EventSource for TelegramTransport {
    async fn next_events(&self) -> Result<Vec<InboundEvent>, ChatError> {
        let offset = self.offset.load(Ordering::SeqCst);
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                json!({
                    "offset": offset,
                    "timeout": self.config.poll_timeout_secs,
                    "allowed_updates": ["message", "callback_query"],
                }),
            )
            .await?;

        if let Some(last) = updates.iter().map(|u| u.update_id).max() {
            self.offset.store(last + 1, Ordering::SeqCst);
        }

        let count = updates.len();
        let events: Vec<InboundEvent> = updates.into_iter().filter_map(Update::into_event).collect();
        if events.len() < count {
            debug!(skipped = count - events.len(), "Ignored unsupported updates");
        }
        Ok(events)
    }
}
