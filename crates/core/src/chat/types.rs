//! Types for the chat transport.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chat user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chat (conversation) id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

/// Message id, unique within a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i64);

/// A stable reference to a sent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat: ChatId,
    pub message: MessageId,
}

/// An inline button attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    /// Text shown on the button.
    pub label: String,
    /// Opaque payload delivered back when the button is pressed.
    pub payload: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// An event delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A text message (commands start with `/`).
    Message {
        user: UserId,
        chat: ChatId,
        text: String,
    },
    /// An inline button was pressed.
    ButtonPressed {
        user: UserId,
        chat: ChatId,
        /// Transport id used to acknowledge the press.
        callback_id: String,
        /// The message carrying the button, when the transport knows it.
        message: Option<MessageRef>,
        payload: String,
    },
}

impl InboundEvent {
    pub fn user(&self) -> UserId {
        match self {
            InboundEvent::Message { user, .. } | InboundEvent::ButtonPressed { user, .. } => *user,
        }
    }

    pub fn chat(&self) -> ChatId {
        match self {
            InboundEvent::Message { chat, .. } | InboundEvent::ButtonPressed { chat, .. } => *chat,
        }
    }
}

/// Errors that can occur while talking to the chat transport.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Chat transport connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Chat API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("Chat API response could not be parsed: {0}")]
    InvalidResponse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Outbound side of the chat transport.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Transport name for logging.
    fn name(&self) -> &str;

    /// Send a plain-text message.
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageRef, ChatError>;

    /// Send a message with one inline button per row.
    async fn send_with_buttons(
        &self,
        chat: ChatId,
        text: &str,
        buttons: &[InlineButton],
    ) -> Result<MessageRef, ChatError>;

    /// Replace the text of a sent message (its buttons are removed).
    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), ChatError>;

    /// Acknowledge a button press so the client stops its spinner.
    async fn answer_button(&self, callback_id: &str) -> Result<(), ChatError>;
}

/// Inbound side of the chat transport.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Wait for the next batch of events. May return an empty batch.
    async fn next_events(&self) -> Result<Vec<InboundEvent>, ChatError>;
}
