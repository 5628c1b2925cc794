//! Mock chat transport for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::chat::{
    ChatError, ChatId, ChatTransport, EventSource, InboundEvent, InlineButton, MessageId,
    MessageRef,
};

/// A message sent through the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub message: MessageRef,
    pub text: String,
    pub buttons: Vec<InlineButton>,
}

/// An edit performed through the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedMessage {
    pub message: MessageRef,
    pub text: String,
}

/// Mock implementation of ChatTransport and EventSource.
///
/// Records every outbound call and assigns increasing message ids. Inbound
/// batches (or errors) are queued with [`MockTransport::push_events`] and
/// [`MockTransport::push_error`]; an empty queue yields an empty batch after
/// a short pause, like an idle long poll.
#[derive(Debug, Default)]
pub struct MockTransport {
    sent: Mutex<Vec<SentMessage>>,
    edits: Mutex<Vec<EditedMessage>>,
    answered: Mutex<Vec<String>>,
    inbound: Mutex<VecDeque<Result<Vec<InboundEvent>, ChatError>>>,
    next_message_id: AtomicI64,
    fail_sends: AtomicBool,
    polls: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a batch of inbound events.
    pub async fn push_events(&self, events: Vec<InboundEvent>) {
        self.inbound.lock().await.push_back(Ok(events));
    }

    /// Queue a polling failure.
    pub async fn push_error(&self, error: ChatError) {
        self.inbound.lock().await.push_back(Err(error));
    }

    /// Make every outbound call fail.
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// All sent messages, oldest first.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Texts of all sent messages, oldest first.
    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().await.iter().map(|m| m.text.clone()).collect()
    }

    /// The most recent message carrying buttons.
    pub async fn last_with_buttons(&self) -> Option<SentMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|m| !m.buttons.is_empty())
            .cloned()
    }

    pub async fn edits(&self) -> Vec<EditedMessage> {
        self.edits.lock().await.clone()
    }

    /// Callback ids acknowledged so far.
    pub async fn answered(&self) -> Vec<String> {
        self.answered.lock().await.clone()
    }

    /// Number of times events were polled.
    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    fn check_send(&self) -> Result<(), ChatError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ChatError::ConnectionFailed("mock transport offline".to_string()));
        }
        Ok(())
    }

    async fn record(
        &self,
        chat: ChatId,
        text: &str,
        buttons: &[InlineButton],
    ) -> Result<MessageRef, ChatError> {
        self.check_send()?;
        let message = MessageRef {
            chat,
            message: MessageId(self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1),
        };
        self.sent.lock().await.push(SentMessage {
            message,
            text: text.to_string(),
            buttons: buttons.to_vec(),
        });
        Ok(message)
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageRef, ChatError> {
        self.record(chat, text, &[]).await
    }

    async fn send_with_buttons(
        &self,
        chat: ChatId,
        text: &str,
        buttons: &[InlineButton],
    ) -> Result<MessageRef, ChatError> {
        self.record(chat, text, buttons).await
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), ChatError> {
        self.check_send()?;
        self.edits.lock().await.push(EditedMessage {
            message,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn answer_button(&self, callback_id: &str) -> Result<(), ChatError> {
        self.check_send()?;
        self.answered.lock().await.push(callback_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl EventSource for MockTransport {
    async fn next_events(&self) -> Result<Vec<InboundEvent>, ChatError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let next = self.inbound.lock().await.pop_front();
        match next {
            Some(batch) => batch,
            None => {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(Vec::new())
            }
        }
    }
}
