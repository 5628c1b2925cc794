//! Per-event interaction handling.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::auth::AccessGuard;
use crate::chat::{ChatError, ChatId, ChatTransport, InboundEvent, InlineButton, MessageRef, UserId};
use crate::dispatcher::{Dispatcher, SUCCESS_MESSAGE};
use crate::metrics::{ACCESS_DENIED_TOTAL, EVENTS_TOTAL, HANDLES_NOT_FOUND, TRANSPORT_ERRORS};
use crate::searcher::Searcher;
use crate::session::{SessionError, SessionStore};

use super::command::{download_payload, ButtonAction, Command};
use super::config::OrchestratorConfig;
use super::replies;

/// A recognised inbound event, before authorization.
enum Route {
    Command(Command),
    Button {
        callback_id: String,
        message: Option<MessageRef>,
        payload: String,
    },
}

impl Route {
    fn kind(&self) -> &'static str {
        match self {
            Route::Command(command) => command.kind(),
            Route::Button { .. } => "button",
        }
    }
}

/// Drives every user interaction.
///
/// [`BotOrchestrator::handle_event`] is the only way in; it consults the
/// access guard before any handler runs.
pub struct BotOrchestrator {
    config: OrchestratorConfig,
    guard: Arc<dyn AccessGuard>,
    transport: Arc<dyn ChatTransport>,
    searcher: Arc<dyn Searcher>,
    sessions: Arc<SessionStore>,
    dispatcher: Arc<Dispatcher>,
}

impl BotOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        guard: Arc<dyn AccessGuard>,
        transport: Arc<dyn ChatTransport>,
        searcher: Arc<dyn Searcher>,
        sessions: Arc<SessionStore>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            config,
            guard,
            transport,
            searcher,
            sessions,
            dispatcher,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Handle one inbound event end to end.
    ///
    /// Errors are chat transport failures while replying; the interaction
    /// itself never fails.
    pub async fn handle_event(&self, event: InboundEvent) -> Result<(), ChatError> {
        let user = event.user();
        let chat = event.chat();

        let route = match event {
            InboundEvent::Message { text, .. } => match Command::parse(&text) {
                Some(command) => Route::Command(command),
                None => {
                    EVENTS_TOTAL.with_label_values(&["ignored"]).inc();
                    debug!(user = %user, "Ignoring non-command message");
                    return Ok(());
                }
            },
            InboundEvent::ButtonPressed {
                callback_id,
                message,
                payload,
                ..
            } => Route::Button {
                callback_id,
                message,
                payload,
            },
        };
        EVENTS_TOTAL.with_label_values(&[route.kind()]).inc();

        if !self.guard.authorize(user) {
            return self.deny(user, chat, route).await;
        }

        match route {
            Route::Command(Command::Start) => self.reply(chat, replies::START).await,
            Route::Command(Command::Search(query)) => self.search(user, chat, query).await,
            Route::Command(Command::Download(url)) => self.download(chat, url).await,
            Route::Command(Command::Active) => self.active(chat).await,
            Route::Button {
                callback_id,
                message,
                payload,
            } => self.button(user, chat, &callback_id, message, &payload).await,
        }
    }

    async fn deny(&self, user: UserId, chat: ChatId, route: Route) -> Result<(), ChatError> {
        ACCESS_DENIED_TOTAL.inc();
        warn!(user = %user, action = route.kind(), "Unauthorized access attempt");
        if let Route::Button { callback_id, .. } = &route {
            self.acknowledge(callback_id).await;
        }
        self.reply(chat, replies::ACCESS_DENIED).await
    }

    async fn search(
        &self,
        user: UserId,
        chat: ChatId,
        query: Option<String>,
    ) -> Result<(), ChatError> {
        let Some(query) = query else {
            return self.reply(chat, replies::SEARCH_USAGE).await;
        };

        self.reply(chat, &replies::searching(&query)).await?;

        let mut draft = self.sessions.start_session(user).await;
        let results = self.searcher.search(&query).await;
        if results.is_empty() {
            info!(user = %user, query = %query, "Search returned no results");
            return self.reply(chat, replies::NO_RESULTS).await;
        }

        let buttons: Vec<InlineButton> = results
            .iter()
            .map(|result| {
                let handle = draft.record(result.identifier.as_str());
                InlineButton::new(replies::button_label(handle), download_payload(handle))
            })
            .collect();
        let session = self.sessions.publish(draft).await;

        let sent = self
            .transport
            .send_with_buttons(chat, &replies::search_results(&results), &buttons)
            .await
            .inspect_err(|_| {
                TRANSPORT_ERRORS.with_label_values(&["reply"]).inc();
            })?;
        self.sessions.anchor(user, session, sent.message).await;

        info!(user = %user, query = %query, results = results.len(), "Search results sent");
        Ok(())
    }

    async fn button(
        &self,
        user: UserId,
        chat: ChatId,
        callback_id: &str,
        message: Option<MessageRef>,
        payload: &str,
    ) -> Result<(), ChatError> {
        self.acknowledge(callback_id).await;

        let handle = match ButtonAction::parse(payload) {
            ButtonAction::Download(handle) => handle,
            ButtonAction::MalformedHandle(raw) => {
                HANDLES_NOT_FOUND.inc();
                debug!(user = %user, handle = %raw, "Malformed download handle");
                return self
                    .reply_to_button(chat, message, replies::HANDLE_NOT_FOUND)
                    .await;
            }
            ButtonAction::Unknown => {
                debug!(user = %user, payload = %payload, "Unknown button action");
                return self
                    .reply_to_button(chat, message, replies::UNKNOWN_ACTION)
                    .await;
            }
        };

        let identifier = match message {
            Some(message) => {
                self.sessions
                    .resolve_anchored(user, message.message, handle)
                    .await
            }
            // Without the pressed message the session cannot be told apart from a stale one
            None => Err(SessionError::HandleNotFound { user, handle }),
        };

        let text = match identifier {
            Ok(identifier) => {
                debug!(user = %user, handle = %handle, identifier = %identifier, "Resolved handle");
                self.submit(&identifier).await
            }
            Err(e) => {
                HANDLES_NOT_FOUND.inc();
                info!(error = %e, "Stale or unknown download button");
                replies::HANDLE_NOT_FOUND
            }
        };
        self.reply_to_button(chat, message, text).await
    }

    async fn download(&self, chat: ChatId, url: Option<String>) -> Result<(), ChatError> {
        let Some(url) = url else {
            return self.reply(chat, replies::DOWNLOAD_USAGE).await;
        };
        let text = self.submit(&url).await;
        self.reply(chat, text).await
    }

    async fn active(&self, chat: ChatId) -> Result<(), ChatError> {
        let text = match self
            .dispatcher
            .active_torrents(&self.config.active_states)
            .await
        {
            Ok(torrents) if torrents.is_empty() => replies::NO_ACTIVE.to_string(),
            Ok(torrents) => replies::active_downloads(&torrents),
            Err(_) => replies::ACTIVE_FAILED.to_string(),
        };
        self.reply(chat, &text).await
    }

    /// Submit an identifier and return the outcome text.
    async fn submit(&self, identifier: &str) -> &'static str {
        match self
            .dispatcher
            .submit(identifier, &self.config.save_path)
            .await
        {
            Ok(()) => SUCCESS_MESSAGE,
            Err(e) => e.user_message(),
        }
    }

    async fn reply(&self, chat: ChatId, text: &str) -> Result<(), ChatError> {
        self.transport
            .send_text(chat, text)
            .await
            .map(|_| ())
            .inspect_err(|_| {
                TRANSPORT_ERRORS.with_label_values(&["reply"]).inc();
            })
    }

    /// Replace the pressed message's text, or reply when it is unknown.
    async fn reply_to_button(
        &self,
        chat: ChatId,
        message: Option<MessageRef>,
        text: &str,
    ) -> Result<(), ChatError> {
        match message {
            Some(message) => self.transport.edit_text(message, text).await.inspect_err(|_| {
                TRANSPORT_ERRORS.with_label_values(&["reply"]).inc();
            }),
            None => self.reply(chat, text).await,
        }
    }

    async fn acknowledge(&self, callback_id: &str) {
        if let Err(e) = self.transport.answer_button(callback_id).await {
            TRANSPORT_ERRORS.with_label_values(&["answer"]).inc();
            warn!(error = %e, "Failed to acknowledge button press");
        }
    }
}
