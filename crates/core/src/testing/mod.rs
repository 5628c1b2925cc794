//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides mock implementations of all external service traits,
//! allowing bot flows to be tested without Telegram, a search provider, or
//! qBittorrent.
//!
//! # Example
//!
//! ```rust,ignore
//! use torrentbot_core::testing::{fixtures, MockConnector, MockSearcher, MockTorrentClient, MockTransport};
//!
//! let searcher = MockSearcher::new();
//! searcher.set_results(fixtures::search_results("Naruto", 7)).await;
//!
//! let client = Arc::new(MockTorrentClient::new());
//! let connector = MockConnector::new(client.clone());
//! let transport = MockTransport::new();
//! ```

mod mock_searcher;
mod mock_torrent_client;
mod mock_transport;

pub use mock_searcher::MockSearcher;
pub use mock_torrent_client::{MockConnector, MockTorrentClient};
pub use mock_transport::{EditedMessage, MockTransport, SentMessage};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::chat::{ChatId, InboundEvent, MessageRef, UserId};
    use crate::config::{load_config_from_str, Config};
    use crate::searcher::SearchResult;
    use crate::torrent_client::{TorrentInfo, TorrentState};

    /// Allowed user in [`config`].
    pub const ALLOWED_USER: UserId = UserId(123456789);
    /// A user outside the allow-list of [`config`].
    pub const STRANGER: UserId = UserId(555);

    /// A magnet URI with a deterministic hash.
    pub fn magnet(n: usize) -> String {
        format!("magnet:?xt=urn:btih:{:040x}", n)
    }

    /// `count` results titled `"<title> - 01"`, `"<title> - 02"`, ... with magnets.
    pub fn search_results(title: &str, count: usize) -> Vec<SearchResult> {
        (1..=count)
            .map(|i| SearchResult::new(format!("{} - {:02}", title, i), magnet(i)))
            .collect()
    }

    /// A torrent as reported by the backend.
    pub fn torrent_info(hash: &str, name: &str, state: TorrentState, progress: f64) -> TorrentInfo {
        TorrentInfo {
            hash: hash.to_string(),
            name: name.to_string(),
            state,
            progress,
            size_bytes: 1024 * 1024 * 700, // 700 MB
        }
    }

    /// A text message from `user` in their private chat.
    pub fn message(user: UserId, text: &str) -> InboundEvent {
        InboundEvent::Message {
            user,
            chat: ChatId(user.0),
            text: text.to_string(),
        }
    }

    /// A button press from `user` on `message`.
    pub fn button(user: UserId, message: Option<MessageRef>, payload: &str) -> InboundEvent {
        InboundEvent::ButtonPressed {
            user,
            chat: message.map(|m| m.chat).unwrap_or(ChatId(user.0)),
            callback_id: format!("cb-{}", payload),
            message,
            payload: payload.to_string(),
        }
    }

    /// A valid configuration allowing [`ALLOWED_USER`].
    pub fn config() -> Config {
        load_config_from_str(
            r#"
[telegram]
token = "123:test-token"

[qbittorrent]
host = "qb.example.com"
username = "admin"
password = "secret"

[access]
allowed_users = [123456789]

[downloads]
save_path = "/downloads"
"#,
        )
        .expect("fixture config is valid")
    }
}
