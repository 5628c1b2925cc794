//! Dispatch outcomes.

use serde::Serialize;
use thiserror::Error;

use crate::torrent_client::TorrentClientError;

/// Reply sent after a torrent was accepted by the backend.
pub const SUCCESS_MESSAGE: &str = "torrent added to qbittorrent successfully!";

/// Errors surfaced to the user when a submission fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Identifier is neither a magnet URI nor a .torrent link")]
    InvalidIdentifier,

    #[error("Backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Backend authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl DispatchError {
    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            DispatchError::InvalidIdentifier => {
                "invalid torrent URL. please provide a valid .torrent file link or a magnet link."
            }
            DispatchError::ConnectionFailed(_) => {
                "failed to connect to qbittorrent. please check the bot's configuration."
            }
            DispatchError::AuthenticationFailed(_) => {
                "authentication with qbittorrent failed. please verify the credentials."
            }
            DispatchError::Unexpected(_) => {
                "an unexpected error occurred while adding the torrent. please try again later."
            }
        }
    }

    /// Metric label for this failure.
    pub fn outcome(&self) -> &'static str {
        match self {
            DispatchError::InvalidIdentifier => "invalid_identifier",
            DispatchError::ConnectionFailed(_) => "connection_failed",
            DispatchError::AuthenticationFailed(_) => "authentication_failed",
            DispatchError::Unexpected(_) => "unexpected",
        }
    }
}

impl From<TorrentClientError> for DispatchError {
    fn from(err: TorrentClientError) -> Self {
        match err {
            TorrentClientError::ConnectionFailed(msg) => DispatchError::ConnectionFailed(msg),
            TorrentClientError::Timeout => DispatchError::ConnectionFailed("request timed out".to_string()),
            TorrentClientError::AuthenticationFailed(msg) => {
                DispatchError::AuthenticationFailed(msg)
            }
            other => DispatchError::Unexpected(other.to_string()),
        }
    }
}

/// Snapshot of the shared backend connection, for health reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum BackendStatus {
    /// No login attempted yet (or the handle was reset).
    NotConnected,
    /// Logged in.
    Connected,
    /// The cached login attempt failed.
    Failed(String),
}
