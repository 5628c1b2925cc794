//! Types for torrent client operations.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during torrent client operations.
#[derive(Debug, Clone, Error)]
pub enum TorrentClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid torrent data: {0}")]
    InvalidTorrent(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// State of a torrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentState {
    /// Downloading from peers.
    Downloading,
    /// Seeding to peers.
    Seeding,
    /// Download or upload is paused.
    Paused,
    /// Checking file integrity.
    Checking,
    /// Queued for download.
    Queued,
    /// Stalled (no peers).
    Stalled,
    /// Error state.
    Error,
    /// Unknown state.
    Unknown,
}

impl TorrentState {
    /// Returns the string representation used in config and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TorrentState::Downloading => "downloading",
            TorrentState::Seeding => "seeding",
            TorrentState::Paused => "paused",
            TorrentState::Checking => "checking",
            TorrentState::Queued => "queued",
            TorrentState::Stalled => "stalled",
            TorrentState::Error => "error",
            TorrentState::Unknown => "unknown",
        }
    }
}

/// Information about a torrent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentInfo {
    /// Info hash (lowercase hex).
    pub hash: String,
    /// Torrent name.
    pub name: String,
    /// Current state.
    pub state: TorrentState,
    /// Download progress (0.0 - 1.0).
    pub progress: f64,
    /// Total size in bytes.
    pub size_bytes: u64,
}

/// Request to add a new torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddTorrentRequest {
    /// Add via magnet URI.
    Magnet {
        /// Magnet URI.
        uri: String,
        /// Optional download path override.
        download_path: Option<String>,
    },
    /// Add via a link to a .torrent file, fetched by the client itself.
    Url {
        /// Link to the .torrent file.
        url: String,
        /// Optional download path override.
        download_path: Option<String>,
    },
}

impl AddTorrentRequest {
    /// Create a magnet request with default options.
    pub fn magnet(uri: impl Into<String>) -> Self {
        AddTorrentRequest::Magnet {
            uri: uri.into(),
            download_path: None,
        }
    }

    /// Create a torrent link request with default options.
    pub fn url(url: impl Into<String>) -> Self {
        AddTorrentRequest::Url {
            url: url.into(),
            download_path: None,
        }
    }

    /// Set the download path.
    pub fn with_download_path(mut self, path: impl Into<String>) -> Self {
        match &mut self {
            AddTorrentRequest::Magnet { download_path, .. }
            | AddTorrentRequest::Url { download_path, .. } => {
                *download_path = Some(path.into());
            }
        }
        self
    }

    /// The magnet URI or link being added.
    pub fn source(&self) -> &str {
        match self {
            AddTorrentRequest::Magnet { uri, .. } => uri,
            AddTorrentRequest::Url { url, .. } => url,
        }
    }

    pub fn download_path(&self) -> Option<&str> {
        match self {
            AddTorrentRequest::Magnet { download_path, .. }
            | AddTorrentRequest::Url { download_path, .. } => download_path.as_deref(),
        }
    }
}

/// Result of adding a torrent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTorrentResult {
    /// Info hash of the added torrent (empty when not derivable from the request).
    pub hash: String,
}

/// Trait for an authenticated torrent client session.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Add a new torrent.
    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError>;

    /// List all torrents.
    async fn list_torrents(&self) -> Result<Vec<TorrentInfo>, TorrentClientError>;
}

/// Establishes an authenticated [`TorrentClient`] session (login).
#[async_trait]
pub trait TorrentConnector: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Connect and log in.
    async fn connect(&self) -> Result<Arc<dyn TorrentClient>, TorrentClientError>;
}
