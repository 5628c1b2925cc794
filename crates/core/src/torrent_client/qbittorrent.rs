//! qBittorrent torrent client implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::QBittorrentConfig;

use super::{
    AddTorrentRequest, AddTorrentResult, TorrentClient, TorrentClientError, TorrentConnector,
    TorrentInfo, TorrentState,
};

/// qBittorrent client implementation.
pub struct QBittorrentClient {
    client: Client,
    config: QBittorrentConfig,
    base_url: String,
    /// Session marker (the SID cookie itself lives in the cookie jar).
    session: Arc<RwLock<Option<String>>>,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client. Does not contact the server.
    pub fn new(config: QBittorrentConfig) -> Result<Self, TorrentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .danger_accept_invalid_certs(!config.verify_certificate)
            .build()
            .map_err(|e| TorrentClientError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            config,
            session: Arc::new(RwLock::new(None)),
        })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Login and store session cookie.
    pub async fn login(&self) -> Result<(), TorrentClientError> {
        let url = format!("{}/api/v2/auth/login", self.base_url());

        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            // qBittorrent rejects logins whose Referer does not match the host
            .header(reqwest::header::REFERER, self.base_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TorrentClientError::Timeout
                } else {
                    TorrentClientError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains("Ok.") {
            debug!("qBittorrent login successful");
            let mut session = self.session.write().await;
            *session = Some("authenticated".to_string());
            Ok(())
        } else if body.contains("Fails.") || status.as_u16() == 403 {
            Err(TorrentClientError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(TorrentClientError::AuthenticationFailed(format!(
                "Unexpected response: HTTP {} {}",
                status,
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    /// Ensure we have a valid session, logging in if needed.
    async fn ensure_authenticated(&self) -> Result<(), TorrentClientError> {
        let session = self.session.read().await;
        if session.is_some() {
            return Ok(());
        }
        drop(session);
        self.login().await
    }

    /// Make an authenticated GET request.
    async fn get(&self, endpoint: &str) -> Result<String, TorrentClientError> {
        self.ensure_authenticated().await?;

        let url = format!("{}{}", self.base_url(), endpoint);
        let response = self.client.get(&url).send().await.map_err(map_request_error)?;

        let response = if response.status().as_u16() == 403 {
            // Session expired, retry after login
            warn!("qBittorrent session expired, re-authenticating");
            {
                let mut session = self.session.write().await;
                *session = None;
            }
            self.login().await?;

            self.client.get(&url).send().await.map_err(map_request_error)?
        } else {
            response
        };

        let status = response.status();
        if !status.is_success() {
            return Err(TorrentClientError::ApiError(format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| TorrentClientError::ApiError(e.to_string()))
    }

    /// Make an authenticated POST request with multipart data.
    ///
    /// `form` is called once per attempt, since a sent form cannot be reused.
    async fn post_multipart<F>(&self, endpoint: &str, form: F) -> Result<String, TorrentClientError>
    where
        F: Fn() -> multipart::Form,
    {
        self.ensure_authenticated().await?;

        let url = format!("{}{}", self.base_url(), endpoint);
        let response = self
            .client
            .post(&url)
            .multipart(form())
            .send()
            .await
            .map_err(map_request_error)?;

        let response = if response.status().as_u16() == 403 {
            // Session expired, retry after login
            warn!("qBittorrent session expired, re-authenticating");
            {
                let mut session = self.session.write().await;
                *session = None;
            }
            self.login().await?;

            self.client
                .post(&url)
                .multipart(form())
                .send()
                .await
                .map_err(map_request_error)?
        } else {
            response
        };

        let status = response.status();
        if !status.is_success() {
            return Err(TorrentClientError::ApiError(format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| TorrentClientError::ApiError(e.to_string()))
    }
}

fn map_request_error(e: reqwest::Error) -> TorrentClientError {
    if e.is_timeout() {
        TorrentClientError::Timeout
    } else if e.is_connect() {
        TorrentClientError::ConnectionFailed(e.to_string())
    } else {
        TorrentClientError::ApiError(e.to_string())
    }
}

/// qBittorrent torrent info response.
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    hash: String,
    name: String,
    state: String,
    progress: f64,
    #[serde(default)]
    size: i64,
}

impl QBTorrentInfo {
    fn into_torrent_info(self) -> TorrentInfo {
        TorrentInfo {
            hash: self.hash.to_lowercase(),
            name: self.name,
            state: parse_qb_state(&self.state),
            progress: self.progress.clamp(0.0, 1.0),
            size_bytes: self.size.max(0) as u64,
        }
    }
}

/// Parse qBittorrent state string to TorrentState.
fn parse_qb_state(state: &str) -> TorrentState {
    match state {
        "downloading" | "forcedDL" | "metaDL" | "forcedMetaDL" | "allocating" => {
            TorrentState::Downloading
        }
        "uploading" | "forcedUP" => TorrentState::Seeding,
        "pausedDL" | "pausedUP" | "stoppedDL" | "stoppedUP" => TorrentState::Paused,
        "checkingDL" | "checkingUP" | "checkingResumeData" | "moving" => TorrentState::Checking,
        "queuedDL" | "queuedUP" => TorrentState::Queued,
        "stalledDL" | "stalledUP" => TorrentState::Stalled,
        "error" | "missingFiles" => TorrentState::Error,
        _ => TorrentState::Unknown,
    }
}

#[async_trait]
impl TorrentClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError> {
        let form = || {
            let form = multipart::Form::new().text("urls", request.source().to_string());
            match request.download_path() {
                Some(path) => form.text("savepath", path.to_string()),
                None => form,
            }
        };

        let body = self.post_multipart("/api/v2/torrents/add", form).await?;
        if body.trim() == "Fails." {
            return Err(TorrentClientError::InvalidTorrent(format!(
                "qBittorrent rejected {}",
                request.source()
            )));
        }

        let hash = match &request {
            AddTorrentRequest::Magnet { uri, .. } => {
                extract_hash_from_magnet(uri).unwrap_or_default()
            }
            // Link is fetched by qBittorrent; the hash is unknown until then
            AddTorrentRequest::Url { .. } => String::new(),
        };

        debug!(source = request.source(), "Torrent submitted to qBittorrent");
        Ok(AddTorrentResult { hash })
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentInfo>, TorrentClientError> {
        let response = self.get("/api/v2/torrents/info").await?;
        let torrents: Vec<QBTorrentInfo> = serde_json::from_str(&response).map_err(|e| {
            TorrentClientError::ApiError(format!("Failed to parse response: {}", e))
        })?;

        Ok(torrents.into_iter().map(|t| t.into_torrent_info()).collect())
    }
}

/// Logs in to qBittorrent and hands out the authenticated client.
pub struct QBittorrentConnector {
    config: QBittorrentConfig,
}

impl QBittorrentConnector {
    pub fn new(config: QBittorrentConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TorrentConnector for QBittorrentConnector {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn connect(&self) -> Result<Arc<dyn TorrentClient>, TorrentClientError> {
        let client = QBittorrentClient::new(self.config.clone())?;
        client.login().await?;
        info!(url = %client.base_url(), "Connected and authenticated with qBittorrent");
        Ok(Arc::new(client))
    }
}

/// Extract info hash from a magnet URI.
fn extract_hash_from_magnet(magnet: &str) -> Option<String> {
    let (_, query) = magnet.split_once('?')?;
    query
        .split('&')
        .find_map(|param| param.strip_prefix("xt=urn:btih:"))
        .map(|hash| hash.to_lowercase())
}
