use serde::{Deserialize, Deserializer, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::torrent_client::TorrentState;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub qbittorrent: QBittorrentConfig,
    #[serde(default)]
    pub search: SearchProviderConfig,
    #[serde(default)]
    pub access: AccessConfig,
    #[serde(default)]
    pub downloads: DownloadsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Telegram Bot API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    #[serde(deserialize_with = "lenient_string")]
    pub token: String,
    /// Bot API base URL (without the `/bot<token>` suffix)
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
    /// Long-polling timeout passed to `getUpdates`
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u32,
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u32 {
    30
}

/// qBittorrent Web API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// Hostname without protocol (e.g., "torrents.example.com")
    #[serde(deserialize_with = "lenient_string")]
    pub host: String,
    #[serde(default = "default_qb_port")]
    pub port: u16,
    /// "https" or "http"
    #[serde(default = "default_qb_scheme")]
    pub scheme: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub username: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub password: String,
    /// Verify the Web UI TLS certificate
    #[serde(default = "default_true")]
    pub verify_certificate: bool,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl QBittorrentConfig {
    /// Base URL of the Web UI, without trailing slash.
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}:{}", host, self.port)
        } else {
            format!("{}://{}:{}", self.scheme, host, self.port)
        }
    }
}

fn default_qb_port() -> u16 {
    443
}

fn default_qb_scheme() -> String {
    "https".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u32 {
    30
}

/// Search provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchProviderConfig {
    /// Provider endpoint (queried with `q`, `page`, `sort`, `order`)
    #[serde(default = "default_search_url")]
    pub url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Results kept per search (at most [`MAX_SEARCH_RESULTS`])
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for SearchProviderConfig {
    fn default() -> Self {
        Self {
            url: default_search_url(),
            timeout_secs: default_timeout(),
            max_results: default_max_results(),
        }
    }
}

fn default_search_url() -> String {
    "https://nyaaapi.onrender.com/nyaa".to_string()
}

/// Upper bound on results shown per search.
pub const MAX_SEARCH_RESULTS: usize = 5;

fn default_max_results() -> usize {
    MAX_SEARCH_RESULTS
}

/// Access control configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AccessConfig {
    /// Telegram user ids allowed to use the bot
    #[serde(default, deserialize_with = "user_id_list")]
    pub allowed_users: Vec<i64>,
}

/// Download behaviour configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadsConfig {
    /// Save path handed to qBittorrent with every torrent
    #[serde(default = "default_save_path")]
    pub save_path: String,
    /// States listed by `/active`
    #[serde(default = "default_active_states")]
    pub active_states: Vec<TorrentState>,
    /// Drop a cached connection failure and log in again on the next request
    #[serde(default)]
    pub reconnect_on_connection_failure: bool,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            save_path: default_save_path(),
            active_states: default_active_states(),
            reconnect_on_connection_failure: false,
        }
    }
}

fn default_save_path() -> String {
    "/home/ubuntu/downloads".to_string()
}

fn default_active_states() -> Vec<TorrentState> {
    vec![TorrentState::Downloading, TorrentState::Seeding]
}

/// Health/metrics HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
    8080
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    /// Optional file that receives a copy of every log line
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Accepts strings as well as bare numbers, which env providers produce for
/// numeric-looking passwords and usernames.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Str(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::Str(s) => s,
        Lenient::Int(n) => n.to_string(),
        Lenient::Float(n) => n.to_string(),
        Lenient::Bool(b) => b.to_string(),
    })
}

/// Accepts a list of ids, a single id, or a comma/space separated string.
fn user_id_list<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum UserIds {
        List(Vec<i64>),
        Single(i64),
        Text(String),
    }

    match UserIds::deserialize(deserializer)? {
        UserIds::List(ids) => Ok(ids),
        UserIds::Single(id) => Ok(vec![id]),
        UserIds::Text(text) => text
            .trim_matches(|c| c == '[' || c == ']')
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<i64>().map_err(|_| {
                    serde::de::Error::custom(format!("invalid user id: {}", part))
                })
            })
            .collect(),
    }
}

/// Sanitized config for logs and API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub telegram: SanitizedTelegramConfig,
    pub qbittorrent: SanitizedQBittorrentConfig,
    pub search: SearchProviderConfig,
    pub allowed_users: usize,
    pub downloads: DownloadsConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTelegramConfig {
    pub api_url: String,
    pub token_configured: bool,
    pub poll_timeout_secs: u32,
}

/// Sanitized qBittorrent config (credentials hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedQBittorrentConfig {
    pub url: String,
    pub username: String,
    pub password_configured: bool,
    pub verify_certificate: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            telegram: SanitizedTelegramConfig {
                api_url: config.telegram.api_url.clone(),
                token_configured: !config.telegram.token.is_empty(),
                poll_timeout_secs: config.telegram.poll_timeout_secs,
            },
            qbittorrent: SanitizedQBittorrentConfig {
                url: config.qbittorrent.base_url(),
                username: config.qbittorrent.username.clone(),
                password_configured: !config.qbittorrent.password.is_empty(),
                verify_certificate: config.qbittorrent.verify_certificate,
                timeout_secs: config.qbittorrent.timeout_secs,
            },
            search: config.search.clone(),
            allowed_users: config.access.allowed_users.len(),
            downloads: config.downloads.clone(),
            server: config.server.clone(),
        }
    }
}
