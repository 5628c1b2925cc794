use super::{
    types::{Config, MAX_SEARCH_RESULTS},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Telegram token and qBittorrent host are set
/// - qBittorrent and server ports are not 0
/// - At least one user is allowed
/// - Search provider URL is http(s) and keeps between 1 and 5 results
/// - Save path is set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.telegram.token.trim().is_empty() {
        return Err(invalid("telegram.token cannot be empty"));
    }

    if config.qbittorrent.host.trim().is_empty() {
        return Err(invalid("qbittorrent.host cannot be empty"));
    }
    if config.qbittorrent.port == 0 {
        return Err(invalid("qbittorrent.port cannot be 0"));
    }

    if config.access.allowed_users.is_empty() {
        return Err(invalid("access.allowed_users must list at least one user id"));
    }

    if !(config.search.url.starts_with("http://") || config.search.url.starts_with("https://")) {
        return Err(invalid("search.url must be an http(s) URL"));
    }
    if config.search.max_results == 0 {
        return Err(invalid("search.max_results cannot be 0"));
    }
    if config.search.max_results > MAX_SEARCH_RESULTS {
        return Err(ConfigError::ValidationError(format!(
            "search.max_results cannot exceed {}",
            MAX_SEARCH_RESULTS
        )));
    }

    if config.downloads.save_path.trim().is_empty() {
        return Err(invalid("downloads.save_path cannot be empty"));
    }

    if config.server.enabled && config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
