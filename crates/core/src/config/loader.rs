use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for structured environment overrides (`TORRENTBOT_QBITTORRENT__HOST`).
pub const ENV_PREFIX: &str = "TORRENTBOT_";

/// Map the flat variables used by existing deployments onto config keys.
fn legacy_env_key(key: &str) -> Option<&'static str> {
    match key.to_ascii_uppercase().as_str() {
        "TELEGRAM_BOT_TOKEN" => Some("telegram.token"),
        "QB_HOST" => Some("qbittorrent.host"),
        "QB_PORT" => Some("qbittorrent.port"),
        "QB_USERNAME" => Some("qbittorrent.username"),
        "QB_PASSWORD" => Some("qbittorrent.password"),
        "DOWNLOAD_PATH" => Some("downloads.save_path"),
        "ALLOWED_USERS" => Some("access.allowed_users"),
        _ => None,
    }
}

fn figment(path: Option<&Path>) -> Figment {
    let mut figment = Figment::new();
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    figment
        .merge(Env::raw().filter_map(|key| legacy_env_key(key.as_str()).map(Into::into)))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load configuration from an optional TOML file with environment variable overrides
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
    }

    figment(path)
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_legacy_env_keys() {
        assert_eq!(legacy_env_key("TELEGRAM_BOT_TOKEN"), Some("telegram.token"));
        assert_eq!(legacy_env_key("qb_host"), Some("qbittorrent.host"));
        assert_eq!(legacy_env_key("DOWNLOAD_PATH"), Some("downloads.save_path"));
        assert_eq!(legacy_env_key("ALLOWED_USERS"), Some("access.allowed_users"));
        assert_eq!(legacy_env_key("PATH"), None);
    }

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[telegram]
token = "123:abc"

[qbittorrent]
host = "qb.local"
port = 8080
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.qbittorrent.port, 8080);
    }

    #[test]
    fn test_load_config_from_str_missing_qbittorrent() {
        let toml = r#"
[telegram]
token = "123:abc"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Some(Path::new("/nonexistent/config.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[telegram]
token = "123:abc"

[qbittorrent]
host = "qb.local"
username = "admin"

[access]
allowed_users = [111, 222]
"#
        )
        .unwrap();

        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            let config = load_config(Some(temp_file.path())).unwrap();
            assert_eq!(config.qbittorrent.host, "qb.local");
            assert_eq!(config.access.allowed_users, vec![111, 222]);
            Ok(())
        });
    }

    #[test]
    fn test_legacy_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "config.toml",
                r#"
[telegram]
token = "from-file"

[qbittorrent]
host = "qb.local"
"#,
            )?;
            jail.set_env("TELEGRAM_BOT_TOKEN", "from-env");
            jail.set_env("QB_PORT", "9443");
            jail.set_env("QB_PASSWORD", "123456");
            jail.set_env("ALLOWED_USERS", "123456789");
            jail.set_env("DOWNLOAD_PATH", "/srv/torrents");

            let config = load_config(Some(Path::new("config.toml"))).unwrap();
            assert_eq!(config.telegram.token, "from-env");
            assert_eq!(config.qbittorrent.port, 9443);
            assert_eq!(config.qbittorrent.password, "123456");
            assert_eq!(config.access.allowed_users, vec![123456789]);
            assert_eq!(config.downloads.save_path, "/srv/torrents");
            Ok(())
        });
    }

    #[test]
    fn test_env_only_configuration() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("TELEGRAM_BOT_TOKEN", "123:abc");
            jail.set_env("QB_HOST", "qb.example.com");
            jail.set_env("TORRENTBOT_SEARCH__MAX_RESULTS", "3");

            let config = load_config(None).unwrap();
            assert_eq!(config.telegram.token, "123:abc");
            assert_eq!(config.qbittorrent.host, "qb.example.com");
            assert_eq!(config.qbittorrent.port, 443);
            assert_eq!(config.search.max_results, 3);
            Ok(())
        });
    }
}
