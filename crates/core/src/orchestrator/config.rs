//! Orchestrator configuration.

use crate::config::DownloadsConfig;
use crate::torrent_client::TorrentState;

/// Settings the orchestrator applies to every interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Save path handed to the backend with every submission.
    pub save_path: String,
    /// States listed by `/active`.
    pub active_states: Vec<TorrentState>,
}

impl From<&DownloadsConfig> for OrchestratorConfig {
    fn from(config: &DownloadsConfig) -> Self {
        Self {
            save_path: config.save_path.clone(),
            active_states: config.active_states.clone(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&DownloadsConfig::default())
    }
}
