use std::sync::Arc;
use torrentbot_core::{BackendHandle, BackendStatus, Config, SanitizedConfig, SessionStore};

/// Shared application state
pub struct AppState {
    config: Config,
    backend: Arc<BackendHandle>,
    sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: Config, backend: Arc<BackendHandle>, sessions: Arc<SessionStore>) -> Self {
        Self {
            config,
            backend,
            sessions,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub async fn backend_status(&self) -> BackendStatus {
        self.backend.status().await
    }

    pub fn backend_name(&self) -> &str {
        self.backend.backend_name()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}
