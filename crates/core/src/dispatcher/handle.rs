//! Shared, lazily established backend connection.

use std::sync::Arc;

use tokio::sync::{OnceCell, RwLock};
use tracing::{info, warn};

use crate::metrics::BACKEND_LOGINS;
use crate::torrent_client::{TorrentClient, TorrentClientError, TorrentConnector};

use super::types::BackendStatus;

type Connection = Result<Arc<dyn TorrentClient>, TorrentClientError>;

/// A single authenticated backend session shared by every dispatch.
///
/// The first caller logs in; concurrent first callers wait for that one
/// login. The outcome is cached, including failures, until [`reset`] is
/// called. With `reconnect_on_connection_failure`, a cached
/// `ConnectionFailed` is dropped by the next caller, which logs in once more.
///
/// [`reset`]: BackendHandle::reset
pub struct BackendHandle {
    connector: Arc<dyn TorrentConnector>,
    reconnect_on_connection_failure: bool,
    cell: RwLock<Arc<OnceCell<Connection>>>,
}

impl BackendHandle {
    pub fn new(connector: Arc<dyn TorrentConnector>, reconnect_on_connection_failure: bool) -> Self {
        Self {
            connector,
            reconnect_on_connection_failure,
            cell: RwLock::new(Arc::new(OnceCell::new())),
        }
    }

    /// The logged-in client, connecting on first use.
    pub async fn client(&self) -> Result<Arc<dyn TorrentClient>, TorrentClientError> {
        let cell = self.current_cell().await;
        let mut fresh = false;
        let outcome = cell
            .get_or_init(|| {
                fresh = true;
                self.login()
            })
            .await
            .clone();

        match outcome {
            Err(TorrentClientError::ConnectionFailed(reason))
                if self.reconnect_on_connection_failure && !fresh =>
            {
                warn!(
                    backend = %self.connector.name(),
                    reason = %reason,
                    "Discarding cached connection failure, reconnecting"
                );
                self.discard(&cell).await;
                let retry = self.current_cell().await;
                retry.get_or_init(|| self.login()).await.clone()
            }
            other => other,
        }
    }

    /// Forget the cached connection (or failure); the next caller logs in again.
    pub async fn reset(&self) {
        *self.cell.write().await = Arc::new(OnceCell::new());
        info!(backend = %self.connector.name(), "Backend connection reset");
    }

    /// Current state of the cached connection.
    pub async fn status(&self) -> BackendStatus {
        match self.current_cell().await.get() {
            None => BackendStatus::NotConnected,
            Some(Ok(_)) => BackendStatus::Connected,
            Some(Err(e)) => BackendStatus::Failed(e.to_string()),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.connector.name()
    }

    async fn current_cell(&self) -> Arc<OnceCell<Connection>> {
        Arc::clone(&*self.cell.read().await)
    }

    /// Replace `stale` unless another caller already did.
    async fn discard(&self, stale: &Arc<OnceCell<Connection>>) {
        let mut cell = self.cell.write().await;
        if Arc::ptr_eq(&*cell, stale) {
            *cell = Arc::new(OnceCell::new());
        }
    }

    async fn login(&self) -> Connection {
        match self.connector.connect().await {
            Ok(client) => {
                BACKEND_LOGINS.with_label_values(&["success"]).inc();
                info!(backend = %self.connector.name(), "Connected to torrent backend");
                Ok(client)
            }
            Err(e) => {
                BACKEND_LOGINS.with_label_values(&["failed"]).inc();
                warn!(backend = %self.connector.name(), error = %e, "Torrent backend login failed");
                Err(e)
            }
        }
    }
}
