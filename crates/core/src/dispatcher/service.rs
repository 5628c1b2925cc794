//! Submission of identifiers to the torrent backend.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::identifier::{classify, IdentifierKind};
use crate::metrics::DISPATCHES_TOTAL;
use crate::torrent_client::{AddTorrentRequest, TorrentClientError, TorrentInfo, TorrentState};

use super::handle::BackendHandle;
use super::types::DispatchError;

/// Validates identifiers and hands them to the shared backend connection.
///
/// Backend calls run on a spawned task and are awaited through its join
/// handle, so a panic inside the client surfaces as
/// [`DispatchError::Unexpected`] instead of tearing down the interaction.
pub struct Dispatcher {
    backend: Arc<BackendHandle>,
}

impl Dispatcher {
    pub fn new(backend: Arc<BackendHandle>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<BackendHandle> {
        &self.backend
    }

    /// Submit a magnet URI or `.torrent` link for download into `save_path`.
    pub async fn submit(&self, identifier: &str, save_path: &str) -> Result<(), DispatchError> {
        let request = match classify(identifier) {
            IdentifierKind::Magnet => AddTorrentRequest::magnet(identifier),
            IdentifierKind::TorrentLink => AddTorrentRequest::url(identifier),
            IdentifierKind::Invalid => {
                warn!(identifier = %identifier, "Rejected invalid torrent identifier");
                let err = DispatchError::InvalidIdentifier;
                DISPATCHES_TOTAL.with_label_values(&[err.outcome()]).inc();
                return Err(err);
            }
        }
        .with_download_path(save_path);

        debug!(identifier = %identifier, save_path = %save_path, "Submitting torrent");

        let backend = Arc::clone(&self.backend);
        let result = offload(async move {
            let client = backend.client().await?;
            client.add_torrent(request).await
        })
        .await;

        match result {
            Ok(added) => {
                DISPATCHES_TOTAL.with_label_values(&["success"]).inc();
                info!(hash = %added.hash, "Torrent added");
                Ok(())
            }
            Err(err) => {
                DISPATCHES_TOTAL.with_label_values(&[err.outcome()]).inc();
                if let DispatchError::Unexpected(detail) = &err {
                    error!(identifier = %identifier, error = %detail, "Unexpected error while adding torrent");
                } else {
                    warn!(identifier = %identifier, error = %err, "Failed to add torrent");
                }
                Err(err)
            }
        }
    }

    /// Torrents whose state is one of `states`, with a single list call.
    pub async fn active_torrents(
        &self,
        states: &[TorrentState],
    ) -> Result<Vec<TorrentInfo>, DispatchError> {
        let backend = Arc::clone(&self.backend);
        let torrents = offload(async move {
            let client = backend.client().await?;
            client.list_torrents().await
        })
        .await
        .inspect_err(|e| warn!(error = %e, "Failed to list torrents"))?;

        let total = torrents.len();
        let active: Vec<TorrentInfo> = torrents
            .into_iter()
            .filter(|t| states.contains(&t.state))
            .collect();
        debug!(total, active = active.len(), "Listed torrents");
        Ok(active)
    }
}

/// Run a backend call on its own task and wait for it.
async fn offload<T, F>(call: F) -> Result<T, DispatchError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, TorrentClientError>> + Send + 'static,
{
    match tokio::spawn(call).await {
        Ok(result) => result.map_err(DispatchError::from),
        Err(e) => Err(DispatchError::Unexpected(format!("backend worker failed: {}", e))),
    }
}
