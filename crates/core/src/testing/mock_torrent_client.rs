//! Mock torrent client and connector for testing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::torrent_client::{
    AddTorrentRequest, AddTorrentResult, TorrentClient, TorrentClientError, TorrentConnector,
    TorrentInfo,
};

/// Mock implementation of the TorrentClient trait.
///
/// Provides controllable behavior for testing:
/// - Track added torrents for assertions
/// - Serve a configurable torrent list
/// - Simulate failures
///
/// # Example
///
/// ```rust,ignore
/// let client = MockTorrentClient::new();
/// client.add_torrent(AddTorrentRequest::magnet("magnet:?...")).await?;
///
/// let added = client.added_torrents().await;
/// assert_eq!(added.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockTorrentClient {
    /// Recorded add_torrent calls.
    added: Arc<RwLock<Vec<AddTorrentRequest>>>,
    /// Torrents returned by list_torrents.
    torrents: Arc<RwLock<Vec<TorrentInfo>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<TorrentClientError>>>,
    panic_on_add: AtomicBool,
    add_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl MockTorrentClient {
    /// Create a new mock torrent client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded add_torrent requests.
    pub async fn added_torrents(&self) -> Vec<AddTorrentRequest> {
        self.added.read().await.clone()
    }

    /// Replace the torrent list.
    pub async fn set_torrents(&self, torrents: Vec<TorrentInfo>) {
        *self.torrents.write().await = torrents;
    }

    /// Set an error to be returned on the next operation.
    pub async fn set_next_error(&self, error: TorrentClientError) {
        *self.next_error.write().await = Some(error);
    }

    /// Panic inside add_torrent, to exercise worker failure handling.
    pub fn set_panic_on_add(&self, panic: bool) {
        self.panic_on_add.store(panic, Ordering::SeqCst);
    }

    /// Number of add_torrent calls, including failed ones.
    pub fn add_count(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    /// Number of list_torrents calls, including failed ones.
    pub fn list_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    async fn take_error(&self) -> Option<TorrentClientError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError> {
        let call = self.add_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.panic_on_add.load(Ordering::SeqCst) {
            panic!("mock torrent client panicked on add");
        }
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        self.added.write().await.push(request);
        Ok(AddTorrentResult {
            hash: format!("mockhash{:032}", call),
        })
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentInfo>, TorrentClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        Ok(self.torrents.read().await.clone())
    }
}

/// Mock implementation of the TorrentConnector trait.
///
/// Hands out a shared [`MockTorrentClient`] and counts logins. A scripted
/// error makes every connect attempt fail until it is cleared.
#[derive(Debug)]
pub struct MockConnector {
    client: Arc<MockTorrentClient>,
    error: Arc<RwLock<Option<TorrentClientError>>>,
    delay: Arc<RwLock<Option<Duration>>>,
    connects: AtomicUsize,
}

impl MockConnector {
    pub fn new(client: Arc<MockTorrentClient>) -> Self {
        Self {
            client,
            error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
            connects: AtomicUsize::new(0),
        }
    }

    /// A connector whose logins always fail with `error`.
    pub fn failing(error: TorrentClientError) -> Self {
        Self {
            error: Arc::new(RwLock::new(Some(error))),
            ..Self::new(Arc::new(MockTorrentClient::new()))
        }
    }

    /// Script the outcome of subsequent logins (`None` = succeed).
    pub async fn set_error(&self, error: Option<TorrentClientError>) {
        *self.error.write().await = error;
    }

    /// Make every login wait before answering.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Number of login attempts.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn client(&self) -> &Arc<MockTorrentClient> {
        &self.client
    }
}

#[async_trait]
impl TorrentConnector for MockConnector {
    fn name(&self) -> &str {
        "mock"
    }

    async fn connect(&self) -> Result<Arc<dyn TorrentClient>, TorrentClientError> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.error.read().await.clone() {
            return Err(error);
        }
        Ok(Arc::clone(&self.client) as Arc<dyn TorrentClient>)
    }
}
