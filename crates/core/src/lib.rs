pub mod auth;
pub mod chat;
pub mod config;
pub mod dispatcher;
pub mod identifier;
pub mod metrics;
pub mod orchestrator;
pub mod searcher;
pub mod session;
pub mod testing;
pub mod torrent_client;

pub use auth::{create_access_guard, AccessGuard, AllowListGuard, AuthError};
pub use chat::{
    ChatError, ChatId, ChatTransport, EventSource, InboundEvent, InlineButton, MessageId,
    MessageRef, TelegramTransport, UserId,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use dispatcher::{BackendHandle, BackendStatus, DispatchError, Dispatcher};
pub use identifier::{classify, IdentifierKind};
pub use orchestrator::{run_event_loop, BotOrchestrator, OrchestratorConfig};
pub use searcher::{NyaaSearcher, SearchError, SearchResult, Searcher};
pub use session::{Handle, SessionError, SessionId, SessionStore};
pub use torrent_client::{
    AddTorrentRequest, QBittorrentClient, QBittorrentConnector, TorrentClient, TorrentClientError,
    TorrentConnector, TorrentInfo, TorrentState,
};
