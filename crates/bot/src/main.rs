mod api;
mod metrics;
mod state;

use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use torrentbot_core::{
    config::{LogFormat, LoggingConfig},
    create_access_guard, load_config, run_event_loop, validate_config, AccessGuard, BackendHandle,
    BotOrchestrator, ChatTransport, Dispatcher, EventSource, NyaaSearcher, OrchestratorConfig,
    QBittorrentConnector, Searcher, SessionStore, TelegramTransport, TorrentConnector,
};

use api::create_router;
use state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming the config file
const CONFIG_ENV: &str = "TORRENTBOT_CONFIG";

/// Config file picked up from the working directory when present
const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Logging may not be initialized yet, so report on stderr as well
        tracing::error!("Fatal error: {:#}", e);
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config_path = config_path();
    let config = load_config(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("Failed to load config from {:?}", path),
        None => "Failed to load config from the environment".to_string(),
    })?;

    init_tracing(&config.logging)?;

    match &config_path {
        Some(path) => info!(version = VERSION, "Loaded configuration from {:?}", path),
        None => info!(version = VERSION, "Loaded configuration from the environment"),
    }

    validate_config(&config).context("Configuration validation failed")?;

    // Access guard
    let guard: Arc<dyn AccessGuard> = Arc::from(
        create_access_guard(&config.access).context("Failed to create access guard")?,
    );
    info!("Using access guard: {}", guard.method_name());

    // Chat transport (also the event source)
    let telegram = Arc::new(
        TelegramTransport::new(config.telegram.clone())
            .context("Failed to create Telegram transport")?,
    );

    // Search provider
    let searcher: Arc<dyn Searcher> = Arc::new(
        NyaaSearcher::new(config.search.clone()).context("Failed to create search provider")?,
    );
    info!(
        "Search provider: {} (max {} results)",
        searcher.name(),
        config.search.max_results
    );

    // Torrent backend, connected lazily on first dispatch
    let connector: Arc<dyn TorrentConnector> =
        Arc::new(QBittorrentConnector::new(config.qbittorrent.clone()));
    let backend = Arc::new(BackendHandle::new(
        connector,
        config.downloads.reconnect_on_connection_failure,
    ));
    info!(
        "Torrent backend: {} at {}",
        backend.backend_name(),
        config.qbittorrent.base_url()
    );
    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&backend)));

    let sessions = Arc::new(SessionStore::new());

    let orchestrator = Arc::new(BotOrchestrator::new(
        OrchestratorConfig::from(&config.downloads),
        guard,
        Arc::clone(&telegram) as Arc<dyn ChatTransport>,
        searcher,
        Arc::clone(&sessions),
        dispatcher,
    ));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let event_loop = tokio::spawn(run_event_loop(
        telegram as Arc<dyn EventSource>,
        orchestrator,
        shutdown_rx,
    ));

    if config.server.enabled {
        let addr = SocketAddr::new(config.server.host, config.server.port);
        let state = Arc::new(AppState::new(config, backend, sessions));
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;
        info!("Health server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;
    } else {
        shutdown_signal().await;
    }

    info!("Shutting down");
    // The loop may already be gone if it panicked; nothing left to stop then
    let _ = shutdown_tx.send(());
    if let Err(e) = event_loop.await {
        warn!(error = %e, "Event loop task ended abnormally");
    }

    info!("Shutdown complete");
    Ok(())
}

/// `TORRENTBOT_CONFIG` wins; otherwise `config.toml` when it exists, else
/// environment variables only.
fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    let default = Path::new(DEFAULT_CONFIG_FILE);
    default.exists().then(|| default.to_path_buf())
}

/// Install the global subscriber: console output plus an optional log file.
///
/// `RUST_LOG` takes precedence over `logging.level`.
fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("Invalid log level {:?}", config.level))?,
    };

    let console = match config.format {
        LogFormat::Text => fmt::layer().boxed(),
        LogFormat::Json => fmt::layer().json().boxed(),
    };

    let file = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
