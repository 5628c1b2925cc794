//! HTTP client integration tests.
//!
//! The search provider and qBittorrent are replaced by in-process axum
//! servers so the real clients run over real sockets.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use torrentbot_core::{
    config::{QBittorrentConfig, SearchProviderConfig},
    create_access_guard,
    orchestrator::replies,
    testing::{
        fixtures::{self, ALLOWED_USER},
        MockTransport,
    },
    AddTorrentRequest, BackendHandle, BotOrchestrator, ChatTransport, Dispatcher, NyaaSearcher,
    OrchestratorConfig, QBittorrentConnector, Searcher, SessionStore, TorrentClientError,
    TorrentConnector, TorrentState,
};

/// Serve `app` on an ephemeral port and return its base URL.
async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

// =============================================================================
// Fake search provider
// =============================================================================

#[derive(Clone, Default)]
struct FakeProvider {
    body: Arc<Mutex<Value>>,
    status: Arc<Mutex<u16>>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

async fn provider_search(
    State(provider): State<FakeProvider>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    provider.queries.lock().unwrap().push(params);
    let status = StatusCode::from_u16(*provider.status.lock().unwrap()).unwrap();
    let body = provider.body.lock().unwrap().clone();
    (status, Json(body))
}

async fn start_provider(body: Value) -> (FakeProvider, NyaaSearcher) {
    let provider = FakeProvider {
        body: Arc::new(Mutex::new(body)),
        status: Arc::new(Mutex::new(200)),
        queries: Arc::default(),
    };
    let app = Router::new()
        .route("/nyaa", get(provider_search))
        .with_state(provider.clone());
    let base = serve(app).await;

    let searcher = NyaaSearcher::new(SearchProviderConfig {
        url: format!("{}/nyaa", base),
        timeout_secs: 5,
        max_results: 5,
    })
    .unwrap();
    (provider, searcher)
}

fn nyaa_entries(count: usize) -> Vec<Value> {
    (1..=count)
        .map(|i| {
            json!({
                "title": format!("[Group] Naruto - {:02} [1080p]", i),
                "magnet": fixtures::magnet(i),
                "torrent": format!("https://nyaa.si/download/{}.torrent", i),
                "seeders": 100 - i,
            })
        })
        .collect()
}

#[tokio::test]
async fn test_search_sends_expected_query() {
    let (provider, searcher) = start_provider(json!({ "data": nyaa_entries(2) })).await;

    searcher.search("naruto shippuden").await;

    let queries = provider.queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0]["q"], "naruto shippuden");
    assert_eq!(queries[0]["page"], "1");
    assert_eq!(queries[0]["sort"], "seeders");
    assert_eq!(queries[0]["order"], "desc");
}

#[tokio::test]
async fn test_search_keeps_first_five_in_order() {
    let (_provider, searcher) = start_provider(json!({ "data": nyaa_entries(7) })).await;

    let results = searcher.search("naruto").await;

    assert_eq!(results.len(), 5);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.display_name, format!("[Group] Naruto - {:02} [1080p]", i + 1));
        assert_eq!(result.identifier, fixtures::magnet(i + 1));
    }
}

#[tokio::test]
async fn test_search_accepts_results_and_bare_array() {
    let (_provider, searcher) = start_provider(json!({ "results": nyaa_entries(2) })).await;
    assert_eq!(searcher.search("a").await.len(), 2);

    let (_provider, searcher) = start_provider(Value::Array(nyaa_entries(3))).await;
    assert_eq!(searcher.search("a").await.len(), 3);
}

#[tokio::test]
async fn test_search_falls_back_to_torrent_link() {
    let (_provider, searcher) = start_provider(json!({
        "data": [
            { "title": "Only torrent", "torrent": "https://nyaa.si/download/9.torrent" },
            { "title": "Empty magnet", "magnet": "", "torrent": "https://nyaa.si/download/8.torrent" },
            { "title": "Nothing" },
            {}
        ]
    }))
    .await;

    let results = searcher.search("a").await;

    let identifiers: Vec<&str> = results.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(
        identifiers,
        vec![
            "https://nyaa.si/download/9.torrent",
            "https://nyaa.si/download/8.torrent",
            "#",
            "#",
        ]
    );
    assert_eq!(results[3].display_name, "no name");
}

#[tokio::test]
async fn test_search_error_status_yields_no_results() {
    let (provider, searcher) = start_provider(json!({ "data": nyaa_entries(3) })).await;
    *provider.status.lock().unwrap() = 500;

    assert!(searcher.search("naruto").await.is_empty());
}

#[tokio::test]
async fn test_search_unexpected_shape_yields_no_results() {
    let (_provider, searcher) = start_provider(json!({ "data": "not a list" })).await;
    assert!(searcher.search("naruto").await.is_empty());

    let (_provider, searcher) = start_provider(json!("just a string")).await;
    assert!(searcher.search("naruto").await.is_empty());
}

// =============================================================================
// Fake qBittorrent
// =============================================================================

const SID: &str = "SID=fake-session";

#[derive(Clone, Default)]
struct FakeQb {
    logins: Arc<Mutex<usize>>,
    /// Raw multipart bodies of torrents/add.
    added: Arc<Mutex<Vec<String>>>,
    torrents: Arc<Mutex<Value>>,
    referers: Arc<Mutex<Vec<String>>>,
    /// Upcoming torrents/add calls answered as if the session had expired.
    expired_adds: Arc<Mutex<usize>>,
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|cookies| cookies.contains(SID))
}

async fn qb_login(
    State(qb): State<FakeQb>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> impl IntoResponse {
    *qb.logins.lock().unwrap() += 1;
    if let Some(referer) = headers.get(header::REFERER).and_then(|v| v.to_str().ok()) {
        qb.referers.lock().unwrap().push(referer.to_string());
    }
    if form.username == "admin" && form.password == "secret" {
        (
            StatusCode::OK,
            [(header::SET_COOKIE, format!("{}; HttpOnly; path=/", SID))],
            "Ok.",
        )
            .into_response()
    } else {
        (StatusCode::OK, "Fails.").into_response()
    }
}

async fn qb_add(State(qb): State<FakeQb>, headers: HeaderMap, body: String) -> impl IntoResponse {
    if !has_session(&headers) {
        return (StatusCode::FORBIDDEN, "Forbidden").into_response();
    }
    {
        let mut expired = qb.expired_adds.lock().unwrap();
        if *expired > 0 {
            *expired -= 1;
            return (StatusCode::FORBIDDEN, "Forbidden").into_response();
        }
    }
    let rejected = body.contains("rejected.torrent");
    qb.added.lock().unwrap().push(body);
    if rejected {
        (StatusCode::OK, "Fails.").into_response()
    } else {
        (StatusCode::OK, "Ok.").into_response()
    }
}

async fn qb_info(State(qb): State<FakeQb>, headers: HeaderMap) -> impl IntoResponse {
    if !has_session(&headers) {
        return (StatusCode::FORBIDDEN, "Forbidden").into_response();
    }
    Json(qb.torrents.lock().unwrap().clone()).into_response()
}

async fn start_qb(password: &str) -> (FakeQb, QBittorrentConfig) {
    let qb = FakeQb {
        torrents: Arc::new(Mutex::new(json!([]))),
        ..Default::default()
    };
    let app = Router::new()
        .route("/api/v2/auth/login", post(qb_login))
        .route("/api/v2/torrents/add", post(qb_add))
        .route("/api/v2/torrents/info", get(qb_info))
        .with_state(qb.clone());
    let base = serve(app).await;
    let (host, port) = base.rsplit_once(':').unwrap();

    let config = QBittorrentConfig {
        host: host.to_string(),
        port: port.parse().unwrap(),
        scheme: "http".to_string(),
        username: "admin".to_string(),
        password: password.to_string(),
        verify_certificate: true,
        timeout_secs: 5,
    };
    (qb, config)
}

#[tokio::test]
async fn test_qbittorrent_login_and_add_magnet() {
    let (qb, config) = start_qb("secret").await;
    let connector = QBittorrentConnector::new(config.clone());

    let client = connector.connect().await.unwrap();
    let magnet = "magnet:?xt=urn:btih:ABCDEF0123456789ABCDEF0123456789ABCDEF01&dn=test";
    let result = client
        .add_torrent(AddTorrentRequest::magnet(magnet).with_download_path("/downloads"))
        .await
        .unwrap();

    assert_eq!(result.hash, "abcdef0123456789abcdef0123456789abcdef01");
    assert_eq!(*qb.logins.lock().unwrap(), 1);
    assert_eq!(qb.referers.lock().unwrap().clone(), vec![config.base_url()]);

    let added = qb.added.lock().unwrap().clone();
    assert_eq!(added.len(), 1);
    assert!(added[0].contains("name=\"urls\""));
    assert!(added[0].contains(magnet));
    assert!(added[0].contains("name=\"savepath\""));
    assert!(added[0].contains("/downloads"));
}

#[tokio::test]
async fn test_qbittorrent_bad_credentials() {
    let (qb, config) = start_qb("wrong").await;
    let connector = QBittorrentConnector::new(config);

    let err = connector.connect().await.err().unwrap();

    assert!(matches!(err, TorrentClientError::AuthenticationFailed(_)));
    assert_eq!(*qb.logins.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_qbittorrent_rejected_torrent() {
    let (_qb, config) = start_qb("secret").await;
    let client = QBittorrentConnector::new(config).connect().await.unwrap();

    let err = client
        .add_torrent(AddTorrentRequest::url("https://example.com/rejected.torrent"))
        .await
        .unwrap_err();

    assert!(matches!(err, TorrentClientError::InvalidTorrent(_)));
}

#[tokio::test]
async fn test_expired_session_logs_in_again_and_adds() {
    let (qb, config) = start_qb("secret").await;
    let backend = Arc::new(BackendHandle::new(
        Arc::new(QBittorrentConnector::new(config)) as Arc<dyn TorrentConnector>,
        false,
    ));
    let dispatcher = Dispatcher::new(Arc::clone(&backend));
    backend.client().await.unwrap();
    *qb.expired_adds.lock().unwrap() = 1;

    dispatcher
        .submit("magnet:?xt=urn:btih:abc", "/dl")
        .await
        .unwrap();

    assert_eq!(*qb.logins.lock().unwrap(), 2);
    let added = qb.added.lock().unwrap().clone();
    assert_eq!(added.len(), 1);
    assert!(added[0].contains("magnet:?xt=urn:btih:abc"));
    assert!(added[0].contains("/dl"));
}

#[tokio::test]
async fn test_qbittorrent_list_normalizes_states() {
    let (qb, config) = start_qb("secret").await;
    *qb.torrents.lock().unwrap() = json!([
        { "hash": "AAA", "name": "one", "state": "downloading", "progress": 0.5, "size": 100 },
        { "hash": "bbb", "name": "two", "state": "uploading", "progress": 1.0, "size": 200 },
        { "hash": "ccc", "name": "three", "state": "pausedDL", "progress": 0.1 },
        { "hash": "ddd", "name": "four", "state": "somethingNew", "progress": 1.5 }
    ]);
    let client = QBittorrentConnector::new(config).connect().await.unwrap();

    let torrents = client.list_torrents().await.unwrap();

    let states: Vec<TorrentState> = torrents.iter().map(|t| t.state).collect();
    assert_eq!(
        states,
        vec![
            TorrentState::Downloading,
            TorrentState::Seeding,
            TorrentState::Paused,
            TorrentState::Unknown,
        ]
    );
    assert_eq!(torrents[0].hash, "aaa");
    assert_eq!(torrents[3].progress, 1.0);
}

#[tokio::test]
async fn test_qbittorrent_unreachable() {
    let config = QBittorrentConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        scheme: "http".to_string(),
        username: "admin".to_string(),
        password: "secret".to_string(),
        verify_certificate: true,
        timeout_secs: 5,
    };

    let err = QBittorrentConnector::new(config).connect().await.err().unwrap();
    assert!(matches!(err, TorrentClientError::ConnectionFailed(_)));
}

// =============================================================================
// Full stack
// =============================================================================

#[tokio::test]
async fn test_search_and_download_against_fake_services() {
    let (_provider, searcher) = start_provider(json!({ "data": nyaa_entries(7) })).await;
    let (qb, qb_config) = start_qb("secret").await;

    let config = fixtures::config();
    let transport = Arc::new(MockTransport::new());
    let connector: Arc<dyn TorrentConnector> = Arc::new(QBittorrentConnector::new(qb_config));
    let orchestrator = BotOrchestrator::new(
        OrchestratorConfig::from(&config.downloads),
        Arc::from(create_access_guard(&config.access).unwrap()),
        Arc::clone(&transport) as Arc<dyn ChatTransport>,
        Arc::new(searcher) as Arc<dyn Searcher>,
        Arc::new(SessionStore::new()),
        Arc::new(Dispatcher::new(Arc::new(BackendHandle::new(connector, false)))),
    );

    orchestrator
        .handle_event(fixtures::message(ALLOWED_USER, "/search naruto"))
        .await
        .unwrap();
    let results = transport.last_with_buttons().await.unwrap();
    assert_eq!(results.buttons.len(), 5);

    orchestrator
        .handle_event(fixtures::button(ALLOWED_USER, Some(results.message), "download|3"))
        .await
        .unwrap();

    let edits = transport.edits().await;
    assert_eq!(edits.last().unwrap().text, "torrent added to qbittorrent successfully!");
    let added = qb.added.lock().unwrap().clone();
    assert_eq!(added.len(), 1);
    assert!(added[0].contains(&fixtures::magnet(3)));

    // A second dispatch reuses the session: no second login
    orchestrator
        .handle_event(fixtures::message(ALLOWED_USER, "/active"))
        .await
        .unwrap();
    assert_eq!(*qb.logins.lock().unwrap(), 1);
    assert_eq!(
        transport.sent_texts().await.last().map(String::as_str),
        Some(replies::NO_ACTIVE)
    );
}
