use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics));

    Router::new()
        .nest("/api/v1", api_routes)
        // Prometheus scrapers expect the conventional path
        .route("/metrics", get(handlers::metrics))
        .route_layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use torrentbot_core::{
        load_config_from_str,
        testing::{MockConnector, MockTorrentClient},
        BackendHandle, Config, SessionStore, TorrentConnector,
    };
    use tower::ServiceExt;

    const CONFIG: &str = r#"
[telegram]
token = "123:secret-token"

[qbittorrent]
host = "qb.example.com"
username = "admin"
password = "hunter2"

[access]
allowed_users = [123456789]
"#;

    fn config() -> Config {
        load_config_from_str(CONFIG).unwrap()
    }

    fn state() -> (Arc<AppState>, Arc<BackendHandle>) {
        let connector: Arc<dyn TorrentConnector> =
            Arc::new(MockConnector::new(Arc::new(MockTorrentClient::new())));
        let backend = Arc::new(BackendHandle::new(connector, false));
        let state = Arc::new(AppState::new(
            config(),
            Arc::clone(&backend),
            Arc::new(SessionStore::new()),
        ));
        (state, backend)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_reports_unconnected_backend() {
        let (state, _) = state();
        let (status, body) = get_json(create_router(state), "/api/v1/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend"]["status"]["state"], "not_connected");
        assert_eq!(body["active_sessions"], 0);
    }

    #[tokio::test]
    async fn test_health_reports_connected_backend() {
        let (state, backend) = state();
        backend.client().await.unwrap();

        let (_, body) = get_json(create_router(state), "/api/v1/health").await;
        assert_eq!(body["backend"]["status"]["state"], "connected");
    }

    #[tokio::test]
    async fn test_config_hides_secrets() {
        let (state, _) = state();
        let (status, body) = get_json(create_router(state), "/api/v1/config").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["telegram"]["token_configured"], true);
        assert_eq!(body["qbittorrent"]["password_configured"], true);
        assert_eq!(body["allowed_users"], 1);

        let text = body.to_string();
        assert!(!text.contains("secret-token"));
        assert!(!text.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_metrics_endpoint_serves_prometheus_text() {
        let (state, _) = state();
        let app = create_router(state);

        // Generate at least one request sample first
        let _ = get_json(app.clone(), "/api/v1/health").await;

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("torrentbot_http_requests_total"));
        assert!(text.contains("torrentbot_sessions_active"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (state, _) = state();
        let response = create_router(state)
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
