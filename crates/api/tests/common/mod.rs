#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use reelq_api::config::ServerConfig;
use reelq_api::middleware::identity::REQUESTER_HEADER;
use reelq_api::router::build_app_router;
use reelq_api::state::AppState;
use reelq_pipeline::{AdminGate, Dispatcher, DispatcherConfig};
use sqlx::SqlitePool;
use tower::ServiceExt;

pub const ADMIN: &str = "admin1";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
        eviction_interval_secs: 60,
        admin_ids: vec![ADMIN.to_string()],
    }
}

/// Build the full application router with the default admission settings.
pub fn build_test_app(pool: SqlitePool) -> Router {
    build_test_app_with(pool, DispatcherConfig::default())
}

/// Build the full application router with custom admission settings.
pub fn build_test_app_with(pool: SqlitePool, dispatcher_config: DispatcherConfig) -> Router {
    let config = test_config();
    let dispatcher = Dispatcher::new(pool.clone(), dispatcher_config).unwrap();
    let admin = AdminGate::new(config.admin_ids.iter().cloned());

    let state = AppState {
        pool,
        config: Arc::new(config),
        dispatcher: Arc::new(dispatcher),
        admin: Arc::new(admin),
    };
    build_app_router(state)
}

/// Admission settings with a short cooldown for rate-limit tests.
pub fn short_cooldown() -> DispatcherConfig {
    DispatcherConfig {
        cooldown: Duration::from_secs(3),
        ..DispatcherConfig::default()
    }
}

/// Send a GET request, optionally as `requester`.
pub async fn get(app: Router, uri: &str, requester: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(id) = requester {
        builder = builder.header(REQUESTER_HEADER, id);
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Send a JSON POST request, optionally as `requester`.
pub async fn post_json(
    app: Router,
    uri: &str,
    requester: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(id) = requester {
        builder = builder.header(REQUESTER_HEADER, id);
    }
    app.oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
