#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use smartsense_core::classify::Thresholds;
use tower::ServiceExt;

use smartsense_api::config::ServerConfig;
use smartsense_api::router::build_app_router;
use smartsense_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a 30-second request timeout and the relaxed 1000 ppm danger bound.
pub fn test_config() -> ServerConfig {
    test_config_with_gas(1000)
}

/// Like [`test_config`] but with a specific danger gas bound.
pub fn test_config_with_gas(danger_gas_ppm: u32) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        thresholds: Thresholds::new(danger_gas_ppm).unwrap(),
    }
}

/// Build the state and full application router from a config.
///
/// The state is returned alongside the router so tests can register
/// observers on the same hub the handlers broadcast to.
pub fn build_test_app_with(config: ServerConfig) -> (AppState, Router) {
    let state = AppState::new(config.clone());
    let app = build_app_router(state.clone(), &config);
    (state, app)
}

/// Build the full application router with the default test config.
pub fn build_test_app() -> Router {
    build_test_app_with(test_config()).1
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Send a GET request through the router.
pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a POST request with a JSON body through the router.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    post_raw(app, uri, body.to_string()).await
}

/// Send a POST request with an arbitrary body and a JSON content type.
pub async fn post_raw(app: Router, uri: &str, body: impl Into<String>) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}
