//! Router-level tests of the assembled server

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use gqlgate_config::{Environment, GatewayConfig};
use gqlgate_graphql::MemoryCacheBackend;
use gqlgate_server::{Server, ServerOptions};
use gqlgate_web::{HealthCheck, HEALTH_CHECK_PATH, REQUEST_ID_HEADER};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn server(config: GatewayConfig) -> Server {
    Server::new(ServerOptions::assemble(&config)).await.unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn graphql_post(query: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/graphql")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "query": query }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_graphql_query_round_trip() {
    let app = server(GatewayConfig::default()).await.build_app();
    let response = app.oneshot(graphql_post("{ hello(name: \"gqlgate\") }")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    let body = json_body(response).await;
    assert_eq!(body["data"], json!({ "hello": "Hello, gqlgate!" }));
    assert!(body["errors"].is_null());
}

#[tokio::test]
async fn test_development_reports_tracing_without_cache_hints() {
    let app = server(GatewayConfig::default()).await.build_app();
    let body = json_body(app.oneshot(graphql_post("{ hello }")).await.unwrap()).await;

    assert!(body["extensions"]["tracing"].is_object());
    assert!(body["extensions"].get("cacheControl").is_none());
}

#[tokio::test]
async fn test_production_reports_cache_hints_without_tracing() {
    let mut config = GatewayConfig::default();
    config.environment = Environment::Production;
    let app = server(config).await.build_app();

    let response = app.clone().oneshot(graphql_post("{ hello }")).await.unwrap();
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    let body = json_body(response).await;
    assert_eq!(body["data"]["hello"], "Hello, world!");
    assert!(body["extensions"].get("tracing").is_none());
    assert_eq!(
        body["extensions"]["cacheControl"],
        json!({ "version": 1, "hints": [{ "path": ["hello"], "maxAge": 5 }] })
    );

    let body = json_body(app.oneshot(graphql_post("{ me }")).await.unwrap()).await;
    assert_eq!(
        body["extensions"]["cacheControl"]["hints"][0],
        json!({ "path": ["me"], "maxAge": 5, "scope": "PRIVATE" })
    );
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = server(GatewayConfig::default()).await.build_app();
    let mut request = graphql_post("{ hello }");
    request
        .headers_mut()
        .insert(REQUEST_ID_HEADER, "trace-123".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "trace-123");
}

#[tokio::test]
async fn test_depth_limit_from_config() {
    let mut config = GatewayConfig::default();
    config.graphql.depth_limit = 2;
    let app = server(config).await.build_app();

    let response = app
        .oneshot(graphql_post("{ viewer { friend { friend { name } } } }"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["errors"][0]["message"], "'' exceeds maximum operation depth of 2");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = server(GatewayConfig::default()).await.build_app();
    let request = Request::builder().uri(HEALTH_CHECK_PATH).body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "status": "pass" }));
}

struct Unhealthy;

#[async_trait]
impl HealthCheck for Unhealthy {
    async fn check(&self) -> Result<(), String> {
        Err("persisted query cache unreachable".to_string())
    }
}

#[tokio::test]
async fn test_custom_health_check() {
    let app = server(GatewayConfig::default())
        .await
        .with_health_check(Arc::new(Unhealthy))
        .build_app();
    let request = Request::builder().uri(HEALTH_CHECK_PATH).body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_playground_only_outside_production() {
    let app = server(GatewayConfig::default()).await.build_app();
    let request = Request::builder().uri("/graphql").body(Body::empty()).unwrap();
    assert_eq!(app.oneshot(request).await.unwrap().status(), StatusCode::OK);

    let mut config = GatewayConfig::default();
    config.environment = Environment::Production;
    let app = server(config).await.build_app();
    let request = Request::builder().uri("/graphql").body(Body::empty()).unwrap();
    assert_eq!(app.oneshot(request).await.unwrap().status(), StatusCode::NOT_FOUND);
}

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri("/graphql")
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_production_cors_allows_frontend_only() {
    let mut config = GatewayConfig::default();
    config.environment = Environment::Production;
    config.server.frontend_url = "https://app.example.com".to_string();
    let app = server(config).await.build_app();

    let response = app.clone().oneshot(preflight("https://app.example.com")).await.unwrap();
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://app.example.com"
    );
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(), "true");

    let response = app.oneshot(preflight("https://evil.example.com")).await.unwrap();
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_development_cors_allows_any_origin() {
    let app = server(GatewayConfig::default()).await.build_app();

    let response = app.oneshot(preflight("https://anywhere.example.com")).await.unwrap();
    assert_eq!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
}

#[tokio::test]
async fn test_body_limit() {
    let mut config = GatewayConfig::default();
    config.server.body_limit_bytes = 64;
    let app = server(config).await.build_app();

    let query = format!("{{ hello(name: \"{}\") }}", "x".repeat(128));
    let body = json!({ "query": query }).to_string();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/graphql")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_external_cache_backend() {
    let query = "{ hello }";
    let hash = gqlgate_graphql::persisted::sha256_hex(query);
    let app = server(GatewayConfig::default())
        .await
        .with_cache_backend(MemoryCacheBackend::new(8))
        .build_app();

    let register = json!({
        "query": query,
        "extensions": { "persistedQuery": { "version": 1, "sha256Hash": hash } },
    });
    let lookup = json!({
        "extensions": { "persistedQuery": { "version": 1, "sha256Hash": hash } },
    });

    for body in [register, lookup] {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/graphql")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(json_body(response).await["data"]["hello"], "Hello, world!");
    }
}
