//! Health check endpoint
//!
//! The check itself is an extension point: [`AlwaysHealthy`] reports healthy
//! unconditionally and should be replaced with real dependency checks.

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::sync::Arc;

/// Path polled by load balancers
pub const HEALTH_CHECK_PATH: &str = "/.well-known/apollo/server-health";

/// A readiness check for the gateway
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> Result<(), String>;
}

/// Reports healthy unconditionally
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysHealthy;

#[async_trait]
impl HealthCheck for AlwaysHealthy {
    async fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

async fn health_handler(State(check): State<Arc<dyn HealthCheck>>) -> impl IntoResponse {
    match check.check().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "pass" }))),
        Err(reason) => {
            tracing::warn!("Health check failed: {}", reason);
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "fail" })))
        }
    }
}

/// Router serving [`HEALTH_CHECK_PATH`]
pub fn health_router(check: Arc<dyn HealthCheck>) -> Router {
    Router::new()
        .route(HEALTH_CHECK_PATH, get(health_handler))
        .with_state(check)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct Failing;

    #[async_trait]
    impl HealthCheck for Failing {
        async fn check(&self) -> Result<(), String> {
            Err("cache unreachable".to_string())
        }
    }

    async fn health_of(check: Arc<dyn HealthCheck>) -> (StatusCode, serde_json::Value) {
        let response = health_router(check)
            .oneshot(Request::builder().uri(HEALTH_CHECK_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_default_check_passes() {
        let (status, body) = health_of(Arc::new(AlwaysHealthy)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "pass" }));
    }

    #[tokio::test]
    async fn test_failing_check_reports_unavailable() {
        let (status, body) = health_of(Arc::new(Failing)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({ "status": "fail" }));
    }
}
