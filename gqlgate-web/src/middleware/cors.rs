use axum::http::{HeaderName, HeaderValue, Method};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

/// Wildcard origin marker
pub const ANY_ORIGIN: &str = "*";

/// CORS configuration for different environments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins (`["*"]` allows any origin)
    pub allowed_origins: Vec<String>,
    /// Allowed methods
    pub allowed_methods: Vec<String>,
    /// Allowed headers
    pub allowed_headers: Vec<String>,
    /// Allow credentials
    pub allow_credentials: bool,
    /// Maximum age for preflight cache
    pub max_age: Option<Duration>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            allowed_methods: vec!["GET".to_string(), "POST".to_string(), "OPTIONS".to_string()],
            allowed_headers: vec![
                "content-type".to_string(),
                "authorization".to_string(),
                "accept".to_string(),
                "x-request-id".to_string(),
                "apollographql-client-name".to_string(),
                "apollographql-client-version".to_string(),
            ],
            allow_credentials: false,
            max_age: Some(Duration::from_secs(3600)),
        }
    }
}

impl CorsConfig {
    /// Any origin, no credentials
    pub fn development() -> Self {
        Self {
            allowed_origins: vec![ANY_ORIGIN.to_string()],
            ..Default::default()
        }
    }

    /// A single trusted front-end origin with credentials
    pub fn production(frontend_url: impl Into<String>) -> Self {
        Self {
            allowed_origins: vec![frontend_url.into()],
            allow_credentials: true,
            ..Default::default()
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == ANY_ORIGIN)
    }

    /// Validate CORS configuration for security
    pub fn validate(&self) -> Result<(), String> {
        if self.allows_any_origin() && self.allow_credentials {
            return Err("Cannot use wildcard origin '*' with allow_credentials: true".to_string());
        }

        if self.allowed_origins.is_empty() {
            return Err("At least one allowed origin is required".to_string());
        }

        Ok(())
    }
}

/// Create CORS layer with custom configuration
pub fn cors_layer_with_config(config: CorsConfig) -> CorsLayer {
    if let Err(e) = config.validate() {
        tracing::error!("Invalid CORS configuration: {}, falling back to secure defaults", e);
        return cors_layer_with_config(CorsConfig::default());
    }

    let mut cors = CorsLayer::new();

    if config.allows_any_origin() {
        cors = cors.allow_origin(Any);
        tracing::debug!("CORS configured to allow any origin");
    } else {
        let origins: Result<Vec<HeaderValue>, _> = config
            .allowed_origins
            .iter()
            .map(|origin| origin.trim_end_matches('/').parse::<HeaderValue>())
            .collect();

        match origins {
            Ok(origins) => {
                cors = cors.allow_origin(origins);
            }
            Err(e) => {
                tracing::error!("Invalid origin in CORS configuration: {}", e);
                cors = cors.allow_origin(HeaderValue::from_static("http://localhost:3000"));
            }
        }
    }

    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|method| method.parse().ok())
        .collect();
    cors = cors.allow_methods(methods);

    let headers: Vec<HeaderName> = config
        .allowed_headers
        .iter()
        .filter_map(|header| header.parse().ok())
        .collect();
    cors = cors.allow_headers(headers);

    if config.allow_credentials {
        cors = cors.allow_credentials(true);
    }

    if let Some(max_age) = config.max_age {
        cors = cors.max_age(max_age);
    }

    cors
}
