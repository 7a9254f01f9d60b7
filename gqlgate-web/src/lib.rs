//! # gqlgate web utilities
//!
//! Reusable axum middleware for the gateway: CORS policy layers, request id
//! propagation and the health check endpoint.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum::{middleware::from_fn, Router};
//! use gqlgate_web::{
//!     health::{health_router, AlwaysHealthy},
//!     middleware::{cors::{cors_layer_with_config, CorsConfig}, request_id_middleware},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let app: Router = health_router(Arc::new(AlwaysHealthy))
//!     .layer(from_fn(request_id_middleware))
//!     .layer(cors_layer_with_config(CorsConfig::development()));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:4000").await.unwrap();
//! axum::serve(listener, app).await.unwrap();
//! # }
//! ```

pub mod health;
pub mod middleware;

pub use health::{health_router, AlwaysHealthy, HealthCheck, HEALTH_CHECK_PATH};
pub use middleware::{
    cors_layer_with_config, request_id_middleware, CorsConfig, RequestId, REQUEST_ID_HEADER,
};
