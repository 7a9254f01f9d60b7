//! Server startup and shutdown logic

use anyhow::{Context, Result};
use axum::{middleware, routing::get, Router};
use gqlgate_graphql::{
    configure_schema, create_schema, graphql_router, spawn_reporter, ChannelErrorTracker,
    ContextBuilder, GraphQLState, LoggingErrorTracker, MemoryCacheBackend, PersistedQueries, PubSub,
    QueryCacheBackend, RetryingBackend,
};
use gqlgate_web::{
    cors_layer_with_config, health_router, request_id_middleware, AlwaysHealthy, HealthCheck,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::options::ServerOptions;

/// Reports queued for the background error reporter before tracking backs off
const ERROR_QUEUE_CAPACITY: usize = 1024;

/// Server application struct
pub struct Server {
    options: ServerOptions,
    state: GraphQLState,
    health: Arc<dyn HealthCheck>,
    reporter: JoinHandle<()>,
}

impl Server {
    /// Create a new server instance
    pub async fn new(options: ServerOptions) -> Result<Self> {
        // Initialize logging first
        crate::logging::init_logging(options.logging())?;

        let pubsub = PubSub::new();
        let (tracker, reports) = ChannelErrorTracker::new(ERROR_QUEUE_CAPACITY);
        let reporter = spawn_reporter(reports, LoggingErrorTracker);

        let schema = configure_schema(create_schema(), options.schema())
            .context("Invalid depth-limit ignore pattern")?;

        let persisted = options.persisted_queries().map(|cache| {
            tracing::info!(
                "Persisted queries enabled ({} cache servers configured, in-process store active)",
                cache.servers.len()
            );
            PersistedQueries::new(Arc::new(RetryingBackend::new(
                MemoryCacheBackend::new(cache.capacity),
                cache.retry,
            )))
        });

        let state = GraphQLState {
            schema,
            contexts: ContextBuilder::new(pubsub, Arc::new(tracker)),
            persisted,
            settings: Arc::new(options.handler_settings()),
        };

        Ok(Self {
            options,
            state,
            health: Arc::new(AlwaysHealthy),
            reporter,
        })
    }

    /// Replace the always-healthy default check
    pub fn with_health_check(mut self, health: Arc<dyn HealthCheck>) -> Self {
        self.health = health;
        self
    }

    /// Store persisted queries in an external cache. Ignored when persisted
    /// queries are disabled. The backend is wrapped in the configured retry policy.
    pub fn with_cache_backend<B>(mut self, backend: B) -> Self
    where
        B: QueryCacheBackend + 'static,
    {
        if let Some(cache) = self.options.persisted_queries() {
            let backend = RetryingBackend::new(backend, cache.retry);
            self.state.persisted = Some(PersistedQueries::new(Arc::new(backend)));
        }
        self
    }

    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    /// Build the complete application router
    pub fn build_app(&self) -> Router {
        let policies = self.options.policies();

        let mut app = graphql_router(self.state.clone())
            .merge(health_router(self.health.clone()))
            .route("/", get(root_handler));

        app = app.layer(RequestBodyLimitLayer::new(self.options.body_limit()));

        if policies.tracing {
            app = app.layer(TraceLayer::new_for_http());
        }

        app = app.layer(middleware::from_fn(request_id_middleware));
        app = app.layer(cors_layer_with_config(policies.cors.clone()));

        app
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let app = self.build_app();
        let addr = self.options.socket_address().to_string();

        tracing::info!("Starting gqlgate server on {}", addr);

        // Print configuration summary
        self.log_config_summary();

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        tracing::info!("🚀  Server ready at http://{}{}", addr, self.options.endpoint());

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        // Dropping the last tracker handle lets the reporter drain and stop
        drop(self.state);
        if tokio::time::timeout(Duration::from_secs(5), self.reporter).await.is_err() {
            tracing::warn!("Error reporter did not drain before shutdown");
        }

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Log configuration summary
    fn log_config_summary(&self) {
        let options = &self.options;
        let policies = options.policies();
        let enabled = |flag: bool| if flag { "Enabled" } else { "Disabled" };

        tracing::info!("=== gqlgate Server Configuration ===");
        tracing::info!("Environment: {}", options.environment());
        tracing::info!("Bind Address: {}", options.socket_address());
        tracing::info!("GraphQL Endpoint: {}", options.endpoint());
        tracing::info!("Max Query Depth: {}", options.schema().depth_limit);
        tracing::info!("CORS Origins: {}", policies.cors.allowed_origins.join(", "));
        tracing::info!("Playground: {}", enabled(policies.playground));
        tracing::info!("Tracing: {}", enabled(policies.tracing));
        tracing::info!("Subscriptions: {}", enabled(options.subscriptions().is_some()));
        tracing::info!("Persisted Queries: {}", enabled(options.persisted_queries().is_some()));
        tracing::info!("=====================================");
    }
}

/// Root handler
async fn root_handler() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "service": "gqlgate",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
