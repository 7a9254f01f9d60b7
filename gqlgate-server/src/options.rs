//! Server option assembly
//!
//! [`ServerOptions::assemble`] is the single place where configuration and
//! environment policy are combined. The result is read-only.

use async_graphql::http::MultipartOptions;
use gqlgate_config::{Environment, GatewayConfig, LoggingConfig, PersistedQueryConfig};
use gqlgate_graphql::subscriptions::SubscriptionSettings;
use gqlgate_graphql::{CacheHints, HandlerSettings, SchemaOptions};

use crate::policy::{policy_for, PolicySet};

#[derive(Clone)]
pub struct ServerOptions {
    environment: Environment,
    socket_address: String,
    endpoint: String,
    policies: PolicySet,
    schema: SchemaOptions,
    persisted_queries: Option<PersistedQueryConfig>,
    subscriptions: Option<SubscriptionSettings>,
    body_limit: usize,
    uploads: MultipartOptions,
    max_field_size: usize,
    cache_hints: Option<CacheHints>,
    logging: LoggingConfig,
}

impl ServerOptions {
    pub fn assemble(config: &GatewayConfig) -> Self {
        let policies = policy_for(config.environment, &config.server.frontend_url);

        let schema = SchemaOptions {
            depth_limit: config.graphql.depth_limit,
            depth_ignore: config.graphql.depth_ignore.clone(),
            primary_color: config.graphql.primary_color.clone(),
            introspection: policies.introspection,
            apollo_tracing: policies.tracing,
        };

        let subscriptions = config.subscriptions.enabled.then(|| SubscriptionSettings {
            log_connections: policies.connection_logging,
            keep_alive: config.subscriptions.keep_alive,
        });

        let uploads = MultipartOptions::default()
            .max_file_size(config.server.uploads.max_file_size)
            .max_num_files(config.server.uploads.max_files);

        let cache_hints = policies
            .cache_control
            .then(|| CacheHints::new(config.graphql.cache_max_age));

        Self {
            environment: config.environment,
            socket_address: config.server.socket_address(),
            endpoint: config.graphql.endpoint_path(),
            policies,
            schema,
            persisted_queries: config
                .persisted_queries
                .enabled
                .then(|| config.persisted_queries.clone()),
            subscriptions,
            body_limit: config.server.body_limit_bytes,
            uploads,
            max_field_size: config.server.uploads.max_field_size,
            cache_hints,
            logging: config.logging.clone(),
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn socket_address(&self) -> &str {
        &self.socket_address
    }

    /// GraphQL path, shared by HTTP and websocket traffic
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn policies(&self) -> &PolicySet {
        &self.policies
    }

    pub fn schema(&self) -> &SchemaOptions {
        &self.schema
    }

    pub fn persisted_queries(&self) -> Option<&PersistedQueryConfig> {
        self.persisted_queries.as_ref()
    }

    pub fn subscriptions(&self) -> Option<SubscriptionSettings> {
        self.subscriptions
    }

    pub fn body_limit(&self) -> usize {
        self.body_limit
    }

    /// Cache hint policy, present in production only
    pub fn cache_hints(&self) -> Option<CacheHints> {
        self.cache_hints
    }

    pub fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    pub fn handler_settings(&self) -> HandlerSettings {
        HandlerSettings {
            endpoint: self.endpoint.clone(),
            playground: self.policies.playground,
            subscriptions: self.subscriptions,
            uploads: self.uploads.clone(),
            max_field_size: Some(self.max_field_size),
            cache_hints: self.cache_hints,
        }
    }
}

impl std::fmt::Debug for ServerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerOptions")
            .field("environment", &self.environment)
            .field("socket_address", &self.socket_address)
            .field("endpoint", &self.endpoint)
            .field("policies", &self.policies)
            .field("schema", &self.schema)
            .field("persisted_queries", &self.persisted_queries)
            .field("subscriptions", &self.subscriptions)
            .field("body_limit", &self.body_limit)
            .field("max_field_size", &self.max_field_size)
            .field("cache_hints", &self.cache_hints)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gqlgate_config::IgnoreRule;
    use std::time::Duration;

    #[test]
    fn test_assemble_defaults() {
        let options = ServerOptions::assemble(&GatewayConfig::default());

        assert_eq!(options.environment(), Environment::Development);
        assert_eq!(options.endpoint(), "/graphql");
        assert_eq!(options.socket_address(), "127.0.0.1:4000");
        assert_eq!(options.body_limit(), 50 * 1024 * 1024);
        assert!(options.cache_hints().is_none());
        assert_eq!(options.handler_settings().max_field_size, Some(1024 * 1024));

        let schema = options.schema();
        assert_eq!(schema.depth_limit, 10);
        assert_eq!(schema.primary_color, "#87CEEB");
        assert!(schema.introspection);
        assert!(schema.apollo_tracing);
        assert_eq!(
            schema.depth_ignore,
            vec![
                IgnoreRule::Pattern {
                    pattern: "_trusted$".to_string()
                },
                IgnoreRule::Exact {
                    name: "idontcare".to_string()
                },
            ]
        );

        let subscriptions = options.subscriptions().unwrap();
        assert_eq!(subscriptions.keep_alive, Duration::from_millis(1000));
        assert!(subscriptions.log_connections);

        let cache = options.persisted_queries().unwrap();
        assert_eq!(
            cache.servers,
            vec!["memcached-server-1", "memcached-server-2", "memcached-server-3"]
        );
        assert_eq!(cache.retry.max_retries, 10);
        assert_eq!(cache.retry.retry_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_assemble_production() {
        let mut config = GatewayConfig::default();
        config.environment = Environment::Production;
        config.server.frontend_url = "https://app.example.com".to_string();

        let options = ServerOptions::assemble(&config);
        assert_eq!(options.policies().cors.allowed_origins, vec!["https://app.example.com"]);
        assert!(!options.schema().apollo_tracing);
        assert!(options.schema().introspection);
        assert!(!options.subscriptions().unwrap().log_connections);
        assert!(!options.handler_settings().playground);
        assert_eq!(options.cache_hints(), Some(CacheHints::new(Duration::from_secs(5))));
        assert_eq!(options.handler_settings().cache_hints, options.cache_hints());
    }

    #[test]
    fn test_assemble_custom_endpoint() {
        let mut config = GatewayConfig::default();
        config.graphql.endpoint = "/api/graph/".to_string();

        let options = ServerOptions::assemble(&config);
        assert_eq!(options.endpoint(), "/api/graph");
        assert_eq!(options.handler_settings().endpoint, "/api/graph");
    }

    #[test]
    fn test_disabled_features_are_absent() {
        let mut config = GatewayConfig::default();
        config.subscriptions.enabled = false;
        config.persisted_queries.enabled = false;

        let options = ServerOptions::assemble(&config);
        assert!(options.subscriptions().is_none());
        assert!(options.persisted_queries().is_none());
        assert!(options.handler_settings().subscriptions.is_none());
    }
}
