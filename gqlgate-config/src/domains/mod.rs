//! Domain-specific configuration modules

pub mod cache;
pub mod environment;
pub mod graphql;
pub mod logging;
pub mod server;
pub mod subscriptions;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main gateway configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Deployment environment
    #[serde(default)]
    pub environment: environment::Environment,

    /// HTTP server configuration
    #[serde(default)]
    pub server: server::ServerConfig,

    /// GraphQL endpoint configuration
    #[serde(default)]
    pub graphql: graphql::GraphQLConfig,

    /// Persisted-query cache configuration
    #[serde(default)]
    pub persisted_queries: cache::PersistedQueryConfig,

    /// Subscription transport configuration
    #[serde(default)]
    pub subscriptions: subscriptions::SubscriptionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl GatewayConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.graphql.validate()?;
        self.persisted_queries.validate()?;
        self.subscriptions.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = GatewayConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
