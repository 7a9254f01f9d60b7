//! Domain-driven configuration management for gqlgate
//!
//! Configuration is split by functional domain, each with its own defaults and
//! validation. Values come from a YAML file (optional) and are then overridden
//! by `GQLGATE_*` environment variables.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    cache::{PersistedQueryConfig, RetryPolicy},
    environment::Environment,
    graphql::{GraphQLConfig, IgnoreRule},
    logging::{LogFormat, LogLevel, LoggingConfig},
    server::{ServerConfig, UploadConfig},
    subscriptions::SubscriptionConfig,
    GatewayConfig,
};

// Re-export utilities
pub use domains::utils::{serde_duration, serde_duration_ms};
