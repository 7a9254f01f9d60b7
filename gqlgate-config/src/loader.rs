//! Configuration loading and environment variable handling

use crate::domains::GatewayConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "GQLGATE".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<GatewayConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: GatewayConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<GatewayConfig> {
        let mut config = GatewayConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<GatewayConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut GatewayConfig) -> ConfigResult<()> {
        if let Ok(environment) = self.get_env_var("ENVIRONMENT") {
            config.environment = crate::domains::environment::Environment::from_str(&environment)
                .map_err(ConfigError::EnvError)?;
        }

        self.apply_graphql_overrides(&mut config.graphql)?;
        self.apply_server_overrides(&mut config.server)?;
        self.apply_logging_overrides(&mut config.logging)?;

        Ok(())
    }

    /// Apply GraphQL config overrides
    fn apply_graphql_overrides(
        &self,
        config: &mut crate::domains::graphql::GraphQLConfig,
    ) -> ConfigResult<()> {
        if let Ok(endpoint) = self.get_env_var("ENDPOINT") {
            config.endpoint = endpoint;
        }

        if let Ok(color) = self.get_env_var("PRIMARY_COLOR") {
            config.primary_color = color;
        }

        if let Ok(depth) = self.get_env_var("DEPTH_LIMIT") {
            config.depth_limit = depth
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid DEPTH_LIMIT: {}", e)))?;
        }

        Ok(())
    }

    /// Apply server config overrides
    fn apply_server_overrides(
        &self,
        config: &mut crate::domains::server::ServerConfig,
    ) -> ConfigResult<()> {
        if let Ok(url) = self.get_env_var("FRONTEND_URL") {
            config.frontend_url = url;
        }

        if let Ok(bind) = self.get_env_var("SERVER_BIND_ADDRESS") {
            config.bind_address = bind;
        }

        if let Ok(port) = self.get_env_var("SERVER_PORT") {
            config.port = port
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid SERVER_PORT: {}", e)))?;
        }

        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
