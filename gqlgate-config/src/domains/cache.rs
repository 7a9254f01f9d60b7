//! Persisted-query cache configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Persisted-query cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedQueryConfig {
    /// Whether automatic persisted queries are accepted
    #[serde(default = "crate::domains::utils::default_true")]
    pub enabled: bool,

    /// Addresses of the distributed cache servers
    #[serde(default = "default_servers")]
    pub servers: Vec<String>,

    /// Retry policy applied to every cache call
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Entries kept by the in-process cache
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

/// Fixed-interval retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first failed attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Wait between attempts
    #[serde(with = "crate::domains::utils::serde_duration_ms", default = "default_retry_interval")]
    pub retry_interval: Duration,
}

impl Default for PersistedQueryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            servers: default_servers(),
            retry: RetryPolicy::default(),
            capacity: default_capacity(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_interval: default_retry_interval(),
        }
    }
}

impl Validatable for PersistedQueryConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !self.enabled {
            return Ok(());
        }

        if self.servers.is_empty() {
            return Err(self.validation_error("At least one cache server must be configured"));
        }

        for server in &self.servers {
            validate_required_string(server, "servers", self.domain_name())?;
        }

        validate_positive(self.capacity, "capacity", self.domain_name())?;

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "persisted_queries"
    }
}

fn default_servers() -> Vec<String> {
    vec![
        "memcached-server-1".to_string(),
        "memcached-server-2".to_string(),
        "memcached-server-3".to_string(),
    ]
}

fn default_max_retries() -> u32 {
    10
}

fn default_retry_interval() -> Duration {
    Duration::from_millis(10_000)
}

fn default_capacity() -> usize {
    1000
}
