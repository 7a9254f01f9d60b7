//! Subscription transport configuration

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Subscription (websocket) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    /// Whether the websocket transport is mounted
    #[serde(default = "crate::domains::utils::default_true")]
    pub enabled: bool,

    /// Keep-alive interval
    #[serde(with = "crate::domains::utils::serde_duration_ms", default = "default_keep_alive")]
    pub keep_alive: Duration,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keep_alive: default_keep_alive(),
        }
    }
}

impl Validatable for SubscriptionConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.enabled && self.keep_alive.is_zero() {
            return Err(self.validation_error("keep_alive must be greater than 0"));
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "subscriptions"
    }
}

fn default_keep_alive() -> Duration {
    Duration::from_millis(1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_defaults() {
        let config = SubscriptionConfig::default();
        assert!(config.enabled);
        assert_eq!(config.keep_alive, Duration::from_millis(1000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_keep_alive_is_invalid() {
        let config = SubscriptionConfig {
            keep_alive: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
