//! GraphQL endpoint and validation configuration

use crate::error::ConfigResult;
use crate::validation::{
    validate_hex_color, validate_positive, validate_required_string, Validatable,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// GraphQL configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphQLConfig {
    /// Path segment the GraphQL endpoint (and subscription socket) is served on
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Maximum allowed nesting of an operation's selection tree
    #[serde(default = "default_depth_limit")]
    pub depth_limit: usize,

    /// Fields the depth rule does not descend into
    #[serde(default = "default_depth_ignore")]
    pub depth_ignore: Vec<IgnoreRule>,

    /// Accent color used when printing the depth warning
    #[serde(default = "default_primary_color")]
    pub primary_color: String,

    /// Default max age for cache hints in production, in seconds
    #[serde(with = "crate::domains::utils::serde_duration", default = "default_cache_max_age")]
    pub cache_max_age: Duration,
}

/// A field name rule for the depth limit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IgnoreRule {
    /// Field name matches exactly
    Exact { name: String },
    /// Field name matches a regular expression
    Pattern { pattern: String },
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            depth_limit: default_depth_limit(),
            depth_ignore: default_depth_ignore(),
            primary_color: default_primary_color(),
            cache_max_age: default_cache_max_age(),
        }
    }
}

impl GraphQLConfig {
    /// Endpoint as an absolute route path, e.g. `/graphql`
    pub fn endpoint_path(&self) -> String {
        format!("/{}", self.endpoint.trim_matches('/'))
    }
}

impl Validatable for GraphQLConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(self.endpoint.trim_matches('/'), "endpoint", self.domain_name())?;
        validate_positive(self.depth_limit, "depth_limit", self.domain_name())?;
        validate_hex_color(&self.primary_color, "primary_color", self.domain_name())?;

        for rule in &self.depth_ignore {
            match rule {
                IgnoreRule::Exact { name } => {
                    validate_required_string(name, "depth_ignore.exact", self.domain_name())?;
                }
                IgnoreRule::Pattern { pattern } => {
                    regex::Regex::new(pattern).map_err(|e| {
                        self.validation_error(format!(
                            "Invalid depth_ignore pattern '{}': {}",
                            pattern, e
                        ))
                    })?;
                }
            }
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "graphql"
    }
}

fn default_endpoint() -> String {
    "graphql".to_string()
}

fn default_depth_limit() -> usize {
    10
}

fn default_depth_ignore() -> Vec<IgnoreRule> {
    vec![
        IgnoreRule::Pattern {
            pattern: "_trusted$".to_string(),
        },
        IgnoreRule::Exact {
            name: "idontcare".to_string(),
        },
    ]
}

fn default_primary_color() -> String {
    "#87CEEB".to_string()
}

fn default_cache_max_age() -> Duration {
    Duration::from_secs(5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_config_defaults() {
        let config = GraphQLConfig::default();
        assert_eq!(config.endpoint_path(), "/graphql");
        assert_eq!(config.depth_limit, 10);
        assert_eq!(config.depth_ignore.len(), 2);
        assert_eq!(config.cache_max_age, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_path_normalizes_slashes() {
        let config = GraphQLConfig {
            endpoint: "/api/graphql/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.endpoint_path(), "/api/graphql");
    }

    #[test]
    fn test_zero_depth_limit_is_invalid() {
        let config = GraphQLConfig {
            depth_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_ignore_pattern_is_rejected() {
        let config = GraphQLConfig {
            depth_ignore: vec![IgnoreRule::Pattern {
                pattern: "(unclosed".to_string(),
            }],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ignore_rule_yaml_shape() {
        let rules: Vec<IgnoreRule> = serde_yaml::from_str(
            "- type: exact\n  name: idontcare\n- type: pattern\n  pattern: _trusted$\n",
        )
        .unwrap();
        assert_eq!(rules, default_depth_ignore().into_iter().rev().collect::<Vec<_>>());
    }
}
