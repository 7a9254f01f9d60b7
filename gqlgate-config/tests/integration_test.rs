//! Integration tests for gqlgate-config

use gqlgate_config::*;
use std::io::Write;
use std::time::Duration;
use temp_env::with_vars;

#[test]
fn test_default_config_validation() {
    let config = GatewayConfig::default();
    assert!(config.validate_all().is_ok());
    assert_eq!(config.environment, Environment::Development);
}

#[test]
fn test_config_loader_from_env() {
    let vars = vec![
        ("GQLGATE_ENVIRONMENT", Some("production")),
        ("GQLGATE_ENDPOINT", Some("api")),
        ("GQLGATE_FRONTEND_URL", Some("https://app.example.com")),
        ("GQLGATE_DEPTH_LIMIT", Some("7")),
        ("GQLGATE_PRIMARY_COLOR", Some("#ff6a00")),
        ("GQLGATE_LOG_LEVEL", Some("debug")),
    ];

    with_vars(vars, || {
        let config = ConfigLoader::new().from_env().unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.graphql.endpoint_path(), "/api");
        assert_eq!(config.server.frontend_url, "https://app.example.com");
        assert_eq!(config.graphql.depth_limit, 7);
        assert_eq!(config.graphql.primary_color, "#ff6a00");
        assert_eq!(config.logging.level, LogLevel::Debug);
    });
}

#[test]
fn test_invalid_env_values_are_rejected() {
    with_vars(vec![("GQLGATE_DEPTH_LIMIT", Some("deep"))], || {
        let result = ConfigLoader::new().from_env();
        assert!(matches!(result, Err(ConfigError::EnvError(_))));
    });

    with_vars(vec![("GQLGATE_ENVIRONMENT", Some("staging"))], || {
        let result = ConfigLoader::new().from_env();
        assert!(matches!(result, Err(ConfigError::EnvError(_))));
    });

    with_vars(vec![("GQLGATE_DEPTH_LIMIT", Some("0"))], || {
        let result = ConfigLoader::new().from_env();
        assert!(matches!(result, Err(ConfigError::DomainError { .. })));
    });
}

#[test]
fn test_custom_prefix() {
    with_vars(vec![("EDGE_SERVER_PORT", Some("8080"))], || {
        let config = ConfigLoader::with_prefix("EDGE").from_env().unwrap();
        assert_eq!(config.server.port, 8080);
    });
}

#[test]
fn test_yaml_config_round_trip() {
    let yaml = GatewayConfig::generate_sample();
    let parsed: GatewayConfig = serde_yaml::from_str(&yaml).unwrap();
    assert!(parsed.validate_all().is_ok());
    assert_eq!(parsed.subscriptions.keep_alive, Duration::from_millis(1000));
    assert_eq!(parsed.persisted_queries.retry, RetryPolicy::default());
}

#[test]
fn test_load_from_file_with_env_override() {
    let yaml = r#"
environment: prod
server:
  port: 9000
  frontend_url: "https://shop.example.com"
graphql:
  endpoint: gql
  depth_limit: 5
  depth_ignore:
    - type: exact
      name: metadata
persisted_queries:
  servers: ["cache-a:11211"]
  retry:
    max_retries: 3
    retry_interval: 500
subscriptions:
  keep_alive: 2500
logging:
  level: warn
  format: json
"#;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    with_vars(vec![("GQLGATE_SERVER_PORT", Some("9100"))], || {
        let config = ConfigLoader::new().load(Some(file.path())).unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.frontend_url, "https://shop.example.com");
        assert_eq!(config.graphql.endpoint_path(), "/gql");
        assert_eq!(config.graphql.depth_limit, 5);
        assert_eq!(
            config.graphql.depth_ignore,
            vec![IgnoreRule::Exact {
                name: "metadata".to_string()
            }]
        );
        assert_eq!(config.persisted_queries.servers, vec!["cache-a:11211".to_string()]);
        assert_eq!(config.persisted_queries.retry.max_retries, 3);
        assert_eq!(config.persisted_queries.retry.retry_interval, Duration::from_millis(500));
        assert_eq!(config.subscriptions.keep_alive, Duration::from_millis(2500));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, LogLevel::Warn);
    });
}

#[test]
fn test_missing_file_is_a_read_error() {
    let result = ConfigLoader::new().from_file("/nonexistent/gqlgate.yaml");
    assert!(matches!(result, Err(ConfigError::FileReadError(_))));
}
