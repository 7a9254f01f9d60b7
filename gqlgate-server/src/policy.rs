//! Environment dependent server policies

use gqlgate_config::Environment;
use gqlgate_web::CorsConfig;

/// Everything that differs between production and other environments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySet {
    pub cors: CorsConfig,
    pub playground: bool,
    /// Apollo tracing extension and HTTP request tracing
    pub tracing: bool,
    pub introspection: bool,
    /// Log websocket connects and disconnects
    pub connection_logging: bool,
    /// Report cache hints in `extensions.cacheControl`
    pub cache_control: bool,
}

/// Production locks CORS to the front-end origin, turns off developer
/// tooling and reports cache hints. Introspection stays on everywhere.
pub fn policy_for(environment: Environment, frontend_url: &str) -> PolicySet {
    if environment.is_production() {
        PolicySet {
            cors: CorsConfig::production(frontend_url),
            playground: false,
            tracing: false,
            introspection: true,
            connection_logging: false,
            cache_control: true,
        }
    } else {
        PolicySet {
            cors: CorsConfig::development(),
            playground: true,
            tracing: true,
            introspection: true,
            connection_logging: true,
            cache_control: false,
        }
    }
}
