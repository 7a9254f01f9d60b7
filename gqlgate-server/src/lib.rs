//! gqlgate server
//!
//! Turns a [`gqlgate_config::GatewayConfig`] into immutable [`ServerOptions`],
//! wires the GraphQL routes, health check and middleware into one router, and
//! runs it until a shutdown signal arrives.

pub mod logging;
pub mod options;
pub mod policy;
pub mod startup;

// Re-export main components
pub use logging::init_logging;
pub use options::ServerOptions;
pub use policy::{policy_for, PolicySet};
pub use startup::Server;
