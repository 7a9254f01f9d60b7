//! GraphQL layer of the gqlgate gateway
//!
//! This crate owns the per-operation pipeline around `async-graphql`: context
//! construction, the shared pubsub bus, error tracking fired before each
//! response is sent, the depth-limit rule, automatic persisted queries, client
//! error formatting, cache hints and the websocket subscription transport.

pub mod cache_hints;
pub mod context;
pub mod errors;
pub mod extensions;
pub mod format;
pub mod handlers;
pub mod persisted;
pub mod pubsub;
pub mod resolvers;
pub mod schema;
pub mod subscriptions;
pub mod tracker;

// Re-export main components
pub use cache_hints::{CacheHints, CACHE_CONTROL_EXTENSION};
pub use context::*;
pub use errors::*;
pub use extensions::{DepthLimit, DepthWarning, ErrorTracking, FieldMatcher, OperationDepths};
pub use format::{format_error, format_response, FormattedError, FormattedResponse};
pub use handlers::{graphql_router, GraphQLState, HandlerSettings};
pub use persisted::{
    CacheError, MemoryCacheBackend, PersistedQueries, PersistedQueryError, QueryCacheBackend,
    RetryingBackend,
};
pub use pubsub::PubSub;
pub use resolvers::{Mutation, Query, Subscription};
pub use schema::{configure_schema, create_schema, GatewaySchema, SchemaOptions};
pub use tracker::{
    spawn_reporter, ChannelErrorTracker, ErrorReport, ErrorSink, ErrorTracker, LoggingErrorTracker,
    NoopErrorTracker, TrackError, TrackedErrors,
};
