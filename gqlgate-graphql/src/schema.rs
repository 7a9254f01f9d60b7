//! GraphQL schema definition

use async_graphql::extensions::ApolloTracing;
use async_graphql::{Schema, SchemaBuilder};
use gqlgate_config::IgnoreRule;

use crate::extensions::{DepthLimit, DepthWarning, ErrorTracking, FieldMatcher};
use crate::resolvers::{Mutation, Query, Subscription};

/// The gateway schema type
pub type GatewaySchema = Schema<Query, Mutation, Subscription>;

/// Validation and extension settings applied to the schema
#[derive(Debug, Clone)]
pub struct SchemaOptions {
    pub depth_limit: usize,
    pub depth_ignore: Vec<IgnoreRule>,
    /// Accent color of the depth warning
    pub primary_color: String,
    pub introspection: bool,
    pub apollo_tracing: bool,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            depth_limit: 10,
            depth_ignore: Vec::new(),
            primary_color: "#87CEEB".to_string(),
            introspection: true,
            apollo_tracing: false,
        }
    }
}

/// Create the GraphQL schema with all resolvers
pub fn create_schema() -> SchemaBuilder<Query, Mutation, Subscription> {
    Schema::build(Query, Mutation, Subscription)
}

/// Install error tracking, the depth rule and optional extensions
pub fn configure_schema(
    builder: SchemaBuilder<Query, Mutation, Subscription>,
    options: &SchemaOptions,
) -> Result<GatewaySchema, regex::Error> {
    let ignore = options
        .depth_ignore
        .iter()
        .map(FieldMatcher::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    let warning = DepthWarning::new(options.depth_limit, &options.primary_color);

    // Error tracking goes first so it wraps every other extension
    let mut schema = builder.extension(ErrorTracking).extension(
        DepthLimit::new(options.depth_limit)
            .ignore(ignore)
            .on_depths(move |depths| {
                warning.observe(depths);
            }),
    );

    if !options.introspection {
        schema = schema.disable_introspection();
    }

    if options.apollo_tracing {
        schema = schema.extension(ApolloTracing);
    }

    Ok(schema.finish())
}
