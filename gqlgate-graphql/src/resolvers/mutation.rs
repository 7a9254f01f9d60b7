//! GraphQL mutation resolvers

use async_graphql::{Context, Object, Result};

/// Root mutation resolver
pub struct Mutation;

#[Object]
impl Mutation {
    /// Publish a message to a topic; returns the number of live subscribers reached
    async fn publish(&self, ctx: &Context<'_>, topic: String, message: String) -> Result<i32> {
        let pubsub = super::pubsub(ctx)?;
        let receivers = pubsub.publish(&topic, serde_json::Value::String(message));

        tracing::debug!("Published to '{}', {} receivers", topic, receivers);
        Ok(i32::try_from(receivers).unwrap_or(i32::MAX))
    }
}
