//! GraphQL subscription resolvers

use async_graphql::{Context, Result, Subscription};
use futures_util::stream::{Stream, StreamExt};

/// Root subscription resolver
pub struct Subscription;

#[Subscription]
impl Subscription {
    /// Messages published to `topic` after subscribing
    async fn messages(
        &self,
        ctx: &Context<'_>,
        topic: String,
    ) -> Result<impl Stream<Item = String>> {
        let pubsub = super::pubsub(ctx)?;

        tracing::debug!("New message subscription on topic '{}'", topic);

        Ok(pubsub.subscribe(&topic).filter_map(|payload| async move {
            match payload {
                serde_json::Value::String(message) => Some(message),
                _ => None,
            }
        }))
    }
}
