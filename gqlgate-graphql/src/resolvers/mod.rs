//! GraphQL resolvers

pub mod mutation;
pub mod query;
pub mod subscription;

// Re-export all resolvers
pub use mutation::*;
pub use query::*;
pub use subscription::*;

use async_graphql::Context;

use crate::context::{RequestContext, SubscriptionContext};
use crate::pubsub::PubSub;

/// Identity of whoever issued the current operation
pub(crate) fn current_user(ctx: &Context<'_>) -> Option<String> {
    if let Some(context) = ctx.data_opt::<RequestContext>() {
        return context.current_user.clone();
    }
    ctx.data_opt::<SubscriptionContext>()
        .and_then(|context| context.current_user().map(str::to_string))
}

pub(crate) fn pubsub<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a PubSub> {
    if let Some(context) = ctx.data_opt::<RequestContext>() {
        return Ok(&context.pubsub);
    }
    ctx.data_opt::<SubscriptionContext>()
        .map(SubscriptionContext::pubsub)
        .ok_or_else(|| "No operation context available".into())
}
