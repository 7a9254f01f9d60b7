//! Response lifecycle hook that forwards execution errors to the tracker

use async_graphql::extensions::{
    Extension, ExtensionContext, ExtensionFactory, NextParseQuery, NextRequest,
};
use async_graphql::parser::types::ExecutableDocument;
use async_graphql::{Response, ServerResult, Variables};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::context::RequestContext;

/// Calls [`RequestContext::track_errors`] once per operation, after execution
/// and before the response leaves the server. The response is never modified.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorTracking;

impl ExtensionFactory for ErrorTracking {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(ErrorTrackingExtension::default())
    }
}

#[derive(Default)]
struct ErrorTrackingExtension {
    // Operation data only becomes visible once the request is prepared
    context: Mutex<Option<RequestContext>>,
}

#[async_trait::async_trait]
impl Extension for ErrorTrackingExtension {
    async fn request(&self, ctx: &ExtensionContext<'_>, next: NextRequest<'_>) -> Response {
        let response = next.run(ctx).await;

        let captured = self.context.lock().take();
        match captured.as_ref().or_else(|| ctx.data_opt::<RequestContext>()) {
            Some(context) => will_send_response(context, &response),
            None => debug!("No request context attached to operation, skipping error tracking"),
        }

        response
    }

    async fn parse_query(
        &self,
        ctx: &ExtensionContext<'_>,
        query: &str,
        variables: &Variables,
        next: NextParseQuery<'_>,
    ) -> ServerResult<ExecutableDocument> {
        if let Some(context) = ctx.data_opt::<RequestContext>() {
            *self.context.lock() = Some(context.clone());
        }
        next.run(ctx, query, variables).await
    }
}

/// Deliver a finished response's errors to the context's tracker.
/// Tracker failures and panics are logged and swallowed.
pub fn will_send_response(context: &RequestContext, response: &Response) {
    let request_id = context.request.request_id.as_str();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| context.track_errors(&response.errors)));

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(
            request_id = %request_id,
            "Failed to track {} GraphQL errors: {}",
            response.errors.len(),
            e
        ),
        Err(_) => error!(
            request_id = %request_id,
            "Error tracker panicked while tracking {} GraphQL errors",
            response.errors.len()
        ),
    }
}
