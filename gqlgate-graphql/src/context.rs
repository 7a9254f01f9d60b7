//! Per-operation contexts
//!
//! Every GraphQL invocation gets a fresh context. HTTP requests get a
//! [`RequestContext`]; operations running over a subscription connection get a
//! [`SubscriptionContext`] derived from the connection's [`ConnectionContext`].

use async_graphql::ServerError;
use gqlgate_web::middleware::request_id_of;
use http::request::Parts;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::pubsub::PubSub;
use crate::tracker::{ErrorReport, ErrorTracker, TrackError};

/// Identity assigned to every HTTP request until token validation exists
pub const PLACEHOLDER_IDENTITY: &str = "ACCESS_TOKEN";

/// Snapshot of the incoming HTTP request
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub request_id: String,
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

/// Headers resolvers want added to the HTTP response
#[derive(Debug, Clone, Default)]
pub struct ResponseHeaders(Arc<Mutex<HeaderMap>>);

impl ResponseHeaders {
    pub fn insert(&self, name: HeaderName, value: HeaderValue) {
        self.0.lock().insert(name, value);
    }

    pub fn append(&self, name: HeaderName, value: HeaderValue) {
        self.0.lock().append(name, value);
    }

    pub fn take(&self) -> HeaderMap {
        std::mem::take(&mut *self.0.lock())
    }
}

/// Context of an operation received over HTTP
#[derive(Clone)]
pub struct RequestContext {
    pub request: RequestInfo,
    pub response: ResponseHeaders,
    pub pubsub: PubSub,
    pub current_user: Option<String>,
    tracker: Arc<dyn ErrorTracker>,
}

impl RequestContext {
    /// Hand this operation's errors to the configured tracker
    pub fn track_errors(&self, errors: &[ServerError]) -> Result<(), TrackError> {
        self.tracker.track(ErrorReport {
            request_id: &self.request.request_id,
            current_user: self.current_user.as_deref(),
            errors,
        })
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("request", &self.request)
            .field("current_user", &self.current_user)
            .finish_non_exhaustive()
    }
}

/// State stored on a websocket connection after `connection_init`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionContext {
    pub current_user: Option<String>,
}

/// Context of an operation running over a subscription connection.
/// Fixed at connect time; a reconnect derives a new one.
#[derive(Debug, Clone)]
pub struct SubscriptionContext {
    pubsub: PubSub,
    current_user: Option<String>,
}

impl SubscriptionContext {
    pub fn pubsub(&self) -> &PubSub {
        &self.pubsub
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }
}

/// What triggered context construction
#[derive(Debug, Clone, Copy)]
pub enum Invocation<'a> {
    Request(&'a Parts),
    Subscription(&'a ConnectionContext),
}

#[derive(Debug, Clone)]
pub enum OperationContext {
    Request(RequestContext),
    Subscription(SubscriptionContext),
}

impl OperationContext {
    pub fn current_user(&self) -> Option<&str> {
        match self {
            Self::Request(ctx) => ctx.current_user.as_deref(),
            Self::Subscription(ctx) => ctx.current_user(),
        }
    }

    pub fn pubsub(&self) -> &PubSub {
        match self {
            Self::Request(ctx) => &ctx.pubsub,
            Self::Subscription(ctx) => ctx.pubsub(),
        }
    }
}

/// Builds operation contexts around the shared pubsub and error tracker
#[derive(Clone)]
pub struct ContextBuilder {
    pubsub: PubSub,
    tracker: Arc<dyn ErrorTracker>,
}

impl ContextBuilder {
    pub fn new(pubsub: PubSub, tracker: Arc<dyn ErrorTracker>) -> Self {
        Self { pubsub, tracker }
    }

    pub fn pubsub(&self) -> &PubSub {
        &self.pubsub
    }

    pub fn build(&self, invocation: Invocation<'_>) -> OperationContext {
        match invocation {
            Invocation::Request(parts) => OperationContext::Request(self.for_request(parts)),
            Invocation::Subscription(connection) => {
                OperationContext::Subscription(self.for_subscription(connection))
            }
        }
    }

    pub fn for_request(&self, parts: &Parts) -> RequestContext {
        RequestContext {
            request: RequestInfo {
                request_id: request_id_of(parts),
                method: parts.method.clone(),
                uri: parts.uri.clone(),
                headers: parts.headers.clone(),
            },
            response: ResponseHeaders::default(),
            pubsub: self.pubsub.clone(),
            current_user: Some(PLACEHOLDER_IDENTITY.to_string()),
            tracker: self.tracker.clone(),
        }
    }

    pub fn for_subscription(&self, connection: &ConnectionContext) -> SubscriptionContext {
        SubscriptionContext {
            pubsub: self.pubsub.clone(),
            current_user: connection.current_user.clone(),
        }
    }
}

impl std::fmt::Debug for ContextBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextBuilder")
            .field("pubsub", &self.pubsub)
            .finish_non_exhaustive()
    }
}
