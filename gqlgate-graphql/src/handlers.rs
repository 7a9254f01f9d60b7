//! HTTP handlers for the GraphQL endpoint
//!
//! `POST` carries JSON or multipart requests. `GET` upgrades to a websocket
//! when asked, executes `?query=` requests, and otherwise serves the
//! playground when it is enabled.

use async_graphql::http::{
    parse_query_string, playground_source, receive_body, GraphQLPlaygroundConfig, MultipartOptions,
    ALL_WEBSOCKET_PROTOCOLS,
};
use async_graphql::parser::{parse_query, types::OperationType};
use async_graphql::ParseRequestError;
use async_graphql_axum::GraphQLProtocol;
use axum::extract::{FromRequestParts, Request, State, WebSocketUpgrade};
use axum::http::{header, request::Parts, HeaderMap, Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache_hints::CacheHints;
use crate::context::ContextBuilder;
use crate::extensions::will_send_response;
use crate::format::format_response;
use crate::persisted::PersistedQueries;
use crate::schema::GatewaySchema;
use crate::subscriptions::{serve_subscriptions, SubscriptionSettings};

/// Per-endpoint behaviour switches
#[derive(Clone, Default)]
pub struct HandlerSettings {
    /// Path of the GraphQL endpoint, e.g. `/graphql`
    pub endpoint: String,
    pub playground: bool,
    /// `None` refuses websocket upgrades
    pub subscriptions: Option<SubscriptionSettings>,
    pub uploads: MultipartOptions,
    /// Largest encoded operation accepted in a multipart request, in bytes
    pub max_field_size: Option<usize>,
    /// Report cache hints in `extensions.cacheControl`
    pub cache_hints: Option<CacheHints>,
}

/// Shared state of the GraphQL routes
#[derive(Clone)]
pub struct GraphQLState {
    pub schema: GatewaySchema,
    pub contexts: ContextBuilder,
    pub persisted: Option<PersistedQueries>,
    pub settings: Arc<HandlerSettings>,
}

/// Mount the GraphQL endpoint
pub fn graphql_router(state: GraphQLState) -> Router {
    let endpoint = state.settings.endpoint.clone();
    Router::new()
        .route(&endpoint, get(graphql_get).post(graphql_post))
        .with_state(state)
}

pub async fn graphql_post(State(state): State<GraphQLState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(e) => {
            warn!("Failed to read GraphQL request body: {}", e);
            return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
        }
    };

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let uploads = state.settings.uploads.clone();

    let multipart = content_type.is_some_and(|value| value.starts_with("multipart/"));

    match receive_body(content_type, futures_util::io::Cursor::new(body), uploads).await {
        Ok(request) => {
            if let Some(limit) = state.settings.max_field_size.filter(|_| multipart) {
                if operation_size(&request) > limit {
                    debug!("Rejected multipart operation larger than {} bytes", limit);
                    return (
                        StatusCode::PAYLOAD_TOO_LARGE,
                        format!("Operation exceeds the maximum field size of {} bytes", limit),
                    )
                        .into_response();
                }
            }
            execute(&state, &parts, request).await
        }
        Err(e) => parse_error_response(e),
    }
}

pub async fn graphql_get(State(state): State<GraphQLState>, request: Request) -> Response {
    let (mut parts, _) = request.into_parts();

    if is_websocket_upgrade(&parts.headers) {
        return upgrade(&state, &mut parts).await;
    }

    if let Some(query) = parts.uri.query().filter(|q| !q.is_empty()) {
        return match parse_query_string(query) {
            Ok(request) => execute(&state, &parts, request).await,
            Err(e) => parse_error_response(e),
        };
    }

    if state.settings.playground {
        return Html(playground(&state.settings.endpoint)).into_response();
    }

    StatusCode::NOT_FOUND.into_response()
}

async fn execute(
    state: &GraphQLState,
    parts: &Parts,
    mut request: async_graphql::Request,
) -> Response {
    let context = state.contexts.for_request(parts);
    let response_headers = context.response.clone();

    let hints = state.settings.cache_hints;

    if let Some(persisted) = &state.persisted {
        if let Err(e) = persisted.resolve(&mut request).await {
            debug!(request_id = %context.request.request_id, "Persisted query rejected: {}", e);
            let response = e.into_response();
            will_send_response(&context, &response);
            return graphql_response(response, response_headers.take(), hints);
        }
    }

    // Checked after persisted query resolution, which may supply the document
    if parts.method == Method::GET && !only_queries(&request) {
        debug!(request_id = %context.request.request_id, "Rejected non-query operation over GET");
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "POST")],
            "GET supports only query operation",
        )
            .into_response();
    }

    let response = state.schema.execute(request.data(context)).await;
    graphql_response(response, response_headers.take(), hints)
}

/// Whether every operation the request may run is a query. Documents that do
/// not parse are left to the schema, which reports the syntax error.
fn only_queries(request: &async_graphql::Request) -> bool {
    let Ok(document) = parse_query(&request.query) else {
        return true;
    };

    document
        .operations
        .iter()
        .filter(|(name, _)| match &request.operation_name {
            Some(selected) => name.is_some_and(|name| name.as_str() == selected.as_str()),
            None => true,
        })
        .all(|(_, operation)| operation.node.ty == OperationType::Query)
}

/// Encoded size of the operation as it arrived in the `operations` field
fn operation_size(request: &async_graphql::Request) -> usize {
    let variables = serde_json::to_vec(&request.variables).map_or(0, |encoded| encoded.len());
    request.query.len() + variables
}

async fn upgrade(state: &GraphQLState, parts: &mut Parts) -> Response {
    let Some(settings) = state.settings.subscriptions else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let protocol = match GraphQLProtocol::from_request_parts(parts, state).await {
        Ok(protocol) => protocol,
        Err(rejection) => return rejection.into_response(),
    };
    let upgrade = match WebSocketUpgrade::from_request_parts(parts, state).await {
        Ok(upgrade) => upgrade,
        Err(rejection) => return rejection.into_response(),
    };

    let schema = state.schema.clone();
    let contexts = state.contexts.clone();
    upgrade
        .protocols(ALL_WEBSOCKET_PROTOCOLS)
        .on_upgrade(move |socket| serve_subscriptions(socket, schema, protocol, contexts, settings))
        .into_response()
}

fn graphql_response(
    mut response: async_graphql::Response,
    extra_headers: HeaderMap,
    hints: Option<CacheHints>,
) -> Response {
    if let Some(hints) = hints {
        hints.apply(&mut response);
    }

    let mut headers = response.http_headers.clone();
    headers.extend(extra_headers);

    let mut http_response = Json(format_response(response)).into_response();
    http_response.headers_mut().extend(headers);
    http_response
}

fn parse_error_response(error: ParseRequestError) -> Response {
    let status = match error {
        ParseRequestError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    };
    debug!("Rejected malformed GraphQL request: {}", error);
    (status, error.to_string()).into_response()
}

fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("websocket"))
}

const EDITOR_FONT_FAMILY: &str =
    "'Source Code Pro', 'Consolas', 'Inconsolata', 'Droid Sans Mono', 'Monaco', monospace";

fn playground(endpoint: &str) -> String {
    playground_source(
        GraphQLPlaygroundConfig::new(endpoint)
            .subscription_endpoint(endpoint)
            .with_setting("editor.cursorShape", "underline")
            .with_setting("editor.fontFamily", EDITOR_FONT_FAMILY)
            .with_setting("editor.fontSize", 16)
            .with_setting("editor.reuseHeaders", true)
            .with_setting("editor.theme", "dark")
            .with_setting("general.betaUpdates", true)
            .with_setting("queryPlan.hideQueryPlanResponse", false)
            .with_setting("request.credentials", "include")
            .with_setting("tracing.hideTracingResponse", true),
    )
}
