//! Websocket subscription transport
//!
//! Connections speak `graphql-ws` or `graphql-transport-ws`. The
//! `connection_init` payload goes through [`on_connect`]; a successful
//! connection's [`ConnectionContext`] becomes the [`SubscriptionContext`] of
//! every operation on that socket.

use async_graphql::{Data, ErrorExtensions};
use async_graphql_axum::{GraphQLProtocol, GraphQLWebSocket};
use axum::extract::ws::WebSocket;
use std::time::Duration;
use tracing::{debug, info};

use crate::context::{ConnectionContext, ContextBuilder};
use crate::errors::AuthenticationError;
use crate::schema::GatewaySchema;

/// Connection settings for the websocket transport
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionSettings {
    /// Log connects and disconnects
    pub log_connections: bool,
    pub keep_alive: Duration,
}

/// Authenticate a new connection from its `connection_init` payload.
///
/// No token validation exists yet, so every connection is refused.
pub async fn on_connect(
    log_connections: bool,
    _params: serde_json::Value,
) -> async_graphql::Result<ConnectionContext> {
    if log_connections {
        debug!(target: "graphql", "🔗  Connected to websocket");
    }

    Err(AuthenticationError.extend())
}

pub fn on_disconnect(log_connections: bool) {
    if log_connections {
        info!(target: "graphql", "❌  Disconnected to websocket");
    }
}

/// Serve GraphQL over an upgraded socket until the client goes away
pub async fn serve_subscriptions(
    socket: WebSocket,
    schema: GatewaySchema,
    protocol: GraphQLProtocol,
    contexts: ContextBuilder,
    settings: SubscriptionSettings,
) {
    let log_connections = settings.log_connections;

    GraphQLWebSocket::new(socket, schema, protocol)
        .keepalive_timeout(settings.keep_alive)
        .on_connection_init(move |params| async move {
            let connection = on_connect(log_connections, params).await?;
            let mut data = Data::default();
            data.insert(contexts.for_subscription(&connection));
            Ok::<_, async_graphql::Error>(data)
        })
        .serve()
        .await;

    on_disconnect(log_connections);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::codes;
    use serde_json::json;

    #[tokio::test]
    async fn test_on_connect_always_rejects() {
        for log_connections in [true, false] {
            let err = on_connect(log_connections, json!({ "authToken": "anything" }))
                .await
                .unwrap_err();

            assert_eq!(err.message, "Authentication token is invalid, please try again.");
            assert_eq!(
                err.extensions.as_ref().and_then(|ext| ext.get("code")),
                Some(&async_graphql::Value::from(codes::UNAUTHENTICATED))
            );
        }
    }
}
