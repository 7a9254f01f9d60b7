//! `X-Request-ID` propagation
//!
//! Every request carries an id, taken from the caller's header or generated.
//! The id tags the request span, is echoed on the response and is what
//! operation contexts and error reports refer to.

use axum::{
    extract::Request,
    http::{request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

/// Request ID header name
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Id assigned to one HTTP request, stored in the request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Reuse the caller's id when it is present and printable
    fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|id| !id.is_empty())
            .map(|id| Self(id.to_string()))
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_headers(request.headers());
    let echoed = HeaderValue::from_str(request_id.as_str()).ok();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id.as_str(),
        method = %request.method(),
        uri = %request.uri(),
    );
    request.extensions_mut().insert(request_id);

    async move {
        let mut response = next.run(request).await;
        if let Some(value) = echoed {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}

/// Id stored by [`request_id_middleware`]; requests that bypassed the
/// middleware get a fresh one
pub fn request_id_of(parts: &Parts) -> String {
    match parts.extensions.get::<RequestId>() {
        Some(id) => id.0.clone(),
        None => RequestId::generate().0,
    }
}
