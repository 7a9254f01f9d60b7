//! GraphQL-facing error types and the codes they carry in `extensions.code`

use async_graphql::{ErrorExtensionValues, ErrorExtensions, ServerError};
use thiserror::Error;

/// Values used for `extensions.code`
pub mod codes {
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const GRAPHQL_VALIDATION_FAILED: &str = "GRAPHQL_VALIDATION_FAILED";
    pub const PERSISTED_QUERY_NOT_FOUND: &str = "PERSISTED_QUERY_NOT_FOUND";
    pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";
}

/// Raised when a subscription connection cannot be authenticated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Error)]
#[error("Authentication token is invalid, please try again.")]
pub struct AuthenticationError;

impl ErrorExtensions for AuthenticationError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string())
            .extend_with(|_, e| e.set("code", codes::UNAUTHENTICATED))
    }
}

/// Build a located-less server error carrying `extensions.code`
pub(crate) fn coded_error(message: impl Into<String>, code: &str) -> ServerError {
    let mut extensions = ErrorExtensionValues::default();
    extensions.set("code", code);

    let mut error = ServerError::new(message, None);
    error.extensions = Some(extensions);
    error
}
