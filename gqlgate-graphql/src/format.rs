//! Client-facing error formatting
//!
//! Errors leave the server as `{ message, code, locations, path }` and nothing
//! else: no source chain, no extra extensions.

use async_graphql::{PathSegment, Pos, ServerError, Value};
use serde::Serialize;
use std::collections::BTreeMap;

/// The only error shape clients ever see
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedError {
    pub message: String,
    pub code: Option<Value>,
    pub locations: Option<Vec<Pos>>,
    pub path: Option<Vec<PathSegment>>,
}

/// A response whose errors went through [`format_error`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedResponse {
    pub data: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FormattedError>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, Value>,
}

pub fn error_code(error: &ServerError) -> Option<&Value> {
    error.extensions.as_ref().and_then(|ext| ext.get("code"))
}

pub fn error_code_str(error: &ServerError) -> Option<&str> {
    match error_code(error) {
        Some(Value::String(code)) => Some(code.as_str()),
        _ => None,
    }
}

pub fn format_error(error: &ServerError) -> FormattedError {
    FormattedError {
        message: error.message.clone(),
        code: error_code(error).cloned(),
        locations: (!error.locations.is_empty()).then(|| error.locations.clone()),
        path: (!error.path.is_empty()).then(|| error.path.clone()),
    }
}

pub fn format_response(response: async_graphql::Response) -> FormattedResponse {
    FormattedResponse {
        errors: response.errors.iter().map(format_error).collect(),
        data: response.data,
        extensions: response.extensions,
    }
}
