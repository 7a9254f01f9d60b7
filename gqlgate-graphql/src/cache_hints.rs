//! Cache hints reported to clients in `extensions.cacheControl`
//!
//! `async-graphql` folds every `#[graphql(cache_control(...))]` hint touched by
//! an operation into [`Response::cache_control`]. The gateway reports that
//! policy in the response body only; no `Cache-Control` header is derived.

use async_graphql::{CacheControl, Response, Value};
use serde_json::json;
use std::time::Duration;

/// Extension key the hints are written under
pub const CACHE_CONTROL_EXTENSION: &str = "cacheControl";

/// Format version of the `cacheControl` extension
const CACHE_CONTROL_VERSION: u32 = 1;

/// Default policy applied to operations without explicit hints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheHints {
    default_max_age: i32,
}

impl CacheHints {
    pub fn new(default_max_age: Duration) -> Self {
        Self {
            default_max_age: i32::try_from(default_max_age.as_secs()).unwrap_or(i32::MAX),
        }
    }

    /// Max age in seconds for an operation's merged hint.
    /// Unhinted operations get the default; explicit hints never exceed it.
    pub fn max_age(&self, cache_control: &CacheControl) -> i32 {
        match cache_control.max_age {
            -1 => 0,
            0 => self.default_max_age,
            hinted => hinted.min(self.default_max_age),
        }
    }

    /// Attach one hint per root field of a successful response
    pub fn apply(&self, response: &mut Response) {
        let Value::Object(data) = &response.data else {
            return;
        };

        let max_age = self.max_age(&response.cache_control);
        let hints: Vec<serde_json::Value> = data
            .keys()
            .map(|field| {
                let mut hint = json!({ "path": [field.as_str()], "maxAge": max_age });
                if !response.cache_control.public {
                    hint["scope"] = json!("PRIVATE");
                }
                hint
            })
            .collect();

        let extension = json!({ "version": CACHE_CONTROL_VERSION, "hints": hints });
        if let Ok(value) = Value::from_json(extension) {
            response.extensions.insert(CACHE_CONTROL_EXTENSION.to_string(), value);
        }
    }
}
