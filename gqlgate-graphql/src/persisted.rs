//! Automatic persisted queries (APQ, version 1)
//!
//! Clients send `extensions.persistedQuery = { version, sha256Hash }`. A request
//! without query text is resolved from the cache by hash; a request with query
//! text is verified against its hash and stored for later lookups.

use async_graphql::{Response, ServerError};
use async_trait::async_trait;
use gqlgate_config::RetryPolicy;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::{codes, coded_error};

/// The only APQ protocol version understood
pub const APQ_VERSION: u64 = 1;

const EXTENSION_KEY: &str = "persistedQuery";
const CACHE_KEY_PREFIX: &str = "apq:";

/// Result type for cache backend calls
pub type CacheResult<T> = std::result::Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("Cache backend error: {0}")]
    BackendError(String),
}

/// Storage for persisted query text, keyed by hash
#[async_trait]
pub trait QueryCacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    async fn set(&self, key: &str, query: String) -> CacheResult<()>;
}

/// In-process LRU backend
pub struct MemoryCacheBackend {
    entries: Mutex<LruCache<String, String>>,
}

impl MemoryCacheBackend {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl QueryCacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, query: String) -> CacheResult<()> {
        self.entries.lock().put(key.to_string(), query);
        Ok(())
    }
}

/// Wraps a backend with a fixed-interval retry policy
pub struct RetryingBackend<B> {
    inner: B,
    policy: RetryPolicy,
}

impl<B: QueryCacheBackend> RetryingBackend<B> {
    pub fn new(inner: B, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn with_retry<T, F, Fut>(&self, operation: &str, call: F) -> CacheResult<T>
    where
        T: Send,
        F: Fn() -> Fut + Send,
        Fut: Future<Output = CacheResult<T>> + Send,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.policy.max_retries => {
                    attempt += 1;
                    warn!(
                        "Cache {} failed (attempt {}/{}): {}",
                        operation, attempt, self.policy.max_retries, e
                    );
                    tokio::time::sleep(self.policy.retry_interval).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl<B: QueryCacheBackend> QueryCacheBackend for RetryingBackend<B> {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.with_retry("get", || self.inner.get(key)).await
    }

    async fn set(&self, key: &str, query: String) -> CacheResult<()> {
        self.with_retry("set", || self.inner.set(key, query.clone())).await
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistedQueryError {
    #[error("PersistedQueryNotFound")]
    NotFound,

    #[error("provided sha does not match query")]
    HashMismatch,

    #[error("Unsupported persisted query version")]
    UnsupportedVersion,

    #[error("Invalid persisted query extension: {0}")]
    Malformed(String),
}

impl PersistedQueryError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => codes::PERSISTED_QUERY_NOT_FOUND,
            _ => codes::BAD_REQUEST,
        }
    }

    pub fn to_server_error(&self) -> ServerError {
        coded_error(self.to_string(), self.code())
    }

    pub fn into_response(self) -> Response {
        Response::from_errors(vec![self.to_server_error()])
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedQueryExtension {
    version: u64,
    sha256_hash: String,
}

/// Resolves APQ requests against a cache backend
#[derive(Clone)]
pub struct PersistedQueries {
    backend: Arc<dyn QueryCacheBackend>,
}

impl PersistedQueries {
    pub fn new(backend: Arc<dyn QueryCacheBackend>) -> Self {
        Self { backend }
    }

    /// Fill in or register the request's query text. Requests without the
    /// persisted query extension are left untouched.
    pub async fn resolve(
        &self,
        request: &mut async_graphql::Request,
    ) -> Result<(), PersistedQueryError> {
        let Some(extension) = request.extensions.get(EXTENSION_KEY) else {
            return Ok(());
        };

        let extension: PersistedQueryExtension = serde_json::to_value(extension)
            .and_then(serde_json::from_value)
            .map_err(|e| PersistedQueryError::Malformed(e.to_string()))?;

        if extension.version != APQ_VERSION {
            return Err(PersistedQueryError::UnsupportedVersion);
        }

        let hash = extension.sha256_hash.to_ascii_lowercase();
        let key = format!("{}{}", CACHE_KEY_PREFIX, hash);

        if request.query.trim().is_empty() {
            return match self.backend.get(&key).await {
                Ok(Some(query)) => {
                    debug!("Persisted query hit for {}", hash);
                    request.query = query;
                    Ok(())
                }
                Ok(None) => Err(PersistedQueryError::NotFound),
                Err(e) => {
                    warn!("Persisted query lookup failed for {}: {}", hash, e);
                    Err(PersistedQueryError::NotFound)
                }
            };
        }

        if sha256_hex(&request.query) != hash {
            return Err(PersistedQueryError::HashMismatch);
        }

        if let Err(e) = self.backend.set(&key, request.query.clone()).await {
            warn!("Failed to persist query {}: {}", hash, e);
        }

        Ok(())
    }
}

pub fn sha256_hex(query: &str) -> String {
    format!("{:x}", Sha256::digest(query.as_bytes()))
}
