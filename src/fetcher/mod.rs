//! Upstream API access
//!
//! The HTTP boundary ([`http::ApiHttpClient`]) turns every response into either
//! JSON or a structured [`FetchError`]. Everything above it works through the
//! [`ApiTransport`] trait, funnels each call through the
//! [`retry::RetryingFetcher`], and classifies failures by status field.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::model::{Envelope, ListPage, PageMeta};

pub mod endpoints;
pub mod http;
pub mod pagination;
pub mod print;
pub mod reference_cache;
pub mod retry;

/// Status the upstream API uses for throttling (and authorization failures)
pub const STATUS_RATE_LIMITED: u16 = 403;

/// Status meaning the entity does not exist
pub const STATUS_NOT_FOUND: u16 = 404;

/// Fetch errors
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FetchError {
    /// Non-2xx response; `status` is set once at the HTTP boundary
    #[error("HTTP error {status} for {path}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Request path
        path: String,
    },

    /// Transport failure (connect, timeout, TLS)
    #[error("network error: {0}")]
    Network(String),

    /// Body was not the expected JSON shape
    #[error("parse error: {0}")]
    Parse(String),
}

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Failure classes driving retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 403: retried with backoff
    RateLimited,
    /// 404: definitive absence, never retried
    NotFound,
    /// Anything else: retried like `RateLimited`
    Other,
}

impl FetchError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify by status field
    pub fn classify(&self) -> FailureKind {
        match self.status() {
            Some(STATUS_RATE_LIMITED) => FailureKind::RateLimited,
            Some(STATUS_NOT_FOUND) => FailureKind::NotFound,
            _ => FailureKind::Other,
        }
    }
}

/// One GET against the upstream API returning raw JSON
///
/// Implementations perform exactly one network call per invocation; retries,
/// rate limiting and statistics live above this seam.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// GET `path` with query parameters
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> FetchResult<Value>;

    /// Base URL requests are resolved against
    fn base_url(&self) -> &str;
}

/// Decode `{data: {<key>: [...]}, meta: {...}}`
///
/// A missing or `null` collection decodes as an empty page.
pub fn parse_list<T: DeserializeOwned>(mut body: Value, key: &str) -> FetchResult<ListPage<T>> {
    let meta = match body.get_mut("meta").map(Value::take) {
        Some(Value::Null) | None => PageMeta::default(),
        Some(meta) => serde_json::from_value(meta)
            .map_err(|e| FetchError::Parse(format!("invalid meta: {e}")))?,
    };

    let records = match body
        .get_mut("data")
        .and_then(|data| data.get_mut(key))
        .map(Value::take)
    {
        Some(Value::Null) | None => Vec::new(),
        Some(list) => serde_json::from_value(list)
            .map_err(|e| FetchError::Parse(format!("invalid `{key}` collection: {e}")))?,
    };

    Ok(ListPage { records, meta })
}

/// Decode `{data: T}`
pub fn parse_envelope<T: DeserializeOwned>(body: Value) -> FetchResult<T> {
    serde_json::from_value::<Envelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|e| FetchError::Parse(e.to_string()))
}
