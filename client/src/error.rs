//! Error type shared by the client, dispatcher and transports.

use reqwest::header::InvalidHeaderValue;
use reqwest::Method;

/// Errors that can occur while building, sending or paginating requests.
///
/// Failures raised by a transport or a middleware travel through the
/// middleware chain untouched; the dispatcher never wraps them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The fake transport had no stub for the request and stray requests
    /// are prevented.
    #[error("No stubbed response for {method} {url}")]
    NoMatchingStubbedResponse { method: Method, url: String },

    /// A fake-only method was called on a client that is not faked.
    #[error("client is not faked; call fake() before stubbing responses")]
    ClientNotFaked,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Parameters could not be serialized, or a body could not be decoded
    /// into the requested type.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] InvalidHeaderValue),

    /// Request parameters did not serialize to a key/value map.
    #[error("invalid request parameters: {0}")]
    InvalidParameters(String),

    /// Pagination reached the configured page cap.
    #[error("pagination stopped after {limit} pages")]
    PageLimitExceeded { limit: usize },

    /// Failure raised by caller-supplied middleware, matchers or transports.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
