//! Fully buffered HTTP response returned by a transport.
//!
//! All fields reflect the received response as-is. Middleware that wants to
//! change a response on the way out uses the consuming `with_*` methods.

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use reqwest::StatusCode;

use super::request::header_line;

/// Raw transport response: status, reason phrase, headers and body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: StatusCode,
    reason: String,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl HttpResponse {
    /// Create an empty response with the canonical reason phrase for
    /// `status` (or `"Unknown"` for non-standard codes).
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: canonical_reason(status),
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        header_line(&self.headers, name)
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Change the status. The reason phrase follows the new status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self.reason = canonical_reason(status);
        self
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    #[must_use]
    pub fn with_header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

fn canonical_reason(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("Unknown").to_string()
}
