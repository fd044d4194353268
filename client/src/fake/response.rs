//! Canned responses returned by the fake transport.

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;

use crate::http::HttpResponse;

/// A stubbed response. Materialized into a fresh [`HttpResponse`] every
/// time its stub matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl FakeResponse {
    /// An empty `200 OK`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// A `200 OK` whose body is `body` encoded as compact JSON.
    #[must_use]
    pub fn json(body: &Value) -> Self {
        Self::new()
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body(body.to_string())
    }

    /// A `200 OK` with a raw body.
    #[must_use]
    pub fn text(body: impl Into<Vec<u8>>) -> Self {
        Self::new().with_body(body)
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn to_http_response(&self) -> HttpResponse {
        HttpResponse::new(self.status)
            .with_headers(self.headers.clone())
            .with_body(self.body.clone())
    }
}

impl Default for FakeResponse {
    fn default() -> Self {
        Self::new()
    }
}
