//! Outgoing request value.
//!
//! A [`Request`] never changes in place. Every `with_*` method consumes the
//! value and hands back a new one, so a middleware that rewrites a header
//! cannot affect a copy the caller (or a pagination handler) is holding.

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use reqwest::Method;

/// An HTTP request as it travels through the middleware chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl Request {
    /// Create a request with no headers and no body.
    ///
    /// The URL is kept as the literal string given here. Fake transport
    /// matching compares against exactly this string.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// All values for `name` joined with `", "`, or `None` when absent or
    /// not valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        header_line(&self.headers, name)
    }

    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Replace every value of `name` with `value`.
    #[must_use]
    pub fn with_header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add `value` after any existing values of `name`.
    #[must_use]
    pub fn with_added_header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn without_header(mut self, name: &str) -> Self {
        self.headers.remove(name);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }

    pub(crate) fn into_parts(self) -> (Method, String, HeaderMap, Option<Vec<u8>>) {
        (self.method, self.url, self.headers, self.body)
    }
}

pub(crate) fn header_line(headers: &HeaderMap, name: &str) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(name)
        .iter()
        .map(HeaderValue::to_str)
        .collect::<Result<_, _>>()
        .ok()?;

    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

    #[test]
    fn with_methods_leave_the_original_untouched() {
        let original = Request::get("https://example.com");
        let rewritten = original
            .clone()
            .with_header(AUTHORIZATION, HeaderValue::from_static("Bearer abc"))
            .with_url("https://example.com?page=2");

        assert_eq!(original.url(), "https://example.com");
        assert!(original.header("authorization").is_none());
        assert_eq!(rewritten.url(), "https://example.com?page=2");
        assert_eq!(rewritten.header("Authorization").as_deref(), Some("Bearer abc"));
    }

    #[test]
    fn header_joins_multiple_values_in_order() {
        let request = Request::get("https://example.com")
            .with_added_header("accept", HeaderValue::from_static("application/json"))
            .with_added_header("accept", HeaderValue::from_static("text/plain"));

        assert_eq!(
            request.header("Accept").as_deref(),
            Some("application/json, text/plain")
        );
    }

    #[test]
    fn with_header_replaces_existing_values() {
        let request = Request::post("https://example.com")
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        assert_eq!(request.header("content-type").as_deref(), Some("application/json"));
    }

    #[test]
    fn without_header_removes_every_value() {
        let request = Request::get("https://example.com")
            .with_added_header("accept", HeaderValue::from_static("application/json"))
            .with_added_header("accept", HeaderValue::from_static("text/plain"))
            .with_header(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));

        let stripped = request.clone().without_header("Accept");

        assert!(stripped.header("accept").is_none());
        assert_eq!(stripped.header("authorization").as_deref(), Some("Bearer abc"));
        assert!(request.header("accept").is_some());
        assert_eq!(
            stripped.without_header("x-missing").headers().len(),
            1
        );
    }

    #[test]
    fn body_is_absent_until_set() {
        let request = Request::post("https://example.com");
        assert!(request.body().is_none());

        let request = request.with_body(r#"{"id":1}"#);
        assert_eq!(request.body(), Some(br#"{"id":1}"#.as_slice()));
        assert!(request.without_body().body().is_none());
    }
}
