//! Predicates deciding which stub answers a request.

use reqwest::Method;
use serde_json::Value;

use crate::http::Request;

/// Decides whether a stub applies to an outgoing request.
///
/// `matches` takes `&mut self` so a matcher can carry state, as
/// [`SequencedMatcher`] does. The fake transport evaluates matchers one at a
/// time under its lock.
pub trait Matcher: Send {
    fn matches(&mut self, request: &Request) -> bool;
}

impl<F> Matcher for F
where
    F: FnMut(&Request) -> bool + Send,
{
    fn matches(&mut self, request: &Request) -> bool {
        self(request)
    }
}

/// Matches on the literal URL, and optionally the method and body.
///
/// The URL is compared as a string against the request URL including its
/// query, so `?a=1&b=2` and `?b=2&a=1` are different URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMatcher {
    url: String,
    method: Option<Method>,
    body: Option<Vec<u8>>,
}

impl UrlMatcher {
    /// Match any method and any body sent to `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: None,
            body: None,
        }
    }

    /// Only match requests using `method`.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Only match requests whose body is exactly `body`.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Only match requests whose body is the compact JSON encoding of `body`,
    /// which is what [`Client::json`](crate::Client::json) sends.
    #[must_use]
    pub fn json_body(self, body: &Value) -> Self {
        self.body(body.to_string())
    }

    /// Wrap this matcher so it matches at most once.
    #[must_use]
    pub const fn once(self) -> SequencedMatcher<Self> {
        SequencedMatcher::new(self)
    }
}

impl Matcher for UrlMatcher {
    fn matches(&mut self, request: &Request) -> bool {
        if let Some(body) = &self.body {
            if request.body().unwrap_or_default() != body.as_slice() {
                return false;
            }
        }

        if let Some(method) = &self.method {
            if method != request.method() {
                return false;
            }
        }

        self.url == request.url()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequenceState {
    Available,
    Consumed,
}

/// Matches at most once, then never again.
///
/// Register several sequenced stubs for the same request to answer it with
/// a different response each time, in registration order.
#[derive(Debug, Clone)]
pub struct SequencedMatcher<M = UrlMatcher> {
    inner: M,
    state: SequenceState,
}

impl<M> SequencedMatcher<M> {
    pub const fn new(inner: M) -> Self {
        Self {
            inner,
            state: SequenceState::Available,
        }
    }

    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.state == SequenceState::Consumed
    }
}

impl<M: Matcher> Matcher for SequencedMatcher<M> {
    fn matches(&mut self, request: &Request) -> bool {
        if self.state == SequenceState::Consumed {
            return false;
        }

        if self.inner.matches(request) {
            self.state = SequenceState::Consumed;
            return true;
        }

        false
    }
}
