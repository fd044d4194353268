//! In-memory transport answering requests from registered stubs.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use reqwest::Method;

use super::matchers::{Matcher, UrlMatcher};
use super::response::FakeResponse;
use crate::http::{HttpResponse, Request, Transport};
use crate::Error;

/// What to do with a request no stub matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrayRequests {
    /// Fail with [`Error::NoMatchingStubbedResponse`].
    #[default]
    Prevent,
    /// Answer with an empty `200 OK`.
    Allow,
}

struct Stub {
    matcher: Box<dyn Matcher>,
    response: FakeResponse,
}

#[derive(Default)]
struct State {
    stubs: Vec<Stub>,
    stray_requests: StrayRequests,
}

/// Transport that never touches the network.
///
/// Stubs are tried in the order they were registered and the first whose
/// matcher accepts the request answers it. Resolution is not cached: a
/// plain stub answers any number of requests, a sequenced stub answers one.
#[derive(Default)]
pub struct FakeTransport {
    state: Mutex<State>,
}

impl FakeTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer any request to `url` (any method, any body) with `response`.
    pub fn stub_response(&self, url: impl Into<String>, response: FakeResponse) {
        self.stub_response_with_matcher(UrlMatcher::new(url), response);
    }

    /// Answer `method` requests to `url` with `response`.
    pub fn stub_response_for(&self, method: Method, url: impl Into<String>, response: FakeResponse) {
        self.stub_response_with_matcher(UrlMatcher::new(url).method(method), response);
    }

    /// Answer requests accepted by `matcher` with `response`.
    pub fn stub_response_with_matcher(
        &self,
        matcher: impl Matcher + 'static,
        response: FakeResponse,
    ) {
        let mut state = self.lock();
        state.stubs.push(Stub {
            matcher: Box::new(matcher),
            response,
        });
        tracing::trace!(stubs = state.stubs.len(), "registered stub");
    }

    pub fn prevent_stray_requests(&self) {
        self.lock().stray_requests = StrayRequests::Prevent;
    }

    pub fn allow_stray_requests(&self) {
        self.lock().stray_requests = StrayRequests::Allow;
    }

    #[must_use]
    pub fn stray_requests(&self) -> StrayRequests {
        self.lock().stray_requests
    }

    #[must_use]
    pub fn stub_count(&self) -> usize {
        self.lock().stubs.len()
    }

    /// Find the response for `request`.
    ///
    /// The whole scan runs under the lock, so a sequenced matcher can never
    /// answer two concurrent requests.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoMatchingStubbedResponse` when nothing matches and
    /// stray requests are prevented.
    pub fn resolve(&self, request: &Request) -> Result<HttpResponse, Error> {
        let mut state = self.lock();

        let matched = state
            .stubs
            .iter_mut()
            .enumerate()
            .find_map(|(index, stub)| {
                stub.matcher
                    .matches(request)
                    .then(|| (index, stub.response.to_http_response()))
            });

        if let Some((index, response)) = matched {
            tracing::debug!(
                method = %request.method(),
                url = %request.url(),
                stub = index,
                status = response.status().as_u16(),
                "answered from stub"
            );
            return Ok(response);
        }

        match state.stray_requests {
            StrayRequests::Allow => {
                tracing::debug!(
                    method = %request.method(),
                    url = %request.url(),
                    "no stub matched, answering stray request with 200"
                );
                Ok(HttpResponse::ok())
            }
            StrayRequests::Prevent => Err(Error::NoMatchingStubbedResponse {
                method: request.method().clone(),
                url: request.url().to_string(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send_request(&self, request: Request) -> Result<HttpResponse, Error> {
        self.resolve(&request)
    }
}

impl std::fmt::Debug for FakeTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("FakeTransport")
            .field("stubs", &state.stubs.len())
            .field("stray_requests", &state.stray_requests)
            .finish()
    }
}
