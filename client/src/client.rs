//! The client facade.
//!
//! # Architecture
//!
//! - Builds [`Request`]s for JSON and form submissions and prefixes the base URL
//! - Sends them through the [`MiddlewareDispatcher`] to the configured [`Transport`]
//! - Wraps the result in a [`Response`] envelope that knows how to paginate
//! - When faked, answers from a [`FakeTransport`] and records every exchange
//!
//! Configuration is copy-on-write: every `with_*` method returns a new client
//! and leaves the receiver untouched. Clones share the transport and, when
//! faked, the stubs and the recording log.
//!
//! ```ignore
//! let client = Client::new()
//!     .with_base_url("https://dummyjson.com")
//!     .with_middleware(vec![Arc::new(BearerAuth::new(&token)?)]);
//!
//! let response = client.json(Method::GET, "/products", &json!({"limit": 10})).await?;
//! println!("{}", response.json_get_or("products.0.title", json!("none")));
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::fake::{FakeResponse, FakeTransport, Matcher};
use crate::http::{Request, ReqwestTransport, Transport};
use crate::middleware::{DefaultHeaders, Middleware, MiddlewareDispatcher};
use crate::pagination::PaginationHandler;
use crate::{query, Error, Response};

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// One exchange made by a faked client: the request as the transport saw it
/// and the envelope handed back to the caller.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    request: Request,
    response: Response,
}

impl RecordedRequest {
    /// The request after every middleware ran.
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    #[must_use]
    pub const fn response(&self) -> &Response {
        &self.response
    }
}

type RecordingLog = Mutex<Vec<RecordedRequest>>;

/// Where a client writes its exchanges.
///
/// Envelopes keep a client so they can fetch further pages, and recorded
/// entries keep envelopes, so envelopes only hold the log weakly.
#[derive(Clone, Default)]
enum Recording {
    #[default]
    Disabled,
    Enabled(Arc<RecordingLog>),
    Detached(Weak<RecordingLog>),
}

impl Recording {
    fn log(&self) -> Option<Arc<RecordingLog>> {
        match self {
            Self::Disabled => None,
            Self::Enabled(log) => Some(Arc::clone(log)),
            Self::Detached(log) => log.upgrade(),
        }
    }

    fn downgrade(&self) -> Self {
        match self {
            Self::Enabled(log) => Self::Detached(Arc::downgrade(log)),
            other => other.clone(),
        }
    }
}

fn lock(log: &RecordingLog) -> MutexGuard<'_, Vec<RecordedRequest>> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}

/// HTTP API client with middleware, pagination and a built-in fake.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    fake: Option<Arc<FakeTransport>>,
    recording: Recording,
    base_url: String,
    dispatcher: MiddlewareDispatcher,
    pagination: Option<Arc<dyn PaginationHandler>>,
    max_pages: Option<usize>,
}

impl Client {
    /// A client sending real requests with reqwest.
    #[must_use]
    pub fn new() -> Self {
        Self::from_transport(ReqwestTransport::new())
    }

    #[must_use]
    pub fn from_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            fake: None,
            recording: Recording::Disabled,
            base_url: String::new(),
            dispatcher: MiddlewareDispatcher::default(),
            pagination: None,
            max_pages: None,
        }
    }

    /// Build a client from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidHeaderValue` if the configured user agent is
    /// not a valid header value.
    pub fn from_config(config: &ClientConfig) -> Result<Self, Error> {
        let mut client = Self::new().with_max_pages(config.max_pages);

        if let Some(base_url) = &config.base_url {
            client = client.with_base_url(base_url.clone());
        }

        if let Some(user_agent) = &config.user_agent {
            let mut headers = HeaderMap::new();
            headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);
            client = client.with_middleware(vec![Arc::new(DefaultHeaders::new(headers))]);
        }

        Ok(client)
    }

    /// Use `transport` for every request. The result is a real client: any
    /// fake and recording log are dropped from it.
    #[must_use]
    pub fn with_transport(&self, transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            fake: None,
            recording: Recording::Disabled,
            ..self.clone()
        }
    }

    /// Prefix relative URLs with `base_url`.
    #[must_use]
    pub fn with_base_url(&self, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..self.clone()
        }
    }

    /// Replace the middleware list. The first entry runs first.
    ///
    /// Layers already configured are dropped, including the `User-Agent`
    /// layer added by [`from_config`](Self::from_config). Use
    /// [`with_added_middleware`](Self::with_added_middleware) to keep them.
    #[must_use]
    pub fn with_middleware(&self, middleware: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            dispatcher: self.dispatcher.with_middleware(middleware),
            ..self.clone()
        }
    }

    /// Append `middleware` inside the layers already configured.
    #[must_use]
    pub fn with_added_middleware(&self, middleware: Vec<Arc<dyn Middleware>>) -> Self {
        let mut combined = self.dispatcher.middleware().to_vec();
        combined.extend(middleware);
        self.with_middleware(combined)
    }

    #[must_use]
    pub fn with_pagination_handler(&self, handler: impl PaginationHandler + 'static) -> Self {
        Self {
            pagination: Some(Arc::new(handler)),
            ..self.clone()
        }
    }

    /// Cap the number of pages [`Response::for_each_page`] visits. `None`
    /// removes the cap.
    #[must_use]
    pub fn with_max_pages(&self, max_pages: Option<usize>) -> Self {
        Self {
            max_pages,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        self.dispatcher.middleware()
    }

    #[must_use]
    pub fn pagination_handler(&self) -> Option<&Arc<dyn PaginationHandler>> {
        self.pagination.as_ref()
    }

    #[must_use]
    pub const fn max_pages(&self) -> Option<usize> {
        self.max_pages
    }

    /// A copy of this client answering from a fresh [`FakeTransport`] and
    /// recording every exchange in its own log.
    #[must_use]
    pub fn fake(&self) -> Self {
        let fake = Arc::new(FakeTransport::new());

        Self {
            transport: Arc::clone(&fake) as Arc<dyn Transport>,
            fake: Some(fake),
            recording: Recording::Enabled(Arc::default()),
            ..self.clone()
        }
    }

    #[must_use]
    pub const fn is_faked(&self) -> bool {
        self.fake.is_some()
    }

    /// The fake transport, when faked.
    #[must_use]
    pub fn fake_transport(&self) -> Option<&FakeTransport> {
        self.fake.as_deref()
    }

    /// Answer any request to `url` with `response`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ClientNotFaked` on a real client.
    pub fn stub_response(
        &self,
        url: impl Into<String>,
        response: FakeResponse,
    ) -> Result<&Self, Error> {
        self.faked()?.stub_response(url, response);
        Ok(self)
    }

    /// Answer `method` requests to `url` with `response`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ClientNotFaked` on a real client.
    pub fn stub_response_for(
        &self,
        method: Method,
        url: impl Into<String>,
        response: FakeResponse,
    ) -> Result<&Self, Error> {
        self.faked()?.stub_response_for(method, url, response);
        Ok(self)
    }

    /// Answer requests accepted by `matcher` with `response`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ClientNotFaked` on a real client.
    pub fn stub_response_with_matcher(
        &self,
        matcher: impl Matcher + 'static,
        response: FakeResponse,
    ) -> Result<&Self, Error> {
        self.faked()?.stub_response_with_matcher(matcher, response);
        Ok(self)
    }

    /// Fail requests no stub matches. This is the default.
    ///
    /// # Errors
    ///
    /// Returns `Error::ClientNotFaked` on a real client.
    pub fn prevent_stray_requests(&self) -> Result<&Self, Error> {
        self.faked()?.prevent_stray_requests();
        Ok(self)
    }

    /// Answer requests no stub matches with an empty `200 OK`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ClientNotFaked` on a real client.
    pub fn allow_stray_requests(&self) -> Result<&Self, Error> {
        self.faked()?.allow_stray_requests();
        Ok(self)
    }

    fn faked(&self) -> Result<&FakeTransport, Error> {
        self.fake.as_deref().ok_or(Error::ClientNotFaked)
    }

    /// Resolve `url` against the base URL and, for `GET`, append `params`
    /// as a query string.
    ///
    /// Absolute URLs are used as given. Relative URLs are appended to the
    /// base URL without normalization.
    #[must_use]
    pub fn build_url(&self, method: &Method, url: &str, params: &Value) -> String {
        let mut url = if is_absolute(url) {
            url.to_string()
        } else {
            format!("{}{url}", self.base_url)
        };

        if *method == Method::GET && !query::is_empty(params) {
            let separator = if url.contains('?') { '&' } else { '?' };
            url.push(separator);
            url.push_str(&query::build_query(params));
        }

        url
    }

    /// Send a JSON request. `params` go in the query string for `GET` and
    /// are JSON-encoded as the body otherwise.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameters` or `Error::Json` for parameters
    /// that do not serialize to a map, and any error from the middleware or
    /// the transport.
    pub async fn json<P>(&self, method: Method, url: &str, params: &P) -> Result<Response, Error>
    where
        P: Serialize + ?Sized,
    {
        let params = query::to_params(params)?;
        let body = if method == Method::GET || params.is_null() {
            None
        } else {
            Some(serde_json::to_vec(&params)?)
        };

        let request = self
            .new_request(method, url, &params, body)
            .with_header(CONTENT_TYPE, HeaderValue::from_static(JSON))
            .with_header(ACCEPT, HeaderValue::from_static(JSON));

        self.send(request).await
    }

    /// Send an `application/x-www-form-urlencoded` request. `params` go in
    /// the query string for `GET` and in the body otherwise.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameters` or `Error::Json` for parameters
    /// that do not serialize to a map, and any error from the middleware or
    /// the transport.
    pub async fn form<P>(&self, method: Method, url: &str, params: &P) -> Result<Response, Error>
    where
        P: Serialize + ?Sized,
    {
        let params = query::to_params(params)?;
        let body = (method != Method::GET).then(|| query::build_query(&params).into_bytes());

        let request = self
            .new_request(method, url, &params, body)
            .with_header(CONTENT_TYPE, HeaderValue::from_static(FORM));

        self.send(request).await
    }

    fn new_request(
        &self,
        method: Method,
        url: &str,
        params: &Value,
        body: Option<Vec<u8>>,
    ) -> Request {
        let url = self.build_url(&method, url, params);
        let request = Request::new(method, url);

        match body {
            Some(body) => request.with_body(body),
            None => request,
        }
    }

    /// Send a prepared request through the middleware and the transport.
    ///
    /// # Errors
    ///
    /// Returns any error raised by a middleware or the transport.
    pub async fn send(&self, request: Request) -> Result<Response, Error> {
        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            faked = self.is_faked(),
            "sending request"
        );

        let dispatched = self
            .dispatcher
            .dispatch(self.transport.as_ref(), request.clone())
            .await?;

        let response = Response::new(
            self.detached(),
            request,
            dispatched.response,
            self.pagination.clone(),
        );

        if let Some(log) = self.recording.log() {
            let mut log = lock(&log);
            log.push(RecordedRequest {
                request: dispatched.request,
                response: response.clone(),
            });
            tracing::trace!(recorded = log.len(), "recorded request");
        }

        Ok(response)
    }

    fn detached(&self) -> Self {
        Self {
            recording: self.recording.downgrade(),
            ..self.clone()
        }
    }

    /// Every recorded exchange, in send order. Empty for a real client.
    #[must_use]
    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.recording
            .log()
            .map(|log| lock(&log).clone())
            .unwrap_or_default()
    }

    /// Recorded exchanges whose as-sent request satisfies `predicate`, in
    /// send order.
    #[must_use]
    pub fn recorded_matching<F>(&self, predicate: F) -> Vec<RecordedRequest>
    where
        F: Fn(&Request) -> bool,
    {
        self.recorded()
            .into_iter()
            .filter(|recorded| predicate(&recorded.request))
            .collect()
    }

    /// Panic unless some recorded request satisfies `predicate`.
    #[track_caller]
    #[allow(clippy::panic)]
    pub fn assert_sent<F>(&self, predicate: F)
    where
        F: Fn(&Request) -> bool,
    {
        if self.recorded_matching(predicate).is_empty() {
            panic!(
                "expected a matching request to have been sent; {} recorded",
                self.recorded().len()
            );
        }
    }

    /// Panic if any recorded request satisfies `predicate`.
    #[track_caller]
    #[allow(clippy::panic)]
    pub fn assert_not_sent<F>(&self, predicate: F)
    where
        F: Fn(&Request) -> bool,
    {
        let matching = self.recorded_matching(predicate);
        if let Some(first) = matching.first() {
            panic!(
                "expected no matching request, found {} (first: {} {})",
                matching.len(),
                first.request.method(),
                first.request.url()
            );
        }
    }

    /// Panic unless exactly `count` requests were recorded.
    #[track_caller]
    #[allow(clippy::panic)]
    pub fn assert_sent_count(&self, count: usize) {
        let recorded = self.recorded().len();
        if recorded != count {
            panic!("expected {count} requests to have been sent, found {recorded}");
        }
    }

    #[track_caller]
    pub fn assert_nothing_sent(&self) {
        self.assert_sent_count(0);
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("dispatcher", &self.dispatcher)
            .field("paginated", &self.pagination.is_some())
            .field("max_pages", &self.max_pages)
            .field("faked", &self.is_faked())
            .finish_non_exhaustive()
    }
}

fn is_absolute(url: &str) -> bool {
    reqwest::Url::parse(url).is_ok_and(|parsed| parsed.has_host())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn relative_urls_get_the_base_url() {
        let client = Client::new().with_base_url("https://example.com/api");

        assert_eq!(
            client.build_url(&Method::POST, "/users", &json!({"id": 1})),
            "https://example.com/api/users"
        );
    }

    #[test]
    fn absolute_urls_ignore_the_base_url() {
        let client = Client::new().with_base_url("https://example.com/api");

        assert_eq!(
            client.build_url(&Method::GET, "https://other.com/users", &Value::Null),
            "https://other.com/users"
        );
    }

    #[test]
    fn get_params_become_the_query_string() {
        let client = Client::new();

        assert_eq!(
            client.build_url(&Method::GET, "https://example.com", &json!({"page": 2, "q": "a b"})),
            "https://example.com?page=2&q=a+b"
        );
        assert_eq!(
            client.build_url(&Method::GET, "https://example.com?limit=5", &json!({"page": 2})),
            "https://example.com?limit=5&page=2"
        );
        assert_eq!(
            client.build_url(&Method::GET, "https://example.com", &json!({})),
            "https://example.com"
        );
    }

    #[test]
    fn configuration_is_copy_on_write() {
        let original = Client::new();
        let configured = original
            .with_base_url("https://example.com")
            .with_max_pages(Some(3));

        assert_eq!(original.base_url(), "");
        assert_eq!(original.max_pages(), None);
        assert_eq!(configured.base_url(), "https://example.com");
        assert_eq!(configured.max_pages(), Some(3));
    }

    #[test]
    fn fake_leaves_the_original_real() {
        let real = Client::new();
        let faked = real.fake();

        assert!(!real.is_faked());
        assert!(faked.is_faked());
        assert!(matches!(
            real.stub_response("https://example.com", FakeResponse::new()),
            Err(Error::ClientNotFaked)
        ));
        assert!(matches!(real.allow_stray_requests(), Err(Error::ClientNotFaked)));
        assert!(faked
            .stub_response("https://example.com", FakeResponse::new())
            .is_ok());
    }

    #[test]
    fn each_fake_gets_its_own_stubs() {
        let first = Client::new().fake();
        let second = first.fake();
        first
            .stub_response("https://example.com", FakeResponse::new())
            .unwrap();

        assert_eq!(first.fake_transport().map(FakeTransport::stub_count), Some(1));
        assert_eq!(second.fake_transport().map(FakeTransport::stub_count), Some(0));
    }

    #[test]
    fn with_transport_makes_a_real_client() {
        let faked = Client::new().fake();
        let replaced = faked.with_transport(FakeTransport::new());

        assert!(!replaced.is_faked());
        assert!(replaced.recorded().is_empty());
    }

    #[tokio::test]
    async fn envelopes_do_not_keep_the_log_alive() {
        let client = Client::new().fake();
        client
            .stub_response("https://example.com", FakeResponse::new())
            .unwrap();

        let response = client
            .json(Method::GET, "https://example.com", &())
            .await
            .unwrap();
        let log = client.recording.log().unwrap();
        drop(client);

        assert_eq!(Arc::strong_count(&log), 1);
        assert!(!response.has_next_page());
    }

    #[tokio::test]
    async fn added_middleware_keeps_the_configured_user_agent() {
        let config = ClientConfig {
            user_agent: Some("generic-api-client/test".into()),
            ..ClientConfig::default()
        };
        let configured = Client::from_config(&config).unwrap();
        let client = configured
            .with_added_middleware(vec![Arc::new(crate::TraceRequests)])
            .fake();
        client
            .stub_response("https://example.com", FakeResponse::new())
            .unwrap();

        client
            .json(Method::GET, "https://example.com", &())
            .await
            .unwrap();

        assert_eq!(configured.middleware().len(), 1);
        assert_eq!(client.middleware().len(), 2);
        client.assert_sent(|request| {
            request.header("user-agent").as_deref() == Some("generic-api-client/test")
        });
    }

    #[test]
    fn with_middleware_replaces_configured_layers() {
        let config = ClientConfig {
            user_agent: Some("generic-api-client/test".into()),
            ..ClientConfig::default()
        };
        let replaced = Client::from_config(&config)
            .unwrap()
            .with_middleware(vec![Arc::new(crate::TraceRequests)]);

        assert_eq!(replaced.middleware().len(), 1);
    }

    #[test]
    #[should_panic(expected = "expected 1 requests to have been sent, found 0")]
    fn assert_sent_count_reports_the_actual_count() {
        Client::new().fake().assert_sent_count(1);
    }
}
