//! The transport boundary: anything that can turn a [`Request`] into an
//! [`HttpResponse`].
//!
//! [`ReqwestTransport`] performs real network calls. Tests swap it for
//! [`FakeTransport`](crate::fake::FakeTransport) through [`Client::fake`](crate::Client::fake),
//! or for any other implementation through
//! [`Client::with_transport`](crate::Client::with_transport).

use async_trait::async_trait;

use super::{HttpResponse, Request};
use crate::Error;

/// Sends a request and returns the fully buffered response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` over the wire (or pretend to).
    ///
    /// # Errors
    ///
    /// Returns whatever failure the transport hits; callers receive it
    /// unchanged.
    async fn send_request(&self, request: Request) -> Result<HttpResponse, Error>;
}

/// Transport backed by a `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom `reqwest::Client` (timeouts, proxies, TLS roots...).
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send_request(&self, request: Request) -> Result<HttpResponse, Error> {
        let (method, url, headers, body) = request.into_parts();

        let mut builder = self.client.request(method, url.as_str()).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        // Note: does not deal with streaming
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse::new(status).with_headers(headers).with_body(body))
    }
}
