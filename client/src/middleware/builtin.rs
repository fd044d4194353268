//! Ready-made middleware.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use super::{Middleware, Next};
use crate::http::{HttpResponse, Request};
use crate::Error;

/// Adds `Authorization: Bearer <token>` to every request.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    value: HeaderValue,
}

impl BearerAuth {
    /// # Errors
    ///
    /// Returns `Error::InvalidHeaderValue` if the token contains characters
    /// that are not allowed in a header.
    pub fn new(token: &str) -> Result<Self, Error> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
        value.set_sensitive(true);
        Ok(Self { value })
    }
}

#[async_trait]
impl Middleware for BearerAuth {
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<HttpResponse, Error> {
        next.run(request.with_header(AUTHORIZATION, self.value.clone()))
            .await
    }
}

/// Inserts fixed headers into requests that do not already carry them.
#[derive(Debug, Clone, Default)]
pub struct DefaultHeaders {
    headers: HeaderMap,
}

impl DefaultHeaders {
    #[must_use]
    pub const fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }
}

#[async_trait]
impl Middleware for DefaultHeaders {
    async fn handle(&self, mut request: Request, next: Next<'_>) -> Result<HttpResponse, Error> {
        let missing: Vec<_> = self
            .headers
            .iter()
            .filter(|(name, _)| !request.headers().contains_key(*name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        for (name, value) in missing {
            request = request.with_added_header(name, value);
        }
        next.run(request).await
    }
}

/// Logs every request and its outcome through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceRequests;

#[async_trait]
impl Middleware for TraceRequests {
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<HttpResponse, Error> {
        let method = request.method().clone();
        let url = request.url().to_string();
        let start = Instant::now();

        tracing::info!(%method, %url, "sending request");

        let result = next.run(request).await;
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &result {
            Ok(response) => tracing::info!(
                %method,
                %url,
                status = response.status().as_u16(),
                elapsed_ms,
                "request completed"
            ),
            Err(e) => tracing::warn!(%method, %url, elapsed_ms, error = %e, "request failed"),
        }

        result
    }
}
