//! Runs a request through an ordered middleware list and a transport.

use std::sync::{Arc, Mutex, PoisonError};

use super::{Middleware, Next};
use crate::http::{HttpResponse, Request, Transport};
use crate::Error;

/// The request that actually reached the transport, paired with the
/// response that came back out of the chain.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub request: Request,
    pub response: HttpResponse,
}

/// Composes middleware around a transport call.
///
/// Middleware in the first position is the first to run and the last to
/// see the response. Cloning is cheap; the list is shared.
#[derive(Clone, Default)]
pub struct MiddlewareDispatcher {
    middleware: Arc<[Arc<dyn Middleware>]>,
}

impl MiddlewareDispatcher {
    #[must_use]
    pub fn new(middleware: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            middleware: middleware.into(),
        }
    }

    /// A new dispatcher running `middleware` instead; `self` is unchanged.
    #[must_use]
    pub fn with_middleware(&self, middleware: Vec<Arc<dyn Middleware>>) -> Self {
        Self::new(middleware)
    }

    /// The configured middleware, outermost first.
    #[must_use]
    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }

    /// Send `request` through every middleware and then `transport`.
    ///
    /// The returned [`Dispatched::request`] is the request as the transport
    /// received it. When a middleware answers without calling `next`, the
    /// transport is never reached and the original request is reported.
    ///
    /// # Errors
    ///
    /// Returns the first failure raised by a middleware or the transport,
    /// unchanged.
    pub async fn dispatch(
        &self,
        transport: &dyn Transport,
        request: Request,
    ) -> Result<Dispatched, Error> {
        let sent = Mutex::new(None);

        tracing::trace!(
            middleware = self.middleware.len(),
            method = %request.method(),
            url = %request.url(),
            "dispatching request"
        );

        let response = Next::new(&self.middleware, transport, &sent)
            .run(request.clone())
            .await?;

        let request = sent
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .unwrap_or(request);

        Ok(Dispatched { request, response })
    }
}

impl std::fmt::Debug for MiddlewareDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareDispatcher")
            .field("middleware", &self.middleware.len())
            .finish()
    }
}
