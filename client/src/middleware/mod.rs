//! Request/response interception.
//!
//! # Architecture
//!
//! - [`Middleware`] - one layer of the chain
//! - [`Next`] - the rest of the chain, handed to each layer as a value
//! - [`MiddlewareDispatcher`] - runs a request through an ordered list of
//!   middleware and finally the transport
//! - [`BearerAuth`], [`DefaultHeaders`], [`TraceRequests`] - ready-made layers
//!
//! Middleware at position 0 is the outermost layer: it sees the request
//! first and the response last.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//! use generic_api_client::{Error, HttpResponse, Middleware, Next, Request};
//!
//! struct Tenant(&'static str);
//!
//! #[async_trait]
//! impl Middleware for Tenant {
//!     async fn handle(&self, request: Request, next: Next<'_>) -> Result<HttpResponse, Error> {
//!         let request = request.with_header("x-tenant", self.0.parse()?);
//!         next.run(request).await
//!     }
//! }
//! ```

mod builtin;
mod dispatcher;

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::http::{HttpResponse, Request, Transport};
use crate::Error;

pub use builtin::{BearerAuth, DefaultHeaders, TraceRequests};
pub use dispatcher::{Dispatched, MiddlewareDispatcher};

/// One layer of the request pipeline.
///
/// Call `next.run(request)` to continue the chain. A middleware can:
/// - rewrite the request before calling `next`
/// - rewrite the response after `next` returns
/// - return a response without calling `next`, skipping every inner layer
///   and the transport
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Handle `request`, delegating to `next` for the rest of the chain.
    ///
    /// # Errors
    ///
    /// Returns the error from `next` or one raised by the middleware itself.
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<HttpResponse, Error>;
}

/// The remainder of a middleware chain.
///
/// [`Next::run`] consumes the value. A layer that needs to continue the
/// chain more than once clones it first.
#[derive(Clone)]
pub struct Next<'a> {
    middleware: &'a [Arc<dyn Middleware>],
    transport: &'a dyn Transport,
    sent: &'a Mutex<Option<Request>>,
}

impl<'a> Next<'a> {
    pub(crate) fn new(
        middleware: &'a [Arc<dyn Middleware>],
        transport: &'a dyn Transport,
        sent: &'a Mutex<Option<Request>>,
    ) -> Self {
        Self {
            middleware,
            transport,
            sent,
        }
    }

    /// Pass `request` to the next middleware, or to the transport when no
    /// middleware is left.
    ///
    /// # Errors
    ///
    /// Propagates failures from inner middleware and the transport unchanged.
    pub async fn run(self, request: Request) -> Result<HttpResponse, Error> {
        match self.middleware.split_first() {
            Some((current, rest)) => {
                let next = Next::new(rest, self.transport, self.sent);
                current.handle(request, next).await
            }
            None => {
                // Remember the as-sent request; the last one to reach the transport wins.
                *self.sent.lock().unwrap_or_else(PoisonError::into_inner) = Some(request.clone());
                self.transport.send_request(request).await
            }
        }
    }

    /// Number of middleware left before the transport.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.middleware.len()
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.middleware.len())
            .finish_non_exhaustive()
    }
}
