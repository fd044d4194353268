#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

//! HTTP API client with composable middleware, pluggable pagination and a
//! fake transport for tests.
//!
//! # Architecture
//!
//! - [`Client`] - builds JSON/form requests and records exchanges when faked
//! - [`middleware`] - ordered interception around every request
//! - [`fake`] - stubbed responses matched by URL, method and body
//! - [`Response`] - status, headers, JSON path lookups and pagination
//! - [`config`] - figment-backed settings for building a client

mod client;
pub mod config;
mod error;
pub mod fake;
pub mod http;
pub mod middleware;
pub mod pagination;
pub mod query;
mod response;

pub use client::{Client, RecordedRequest};
pub use error::Error;
pub use http::{HttpResponse, Request, ReqwestTransport, Transport};
pub use middleware::{
    BearerAuth, DefaultHeaders, Dispatched, Middleware, MiddlewareDispatcher, Next, TraceRequests,
};
pub use pagination::PaginationHandler;
pub use response::Response;

pub use reqwest::{header, Method, StatusCode};
