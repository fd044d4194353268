//! Deterministic transport for tests.
//!
//! # Architecture
//!
//! - [`FakeTransport`] - ordered `(matcher, response)` stubs, first match wins
//! - [`UrlMatcher`] - literal URL with optional method and body criteria
//! - [`SequencedMatcher`] - wraps a matcher so it answers only once
//! - [`FakeResponse`] - the canned response a stub returns
//!
//! Most tests go through [`Client::fake`](crate::Client::fake), which swaps the
//! client's transport for a fresh `FakeTransport` and starts recording sent
//! requests:
//!
//! ```ignore
//! use generic_api_client::{fake::FakeResponse, Client};
//! use serde_json::json;
//!
//! let client = Client::new().fake();
//! client.stub_response("https://example.com/users", FakeResponse::json(&json!([{"id": 1}])))?;
//!
//! let response = client.json(Method::GET, "https://example.com/users", &()).await?;
//! assert_eq!(response.json_get("0.id"), Some(&json!(1)));
//! client.assert_sent(|request| request.url() == "https://example.com/users");
//! ```

mod matchers;
mod response;
mod transport;

pub use matchers::{Matcher, SequencedMatcher, UrlMatcher};
pub use response::FakeResponse;
pub use transport::{FakeTransport, StrayRequests};
