//! HTTP mock server helpers for testing the reqwest transport.
//!
//! A thin wrapper around `wiremock`:
//!
//! ```ignore
//! let server = MockHttpServer::start().await;
//! Mock::given(method("GET"))
//!     .and(path("/users"))
//!     .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
//!     .mount(server.inner())
//!     .await;
//!
//! let client = Client::new().with_base_url(server.url());
//! ```

pub use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
pub use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct MockHttpServer {
    server: MockServer,
}

impl MockHttpServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the server, without a trailing slash.
    pub fn url(&self) -> String {
        self.server.uri()
    }

    pub const fn inner(&self) -> &MockServer {
        &self.server
    }

    pub async fn received_requests(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }
}
