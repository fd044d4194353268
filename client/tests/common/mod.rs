//! Common test utilities for integration tests.
//!
//! - [`http_mock`] - wiremock server for exercising the reqwest transport
//! - [`NextPageHeader`] - pagination driven by a `next_page` response header
//! - [`EchoTransport`] - answers every request with its own body

#![allow(dead_code)]

pub mod http_mock;

use async_trait::async_trait;
use generic_api_client::header::CONTENT_TYPE;
use generic_api_client::pagination::set_query_param;
use generic_api_client::{
    Error, HttpResponse, PaginationHandler, Request, Response, Transport,
};

/// Follows the `next_page` response header by setting the `page` query
/// parameter on the previous request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NextPageHeader;

impl PaginationHandler for NextPageHeader {
    fn has_next_page(&self, response: &Response) -> bool {
        response.header("next_page").is_some()
    }

    fn next_page(&self, response: &Response) -> Result<Request, Error> {
        let page = response.header("next_page").unwrap_or_default();
        let url = set_query_param(response.request().url(), "page", &page);
        Ok(response.request().clone().with_url(url))
    }
}

/// Replies `200 OK` with the request body and content type.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoTransport;

#[async_trait]
impl Transport for EchoTransport {
    async fn send_request(&self, request: Request) -> Result<HttpResponse, Error> {
        let mut response = HttpResponse::ok().with_body(request.body().unwrap_or_default().to_vec());
        if let Some(content_type) = request.headers().get(CONTENT_TYPE) {
            response = response.with_header(CONTENT_TYPE, content_type.clone());
        }
        Ok(response)
    }
}
