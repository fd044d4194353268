//! Pluggable pagination.
//!
//! A [`PaginationHandler`] knows how to tell whether a response has a next
//! page and how to build the request for it. Configure one with
//! [`Client::with_pagination_handler`](crate::Client::with_pagination_handler)
//! and walk the pages with [`Response::for_each_page`](crate::Response::for_each_page).
//!
//! ```ignore
//! struct NextPageHeader;
//!
//! impl PaginationHandler for NextPageHeader {
//!     fn has_next_page(&self, response: &Response) -> bool {
//!         response.header("next_page").is_some()
//!     }
//!
//!     fn next_page(&self, response: &Response) -> Result<Request, Error> {
//!         let page = response.header("next_page").unwrap_or_default();
//!         let url = set_query_param(response.request().url(), "page", &page);
//!         Ok(response.request().clone().with_url(url))
//!     }
//! }
//! ```

use crate::http::Request;
use crate::query::{decode, encode};
use crate::{Error, Response};

/// Strategy for walking paginated responses.
pub trait PaginationHandler: Send + Sync {
    /// Whether `response` is followed by another page.
    fn has_next_page(&self, response: &Response) -> bool;

    /// Build the request fetching the page after `response`.
    ///
    /// Only called when [`has_next_page`](Self::has_next_page) returned true.
    ///
    /// # Errors
    ///
    /// Returns an error if the next request cannot be built.
    fn next_page(&self, response: &Response) -> Result<Request, Error>;
}

/// Set `key` to `value` in the query string of `url`, replacing an existing
/// value or appending a new pair.
///
/// Works on the literal string. Other parameters keep their order and
/// encoding, and no trailing slash is added, so the result still matches
/// stubs registered with the exact URL.
#[must_use]
pub fn set_query_param(url: &str, key: &str, value: &str) -> String {
    let (base, query) = url.split_once('?').unwrap_or((url, ""));
    let encoded_key = encode(key);
    let replacement = format!("{encoded_key}={}", encode(value));

    let mut replaced = false;
    let mut pairs: Vec<String> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let name = pair.split_once('=').map_or(pair, |(name, _)| name);
            if name == encoded_key && !replaced {
                replaced = true;
                replacement.clone()
            } else {
                pair.to_string()
            }
        })
        .collect();

    if !replaced {
        pairs.push(replacement);
    }

    format!("{base}?{}", pairs.join("&"))
}

/// Read the first value of `key` from the query string of `url`.
#[must_use]
pub fn query_param(url: &str, key: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    let encoded_key = encode(key);

    query.split('&').find_map(|pair| {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        if name == encoded_key {
            decode(value)
        } else {
            None
        }
    })
}
