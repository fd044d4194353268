//! Response envelope: the request that was sent, the transport response,
//! a lazily decoded JSON body and the pagination handler.

use std::sync::{Arc, OnceLock};

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::http::{HttpResponse, Request};
use crate::pagination::PaginationHandler;
use crate::{Client, Error};

/// Wraps a transport response with JSON helpers and pagination.
#[derive(Clone)]
pub struct Response {
    client: Client,
    request: Request,
    response: HttpResponse,
    decoded: OnceLock<Option<Value>>,
    pagination: Option<Arc<dyn PaginationHandler>>,
}

impl Response {
    pub(crate) fn new(
        client: Client,
        request: Request,
        response: HttpResponse,
        pagination: Option<Arc<dyn PaginationHandler>>,
    ) -> Self {
        Self {
            client,
            request,
            response,
            decoded: OnceLock::new(),
            pagination,
        }
    }

    /// The request this response answers, as the caller built it (before
    /// middleware). Pagination handlers extend this request.
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    #[must_use]
    pub const fn http_response(&self) -> &HttpResponse {
        &self.response
    }

    #[must_use]
    pub fn into_http_response(self) -> HttpResponse {
        self.response
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.response.status()
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        self.response.reason()
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.response.header(name)
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        self.response.body()
    }

    /// The body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.response.body()).into_owned()
    }

    /// Status is in the 2xx range.
    #[must_use]
    pub fn successful(&self) -> bool {
        self.status().is_success()
    }

    #[must_use]
    pub fn ok(&self) -> bool {
        self.status() == StatusCode::OK
    }

    /// Status is in the 3xx range.
    #[must_use]
    pub fn redirect(&self) -> bool {
        self.status().is_redirection()
    }

    #[must_use]
    pub fn client_error(&self) -> bool {
        self.status().is_client_error()
    }

    #[must_use]
    pub fn server_error(&self) -> bool {
        self.status().is_server_error()
    }

    #[must_use]
    pub fn unauthorized(&self) -> bool {
        self.status() == StatusCode::UNAUTHORIZED
    }

    #[must_use]
    pub fn forbidden(&self) -> bool {
        self.status() == StatusCode::FORBIDDEN
    }

    #[must_use]
    pub fn not_found(&self) -> bool {
        self.status() == StatusCode::NOT_FOUND
    }

    /// The decoded JSON body, or `None` when the body is not valid JSON.
    ///
    /// Decoded once per envelope; later calls reuse the result.
    #[must_use]
    pub fn json(&self) -> Option<&Value> {
        self.decoded
            .get_or_init(|| serde_json::from_slice(self.response.body()).ok())
            .as_ref()
    }

    /// Look up a dot-separated path in the JSON body.
    ///
    /// Segments index into maps by key and into lists by position, so
    /// `roles.0.name` reads the name of the first role. A top-level key that
    /// itself contains dots is found as-is before the path is split.
    #[must_use]
    pub fn json_get(&self, path: &str) -> Option<&Value> {
        lookup(self.json()?, path)
    }

    /// Like [`json_get`](Self::json_get), falling back to `default` when any
    /// segment is missing.
    #[must_use]
    pub fn json_get_or(&self, path: &str, default: Value) -> Value {
        self.json_get(path).cloned().unwrap_or(default)
    }

    /// Deserialize the body into `T`.
    ///
    /// # Errors
    ///
    /// Unlike [`json`](Self::json), returns `Error::Json` when the body does
    /// not decode into `T`.
    pub fn json_as<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(self.response.body())?)
    }

    #[must_use]
    pub fn pagination_handler(&self) -> Option<&Arc<dyn PaginationHandler>> {
        self.pagination.as_ref()
    }

    /// False when no pagination handler is configured.
    #[must_use]
    pub fn has_next_page(&self) -> bool {
        self.pagination
            .as_ref()
            .is_some_and(|handler| handler.has_next_page(self))
    }

    /// Fetch the next page through the client that produced this response.
    ///
    /// Returns `None` without a pagination handler or on the last page.
    ///
    /// # Errors
    ///
    /// Returns any error from building or sending the next request.
    pub async fn next_page(&self) -> Result<Option<Self>, Error> {
        let Some(handler) = &self.pagination else {
            return Ok(None);
        };

        if !handler.has_next_page(self) {
            return Ok(None);
        }

        let request = handler.next_page(self)?;
        self.client.send(request).await.map(Some)
    }

    /// Call `callback` with this page and then with every following page,
    /// in order, until the pagination handler reports no next page.
    ///
    /// # Errors
    ///
    /// Returns any error from fetching a page, or
    /// `Error::PageLimitExceeded` when the client's page cap would be
    /// passed.
    pub async fn for_each_page<F>(&self, mut callback: F) -> Result<(), Error>
    where
        F: FnMut(&Self),
    {
        callback(self);

        let limit = self.client.max_pages();
        let mut fetched = 1;
        let mut current: Option<Self> = None;

        loop {
            let page = current.as_ref().unwrap_or(self);

            if !page.has_next_page() {
                return Ok(());
            }

            if let Some(limit) = limit {
                if fetched >= limit {
                    tracing::warn!(limit, url = %page.request.url(), "pagination page cap reached");
                    return Err(Error::PageLimitExceeded { limit });
                }
            }

            let Some(next) = page.next_page().await? else {
                return Ok(());
            };

            fetched += 1;
            tracing::debug!(page = fetched, url = %next.request.url(), "fetched page");
            callback(&next);
            current = Some(next);
        }
    }
}

fn lookup<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    if let Some(value) = root.as_object().and_then(|map| map.get(path)) {
        return Some(value);
    }

    path.split('.').try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    })
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("request", &self.request)
            .field("response", &self.response)
            .field("paginated", &self.pagination.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn response_with_body(body: &str) -> Response {
        Response::new(
            Client::new(),
            Request::get("https://example.com"),
            HttpResponse::ok().with_body(body.to_string()),
            None,
        )
    }

    fn user() -> Response {
        response_with_body(
            &json!({
                "id": 1,
                "name": "Tom Harper",
                "address": {"line_1": "Line 1", "line_2": "Line 2"},
                "roles": [{"name": "admin"}, {"name": "user"}],
                "meta.version": "v2"
            })
            .to_string(),
        )
    }

    #[test]
    fn decodes_json_contents() {
        let response = user();
        assert_eq!(response.json_get("id"), Some(&json!(1)));
        assert_eq!(response.json_get("name"), Some(&json!("Tom Harper")));
    }

    #[test]
    fn reads_nested_values_and_list_indexes() {
        let response = user();
        assert_eq!(response.json_get("address.line_2"), Some(&json!("Line 2")));
        assert_eq!(response.json_get("roles.0.name"), Some(&json!("admin")));
        assert_eq!(response.json_get("roles.1.name"), Some(&json!("user")));
    }

    #[test]
    fn missing_segments_fall_back_to_default() {
        let response = user();
        assert_eq!(response.json_get_or("address.line_3", json!("none")), json!("none"));
        assert_eq!(response.json_get_or("roles.5.name", json!(null)), json!(null));
        assert_eq!(response.json_get_or("id.deeper", json!(0)), json!(0));
        assert_eq!(response.json_get_or("roles.first", json!([])), json!([]));
    }

    #[test]
    fn literal_dotted_keys_win() {
        assert_eq!(user().json_get("meta.version"), Some(&json!("v2")));
    }

    #[test]
    fn malformed_json_is_absent_not_an_error() {
        let response = response_with_body("<html>oops</html>");
        assert!(response.json().is_none());
        assert!(response.json_get("id").is_none());
        assert_eq!(response.json_get_or("id", json!(7)), json!(7));
        assert_eq!(response.text(), "<html>oops</html>");
    }

    #[test]
    fn empty_body_is_absent() {
        assert!(response_with_body("").json().is_none());
    }

    #[test]
    fn json_as_deserializes_typed_values() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct User {
            id: u32,
            name: String,
        }

        let parsed: User = user().json_as().unwrap();
        assert_eq!(
            parsed,
            User {
                id: 1,
                name: "Tom Harper".into()
            }
        );
        assert!(response_with_body("nope").json_as::<User>().is_err());
    }

    #[test]
    fn status_predicates() {
        let with_status = |status: StatusCode| {
            Response::new(
                Client::new(),
                Request::get("https://example.com"),
                HttpResponse::new(status),
                None,
            )
        };

        assert!(with_status(StatusCode::OK).ok());
        assert!(with_status(StatusCode::CREATED).successful());
        assert!(!with_status(StatusCode::CREATED).ok());
        assert!(with_status(StatusCode::FOUND).redirect());
        assert!(with_status(StatusCode::UNAUTHORIZED).unauthorized());
        assert!(with_status(StatusCode::FORBIDDEN).forbidden());
        assert!(with_status(StatusCode::NOT_FOUND).not_found());
        assert!(with_status(StatusCode::NOT_FOUND).client_error());
        assert!(with_status(StatusCode::BAD_GATEWAY).server_error());
        assert_eq!(with_status(StatusCode::NOT_FOUND).reason(), "Not Found");
    }

    #[test]
    fn into_http_response_hands_back_the_raw_response() {
        let raw = HttpResponse::new(StatusCode::ACCEPTED)
            .with_header("x-request-id", reqwest::header::HeaderValue::from_static("r-1"))
            .with_body("queued");
        let response = Response::new(
            Client::new(),
            Request::post("https://example.com/jobs"),
            raw.clone(),
            None,
        );

        assert_eq!(response.into_http_response(), raw);
    }

    #[tokio::test]
    async fn no_handler_means_no_next_page() {
        let response = user();
        assert!(!response.has_next_page());
        assert!(response.next_page().await.unwrap().is_none());
    }
}
