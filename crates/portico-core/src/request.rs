//! Incoming request wrapper.

use bytes::Bytes;
use http::uri::PathAndQuery;
use http::{HeaderMap, Method, Uri};

/// An incoming request as seen by the dispatch core.
///
/// The transport collaborator delivers exactly one `Request` per logical
/// request. The core treats it as immutable during dispatch; the only
/// mutation is URL-prefix stripping, applied by the application before
/// gate handlers run.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    /// Creates a new request.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
        }
    }

    /// Creates a request from a standard `http::Request`.
    #[must_use]
    pub fn from_http(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        }
    }

    /// Returns a builder for constructing requests, mainly in tests.
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the query string if present.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a specific header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Returns the request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Strips `prefix` from the request path, if the path starts with it.
    ///
    /// Stripping an already-stripped path is a no-op for the same prefix,
    /// so repeated identical configuration yields identical behavior. The
    /// query string is preserved; an empty remainder becomes `/`.
    pub fn strip_prefix(&mut self, prefix: &str) {
        if prefix.is_empty() {
            return;
        }
        let Some(rest) = self.uri.path().strip_prefix(prefix) else {
            return;
        };
        let rest = if rest.is_empty() { "/" } else { rest };
        let stripped = match self.uri.query() {
            Some(query) => format!("{rest}?{query}"),
            None => rest.to_string(),
        };

        let Ok(path_and_query) = stripped.parse::<PathAndQuery>() else {
            tracing::warn!(prefix, "prefix stripping produced an invalid path; keeping original");
            return;
        };
        let mut parts = self.uri.clone().into_parts();
        parts.path_and_query = Some(path_and_query);
        if let Ok(uri) = Uri::from_parts(parts) {
            self.uri = uri;
        }
    }
}

/// Builder for [`Request`], in the spirit of the core context builders.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI.
    #[must_use]
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Adds a single header; invalid values are silently dropped.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the request. Method defaults to `GET`, URI to `/`.
    #[must_use]
    pub fn build(self) -> Request {
        Request {
            method: self.method.unwrap_or(Method::GET),
            uri: self.uri.unwrap_or_else(|| Uri::from_static("/")),
            headers: self.headers,
            body: self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let req = Request::builder().build();
        assert_eq!(req.method(), &Method::GET);
        assert_eq!(req.path(), "/");
        assert!(req.body().is_empty());
    }

    #[test]
    fn test_header_access() {
        let req = Request::builder()
            .header("content-type", "application/json")
            .build();
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("x-missing"), None);
    }

    #[test]
    fn test_strip_prefix() {
        let mut req = Request::builder()
            .uri(Uri::from_static("/api/users"))
            .build();
        req.strip_prefix("/api");
        assert_eq!(req.path(), "/users");
    }

    #[test]
    fn test_strip_prefix_is_idempotent() {
        let mut req = Request::builder()
            .uri(Uri::from_static("/api/users"))
            .build();
        req.strip_prefix("/api");
        req.strip_prefix("/api");
        assert_eq!(req.path(), "/users");
    }

    #[test]
    fn test_strip_prefix_preserves_query() {
        let mut req = Request::builder()
            .uri(Uri::from_static("/api/users?page=2"))
            .build();
        req.strip_prefix("/api");
        assert_eq!(req.path(), "/users");
        assert_eq!(req.query(), Some("page=2"));
    }

    #[test]
    fn test_strip_prefix_whole_path_yields_root() {
        let mut req = Request::builder().uri(Uri::from_static("/api")).build();
        req.strip_prefix("/api");
        assert_eq!(req.path(), "/");
    }

    #[test]
    fn test_strip_prefix_no_match_keeps_path() {
        let mut req = Request::builder()
            .uri(Uri::from_static("/other/users"))
            .build();
        req.strip_prefix("/api");
        assert_eq!(req.path(), "/other/users");
    }

    #[test]
    fn test_from_http() {
        let http_req = http::Request::builder()
            .method(Method::POST)
            .uri("/submit")
            .body(Bytes::from_static(b"payload"))
            .unwrap();
        let req = Request::from_http(http_req);
        assert_eq!(req.method(), &Method::POST);
        assert_eq!(req.path(), "/submit");
        assert_eq!(req.body().as_ref(), b"payload");
    }
}
