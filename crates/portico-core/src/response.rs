//! Buffered response writer.
//!
//! [`ResponseWriter`] buffers the response a handler chain produces and
//! tracks whether anything has been written. The written flag is the
//! response-state query that default fallbacks use to decide whether to
//! emit a default status and body.

use bytes::{BufMut, Bytes, BytesMut};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};

/// A buffered response under construction.
///
/// Exactly one response is produced per request, and the first write wins:
/// once anything has been written, later status changes are no-ops and
/// body writes append. Nothing ever retroactively un-writes an earlier
/// response.
#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    written: bool,
}

impl ResponseWriter {
    /// Creates a fresh, unwritten response writer with status `200 OK`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            written: false,
        }
    }

    /// Returns `true` once any status or body has been written.
    ///
    /// Default fallbacks (such as the catch-all not-found handler) use
    /// this to decide whether to emit a default response.
    #[must_use]
    pub fn written(&self) -> bool {
        self.written
    }

    /// Returns the current status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code. First write wins: a no-op once written.
    pub fn write_status(&mut self, status: StatusCode) {
        if self.written {
            tracing::debug!(
                attempted = status.as_u16(),
                current = self.status.as_u16(),
                "ignoring status write after response was written"
            );
            return;
        }
        self.status = status;
        self.written = true;
    }

    /// Appends bytes to the response body and marks the response written.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) {
        self.body.put_slice(chunk.as_ref());
        self.written = true;
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the response headers for mutation.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Sets a header, replacing any previous value under the same name.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Sets the `Content-Type` header.
    pub fn set_content_type(&mut self, value: &'static str) {
        self.headers.insert(CONTENT_TYPE, HeaderValue::from_static(value));
    }

    /// Returns the body written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the number of body bytes written so far.
    #[must_use]
    pub fn size(&self) -> usize {
        self.body.len()
    }

    /// Flushes the buffered response into an `http::Response` for the
    /// transport collaborator.
    #[must_use]
    pub fn into_response(self) -> http::Response<Bytes> {
        let mut response = http::Response::new(self.body.freeze());
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}
