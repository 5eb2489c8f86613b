//! Default collaborator services.
//!
//! The application seeds these into the global injector at creation, so
//! every handler that declares one of them resolves something even when
//! the hosting application configures nothing further. All of them are
//! swappable: a later binding under the same identity replaces the
//! default.

use crate::error::PorticoError;
use crate::request::Request;
use crate::response::ResponseWriter;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Process environment the framework is executing in.
///
/// Read once at application creation from the `PORTICO_ENV` variable.
/// Collaborators may branch on it; the dispatch core never does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    /// Development mode (the default).
    #[default]
    Development,
    /// Production mode.
    Production,
}

impl Env {
    /// The environment variable consulted by [`Env::from_process`].
    pub const VAR: &'static str = "PORTICO_ENV";

    /// Reads the environment from the process, defaulting to development.
    #[must_use]
    pub fn from_process() -> Self {
        match std::env::var(Self::VAR).as_deref() {
            Ok("production") => Self::Production,
            _ => Self::Development,
        }
    }

    /// Returns `true` in production mode.
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Named logging facade bound into the global injector.
///
/// Events are emitted through `tracing`, so whatever subscriber the
/// hosting application installs sees them.
#[derive(Debug, Clone)]
pub struct Logger {
    name: String,
}

impl Logger {
    /// Creates a logger with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the logger name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Emits an info-level event.
    pub fn info(&self, message: &str) {
        tracing::info!(logger = %self.name, "{message}");
    }

    /// Emits a debug-level event.
    pub fn debug(&self, message: &str) {
        tracing::debug!(logger = %self.name, "{message}");
    }

    /// Emits a warn-level event.
    pub fn warn(&self, message: &str) {
        tracing::warn!(logger = %self.name, "{message}");
    }

    /// Emits an error-level event.
    pub fn error(&self, message: &str) {
        tracing::error!(logger = %self.name, "{message}");
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new("portico")
    }
}

/// Response rendering capability.
///
/// Bound under the `dyn Render` identity so handlers can declare it as a
/// dependency. The default is [`PlainRender`]; a template engine replaces
/// it by rebinding the same identity.
pub trait Render: Send + Sync {
    /// Writes raw bytes with the given status.
    fn raw(&self, resp: &mut ResponseWriter, status: StatusCode, body: &[u8]);

    /// Writes a JSON value with the given status.
    fn json(&self, resp: &mut ResponseWriter, status: StatusCode, value: &serde_json::Value);
}

/// Default fallback renderer: writes straight onto the response writer,
/// no templating involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRender;

impl Render for PlainRender {
    fn raw(&self, resp: &mut ResponseWriter, status: StatusCode, body: &[u8]) {
        resp.write_status(status);
        resp.write(body);
    }

    fn json(&self, resp: &mut ResponseWriter, status: StatusCode, value: &serde_json::Value) {
        resp.write_status(status);
        resp.set_content_type("application/json");
        resp.write(value.to_string().as_bytes());
    }
}

type NotFoundFn = dyn Fn(&mut ResponseWriter, &Request) + Send + Sync;
type ErrorFn = dyn Fn(&mut ResponseWriter, &PorticoError) + Send + Sync;

/// Swappable catch-all handler for requests nothing responded to.
///
/// The default implementation emits a 404 JSON envelope, but only when
/// nothing was written yet; it never overrides an earlier response.
#[derive(Clone)]
pub struct NotFoundHandler(Arc<NotFoundFn>);

impl NotFoundHandler {
    /// Wraps a custom not-found callable.
    pub fn new(f: impl Fn(&mut ResponseWriter, &Request) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Invokes the handler.
    pub fn call(&self, resp: &mut ResponseWriter, request: &Request) {
        (self.0)(resp, request);
    }
}

impl Default for NotFoundHandler {
    fn default() -> Self {
        Self::new(|resp, request| {
            if resp.written() {
                return;
            }
            let error = PorticoError::not_found(format!("no route for {}", request.path()));
            write_envelope(resp, &error);
        })
    }
}

impl std::fmt::Debug for NotFoundHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NotFoundHandler")
    }
}

/// Swappable handler for application errors reported during dispatch.
///
/// Invoked through the writer + error fast path with the error supplied
/// positionally. The default logs the error and, if nothing was written
/// yet, emits the error's JSON envelope with its mapped status.
#[derive(Clone)]
pub struct ErrorHandler(Arc<ErrorFn>);

impl ErrorHandler {
    /// Wraps a custom error-handling callable.
    pub fn new(f: impl Fn(&mut ResponseWriter, &PorticoError) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Invokes the handler.
    pub fn call(&self, resp: &mut ResponseWriter, error: &PorticoError) {
        (self.0)(resp, error);
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new(|resp, error| {
            tracing::error!(error = %error, "request failed");
            if resp.written() {
                return;
            }
            write_envelope(resp, error);
        })
    }
}

impl std::fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ErrorHandler")
    }
}

fn write_envelope(resp: &mut ResponseWriter, error: &PorticoError) {
    resp.write_status(error.status_code());
    resp.set_content_type("application/json");
    let body = serde_json::to_vec(&error.to_envelope(None)).unwrap_or_default();
    resp.write(body);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_default_is_development() {
        assert_eq!(Env::default(), Env::Development);
        assert!(!Env::Development.is_production());
        assert!(Env::Production.is_production());
    }

    #[test]
    fn test_plain_render_raw() {
        let mut resp = ResponseWriter::new();
        PlainRender.raw(&mut resp, StatusCode::CREATED, b"made");
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.body(), b"made");
    }

    #[test]
    fn test_plain_render_json() {
        let mut resp = ResponseWriter::new();
        PlainRender.json(
            &mut resp,
            StatusCode::OK,
            &serde_json::json!({ "ok": true }),
        );
        assert_eq!(
            resp.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert!(std::str::from_utf8(resp.body()).unwrap().contains("true"));
    }

    #[test]
    fn test_default_not_found_writes_404() {
        let mut resp = ResponseWriter::new();
        let request = Request::builder()
            .uri(http::Uri::from_static("/missing"))
            .build();
        NotFoundHandler::default().call(&mut resp, &request);

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = std::str::from_utf8(resp.body()).unwrap();
        assert!(body.contains("NOT_FOUND"));
        assert!(body.contains("/missing"));
    }

    #[test]
    fn test_default_not_found_respects_written_responses() {
        let mut resp = ResponseWriter::new();
        resp.write(b"already here");
        let request = Request::builder().build();
        NotFoundHandler::default().call(&mut resp, &request);

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body(), b"already here");
    }

    #[test]
    fn test_default_error_handler_writes_envelope() {
        let mut resp = ResponseWriter::new();
        let error = PorticoError::bad_request("broken input");
        ErrorHandler::default().call(&mut resp, &error);

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(std::str::from_utf8(resp.body())
            .unwrap()
            .contains("BAD_REQUEST"));
    }

    #[test]
    fn test_custom_error_handler() {
        let handler = ErrorHandler::new(|resp, _error| {
            resp.write_status(StatusCode::IM_A_TEAPOT);
            resp.write(b"custom");
        });

        let mut resp = ResponseWriter::new();
        handler.call(&mut resp, &PorticoError::internal("boom"));
        assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(resp.body(), b"custom");
    }
}
