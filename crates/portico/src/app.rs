//! Application assembly and request dispatch.
//!
//! An [`App`] owns the global injector, the registered middleware chain,
//! and the pre-dispatch gates. [`App::handle`] turns one request into one
//! response: gates run first, then the middleware chain followed by any
//! router-resolved chain, then the not-found or error fallback.

use crate::router::{NullRouter, Router};
use bytes::Bytes;
use http::StatusCode;
use portico_core::{
    Context, Env, ErrorHandler, Gate, Handler, IntoHandler, Logger, NotFoundHandler, PlainRender,
    Render, Request, ResponseWriter,
};
use portico_core::Injector;
use std::sync::Arc;

/// A web application: global services plus an ordered handler chain.
///
/// # Example
///
/// ```
/// use portico::prelude::*;
///
/// let mut app = App::new();
/// app.use_handler(|resp: &mut ResponseWriter, _ctx: &mut Context| -> HandlerResult {
///     resp.write(b"hello");
///     Ok(())
/// });
///
/// let response = app.handle(Request::builder().build());
/// assert_eq!(response.body().as_ref(), b"hello");
/// ```
pub struct App {
    injector: Arc<Injector>,
    handlers: Vec<Handler>,
    befores: Vec<Gate>,
    url_prefix: Option<String>,
}

impl App {
    /// Creates an application with the default service bindings.
    ///
    /// Seeds a [`Logger`], the process [`Env`], a plain [`Render`], the
    /// default [`NotFoundHandler`] and [`ErrorHandler`], and a
    /// [`NullRouter`]. Each can be replaced by binding the same identity
    /// again.
    #[must_use]
    pub fn new() -> Self {
        let mut injector = Injector::new();
        injector.map(Arc::new(Logger::default()));
        injector.map(Arc::new(Env::from_process()));
        injector.map(Arc::new(NotFoundHandler::default()));
        injector.map(Arc::new(ErrorHandler::default()));
        injector.map_as::<dyn Render>(Arc::new(PlainRender));
        injector.map_as::<dyn Router>(Arc::new(NullRouter));

        Self {
            injector: Arc::new(injector),
            handlers: Vec::new(),
            befores: Vec::new(),
            url_prefix: None,
        }
    }

    /// Returns the global injector.
    #[must_use]
    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    /// Binds a service under its concrete type.
    pub fn map<T: Send + Sync + 'static>(&mut self, service: Arc<T>) -> &mut Self {
        Arc::make_mut(&mut self.injector).map(service);
        self
    }

    /// Binds a service under an interface identity, usually `dyn Trait`.
    pub fn map_as<I: ?Sized + Send + Sync + 'static>(&mut self, service: Arc<I>) -> &mut Self {
        Arc::make_mut(&mut self.injector).map_as::<I>(service);
        self
    }

    /// Binds the router that resolves per-request handler chains.
    pub fn router(&mut self, router: impl Router + 'static) -> &mut Self {
        self.map_as::<dyn Router>(Arc::new(router))
    }

    /// Replaces the registered middleware chain wholesale.
    pub fn handlers(&mut self, handlers: Vec<Handler>) -> &mut Self {
        self.handlers = handlers;
        self
    }

    /// Appends one handler to the end of the middleware chain.
    pub fn use_handler<M>(&mut self, handler: impl IntoHandler<M>) -> &mut Self {
        self.handlers.push(Handler::new(handler));
        self
    }

    /// Registers a pre-dispatch gate.
    ///
    /// Gates run in registration order before any handler. A gate that
    /// returns `true` has taken over the request: dispatch stops and the
    /// response writer's current state is returned as-is.
    pub fn before(
        &mut self,
        gate: impl Fn(&mut ResponseWriter, &Request) -> bool + Send + Sync + 'static,
    ) -> &mut Self {
        self.befores.push(Arc::new(gate));
        self
    }

    /// Sets the URL prefix stripped from every incoming request path.
    ///
    /// Calling again replaces the previous prefix; stripping applies to
    /// the original request path, never cumulatively.
    pub fn set_url_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        let prefix = prefix.into();
        self.url_prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    /// Dispatches one request through gates, the handler chain, and the
    /// fallback services, producing the final response.
    pub fn handle(&self, mut request: Request) -> http::Response<Bytes> {
        let span = tracing::debug_span!(
            "dispatch",
            method = %request.method(),
            path = %request.path(),
        );
        let _guard = span.enter();

        if let Some(prefix) = &self.url_prefix {
            request.strip_prefix(prefix);
        }

        let mut resp = ResponseWriter::new();

        for gate in &self.befores {
            if gate(&mut resp, &request) {
                tracing::debug!("request handled by gate");
                return resp.into_response();
            }
        }

        let mut chain = self.handlers.clone();
        if let Ok(router) = self.injector.get_as::<dyn Router>() {
            if let Some(routed) = router.resolve(request.method(), request.path()) {
                chain.extend(routed);
            }
        }

        let mut ctx = Context::new(Arc::clone(&self.injector), Arc::from(chain), request);
        let result = ctx.next(&mut resp);

        // Fallbacks resolve through the request's injector so a
        // request-scoped rebinding shadows the global default.
        match result {
            Ok(()) => {
                if !resp.written() {
                    let request = ctx.request_arc();
                    match ctx.injector().get::<NotFoundHandler>() {
                        Ok(not_found) => not_found.call(&mut resp, &request),
                        Err(_) => resp.write_status(StatusCode::NOT_FOUND),
                    }
                }
            }
            Err(dispatch_error) => {
                let error = dispatch_error.into_portico_error();
                match ctx.injector().get::<ErrorHandler>() {
                    Ok(handler) => handler.call(&mut resp, &error),
                    Err(_) => {
                        resp.write_status(error.status_code());
                        tracing::error!(error = %error, "no error handler bound");
                    }
                }
            }
        }

        resp.into_response()
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("handlers", &self.handlers.len())
            .field("befores", &self.befores.len())
            .field("url_prefix", &self.url_prefix)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_core::{HandlerResult, PorticoError};

    #[test]
    fn test_bare_app_answers_not_found() {
        let app = App::new();
        let response = app.handle(Request::builder().build());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_registered_handler_runs() {
        let mut app = App::new();
        app.use_handler(|resp: &mut ResponseWriter, _ctx: &mut Context| -> HandlerResult {
            resp.write(b"ran");
            Ok(())
        });

        let response = app.handle(Request::builder().build());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"ran");
    }

    #[test]
    fn test_gate_takes_over_dispatch() {
        let mut app = App::new();
        app.before(|resp, _request| {
            resp.write_status(StatusCode::FORBIDDEN);
            resp.write(b"blocked");
            true
        });
        app.use_handler(|_resp: &mut ResponseWriter, _ctx: &mut Context| -> HandlerResult {
            panic!("handler must not run");
        });

        let response = app.handle(Request::builder().build());
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.body().as_ref(), b"blocked");
    }

    #[test]
    fn test_declining_gate_lets_dispatch_continue() {
        let mut app = App::new();
        app.before(|_resp, _request| false);
        app.use_handler(|resp: &mut ResponseWriter, _ctx: &mut Context| -> HandlerResult {
            resp.write(b"through");
            Ok(())
        });

        let response = app.handle(Request::builder().build());
        assert_eq!(response.body().as_ref(), b"through");
    }

    #[test]
    fn test_url_prefix_is_stripped_before_dispatch() {
        let mut app = App::new();
        app.set_url_prefix("/api");
        app.use_handler(|resp: &mut ResponseWriter, ctx: &mut Context| -> HandlerResult {
            resp.write(ctx.request().path().as_bytes());
            Ok(())
        });

        let response = app.handle(
            Request::builder()
                .uri(http::Uri::from_static("/api/users"))
                .build(),
        );
        assert_eq!(response.body().as_ref(), b"/users");
    }

    #[test]
    fn test_handler_error_reaches_default_error_handler() {
        let mut app = App::new();
        app.use_handler(|_resp: &mut ResponseWriter, _ctx: &mut Context| -> HandlerResult {
            Err(PorticoError::bad_request("malformed").into())
        });

        let response = app.handle(Request::builder().build());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(std::str::from_utf8(response.body())
            .unwrap()
            .contains("malformed"));
    }

    #[test]
    fn test_rebinding_replaces_default_service() {
        let mut app = App::new();
        app.map(Arc::new(NotFoundHandler::new(|resp, _request| {
            resp.write_status(StatusCode::GONE);
            resp.write(b"gone");
        })));

        let response = app.handle(Request::builder().build());
        assert_eq!(response.status(), StatusCode::GONE);
    }
}
