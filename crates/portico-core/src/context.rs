//! Per-request dispatch context and chain walk.
//!
//! A [`Context`] is created when a request arrives and discarded when the
//! response completes. It composes a child injector (parent = the
//! application's global injector), the active handler chain, and the
//! chain-position tracker. The response writer travels *alongside* the
//! context through [`Context::next`] rather than inside it, so fast-path
//! handlers can hold `&mut` to both at once.
//!
//! Handlers drive the onion explicitly: code before `ctx.next(resp)` runs
//! on the way in, code after runs on the way out, and omitting the call
//! short-circuits every remaining handler.

use crate::di::Injector;
use crate::error::{HandlerResult, PorticoError};
use crate::handler::Handler;
use crate::request::Request;
use crate::response::ResponseWriter;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it ideal for request tracking
/// and log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-request dispatch context.
///
/// Request-exclusive by construction: never shared across requests nor
/// touched by more than the worker handling the request, so it carries no
/// locks. The child injector is pre-seeded with `Arc<Request>` and
/// `Arc<RequestId>` so generic handlers can declare them as dependencies.
pub struct Context {
    injector: Injector,
    chain: Arc<[Handler]>,
    index: usize,
    request: Arc<Request>,
    request_id: RequestId,
    data: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    error: Option<PorticoError>,
}

impl Context {
    /// Creates the context for one request.
    ///
    /// `global` is the application's injector; the context's own injector
    /// is a fresh child delegating to it.
    #[must_use]
    pub fn new(global: Arc<Injector>, chain: Arc<[Handler]>, request: Request) -> Self {
        let request = Arc::new(request);
        let request_id = RequestId::new();

        let mut injector = Injector::with_parent(global);
        injector.map(Arc::clone(&request));
        injector.map(Arc::new(request_id));

        Self {
            injector,
            chain,
            index: 0,
            request,
            request_id,
            data: HashMap::new(),
            error: None,
        }
    }

    /// Returns the request-scoped injector.
    #[must_use]
    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    /// Returns the request-scoped injector for additional per-request
    /// bindings.
    pub fn injector_mut(&mut self) -> &mut Injector {
        &mut self.injector
    }

    /// Returns the incoming request.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Returns a shared handle to the incoming request.
    #[must_use]
    pub fn request_arc(&self) -> Arc<Request> {
        Arc::clone(&self.request)
    }

    /// Returns this request's ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Invokes the next handler in the chain, if any.
    ///
    /// Advances the chain index first, so a handler can never run twice
    /// and the index never revisits a lower position. Returns `Ok(())`
    /// when the chain is exhausted.
    pub fn next(&mut self, resp: &mut ResponseWriter) -> HandlerResult {
        let Some(handler) = self.chain.get(self.index).cloned() else {
            return Ok(());
        };
        self.index += 1;
        tracing::trace!(
            request_id = %self.request_id,
            index = self.index - 1,
            shape = handler.shape().name(),
            "invoking handler"
        );
        handler.invoke(resp, self)
    }

    /// Returns how many handlers remain after the current position.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.chain.len() - self.index
    }

    /// Stores a typed value in the per-request data store.
    ///
    /// One value per type; a later store replaces the earlier one.
    pub fn set_data<T: Send + Sync + 'static>(&mut self, value: T) {
        self.data.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed value from the per-request data store.
    #[must_use]
    pub fn data<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.data
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Returns the error currently in flight, if any.
    #[must_use]
    pub fn error(&self) -> Option<&PorticoError> {
        self.error.as_ref()
    }

    /// Places an error in flight for error-shaped handlers downstream.
    pub fn set_error(&mut self, error: PorticoError) {
        self.error = Some(error);
    }

    /// Takes the in-flight error, leaving none.
    pub fn take_error(&mut self) -> Option<PorticoError> {
        self.error.take()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("request_id", &self.request_id)
            .field("index", &self.index)
            .field("chain_len", &self.chain.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn context_with_chain(chain: Vec<Handler>) -> Context {
        Context::new(
            Arc::new(Injector::new()),
            Arc::from(chain),
            Request::builder().build(),
        )
    }

    #[test]
    fn test_request_id_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn test_next_on_empty_chain_is_ok() {
        let mut ctx = context_with_chain(Vec::new());
        let mut resp = ResponseWriter::new();
        assert!(ctx.next(&mut resp).is_ok());
        assert!(!resp.written());
    }

    #[test]
    fn test_onion_ordering() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let o1 = Arc::clone(&order);
        let outer = Handler::new(move |resp: &mut ResponseWriter, ctx: &mut Context| {
            o1.lock().unwrap().push("outer-in");
            ctx.next(resp)?;
            o1.lock().unwrap().push("outer-out");
            Ok(())
        });

        let o2 = Arc::clone(&order);
        let inner = Handler::new(move |_resp: &mut ResponseWriter, _ctx: &mut Context| {
            o2.lock().unwrap().push("inner");
            Ok(())
        });

        let mut ctx = context_with_chain(vec![outer, inner]);
        let mut resp = ResponseWriter::new();
        ctx.next(&mut resp).unwrap();

        let recorded = order.lock().unwrap();
        assert_eq!(*recorded, vec!["outer-in", "inner", "outer-out"]);
    }

    #[test]
    fn test_short_circuit_skips_remaining() {
        let calls = Arc::new(AtomicUsize::new(0));

        let first = Handler::new(|resp: &mut ResponseWriter, _ctx: &mut Context| {
            // Deliberately never calls next.
            resp.write(b"x");
            Ok(())
        });

        let c = Arc::clone(&calls);
        let second = Handler::new(move |resp: &mut ResponseWriter, _ctx: &mut Context| {
            c.fetch_add(1, Ordering::SeqCst);
            resp.write(b"y");
            Ok(())
        });

        let mut ctx = context_with_chain(vec![first, second]);
        let mut resp = ResponseWriter::new();
        ctx.next(&mut resp).unwrap();

        assert_eq!(resp.body(), b"x");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(ctx.remaining(), 1);
    }

    #[test]
    fn test_handler_error_stops_walk() {
        let reached = Arc::new(AtomicUsize::new(0));

        let failing = Handler::new(|_resp: &mut ResponseWriter, _ctx: &mut Context| {
            Err(DispatchError::Handler(PorticoError::bad_request("nope")))
        });

        let r = Arc::clone(&reached);
        let after = Handler::new(move |_resp: &mut ResponseWriter, _ctx: &mut Context| {
            r.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let mut ctx = context_with_chain(vec![failing, after]);
        let mut resp = ResponseWriter::new();
        assert!(ctx.next(&mut resp).is_err());
        assert_eq!(reached.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_child_injector_seeded_with_request() {
        let ctx = context_with_chain(Vec::new());
        let request = ctx.injector().get::<Request>().unwrap();
        assert_eq!(request.path(), "/");
        let id = ctx.injector().get::<RequestId>().unwrap();
        assert_eq!(*id, ctx.request_id());
    }

    #[test]
    fn test_data_store_round_trip() {
        struct Marker(u32);

        let mut ctx = context_with_chain(Vec::new());
        assert!(ctx.data::<Marker>().is_none());

        ctx.set_data(Marker(7));
        assert_eq!(ctx.data::<Marker>().unwrap().0, 7);

        ctx.set_data(Marker(9));
        assert_eq!(ctx.data::<Marker>().unwrap().0, 9);
    }

    #[test]
    fn test_error_in_flight() {
        let mut ctx = context_with_chain(Vec::new());
        assert!(ctx.error().is_none());

        ctx.set_error(PorticoError::timeout("late"));
        assert!(ctx.error().is_some());
        assert!(ctx.take_error().is_some());
        assert!(ctx.error().is_none());
    }
}
