//! Handler shapes and the invocation protocol.
//!
//! Every chain handler is classified at registration time into one of a
//! closed set of shapes. The three fast-path shapes are invoked through
//! direct typed calls with positionally supplied arguments; the single
//! generic shape additionally resolves its declared trailing parameters
//! from the active injector by type identity. There is no open-ended
//! runtime type probing beyond that one injector lookup per parameter.
//!
//! Classification is driven by [`IntoHandler`], implemented per shape with
//! a marker type parameter so the compiler picks the shape from the
//! closure's declared signature. Anything that is not a callable with one
//! of the known signatures simply does not implement the trait, which
//! makes malformed-handler registration a compile error rather than a
//! startup fault.
//!
//! # Example
//!
//! ```rust
//! use portico_core::{Context, Handler, HandlerResult, ResponseWriter, Shape};
//!
//! let handler = Handler::new(|resp: &mut ResponseWriter, ctx: &mut Context| {
//!     resp.write(b"hello");
//!     ctx.next(resp)
//! });
//! assert_eq!(handler.shape(), Shape::WriterContext);
//! ```

use crate::context::Context;
use crate::di::FromInjector;
use crate::error::{DispatchError, HandlerResult, PorticoError, ResolveError};
use crate::request::Request;
use crate::response::ResponseWriter;
use std::fmt;
use std::sync::Arc;

type WriterContextFn =
    dyn Fn(&mut ResponseWriter, &mut Context) -> HandlerResult + Send + Sync;
type WriterRequestFn = dyn Fn(&mut ResponseWriter, &Request) -> HandlerResult + Send + Sync;
type WriterErrorFn =
    dyn Fn(&mut ResponseWriter, &PorticoError) -> HandlerResult + Send + Sync;
type InjectedFn = dyn Fn(&mut ResponseWriter, &mut Context) -> HandlerResult + Send + Sync;

/// The invocation strategy a handler was classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Fast path: response writer plus mutable dispatch context.
    WriterContext,
    /// Fast path: response writer plus incoming request.
    WriterRequest,
    /// Fast path: response writer plus in-flight error value.
    WriterError,
    /// Generic path: writer and context positionally, then declared
    /// parameters resolved from the injector.
    Injected,
}

impl Shape {
    /// Returns the shape name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::WriterContext => "writer_context",
            Self::WriterRequest => "writer_request",
            Self::WriterError => "writer_error",
            Self::Injected => "injected",
        }
    }
}

#[derive(Clone)]
enum Strategy {
    WriterContext(Arc<WriterContextFn>),
    WriterRequest(Arc<WriterRequestFn>),
    WriterError(Arc<WriterErrorFn>),
    Injected(Arc<InjectedFn>),
}

/// A validated, classified chain handler.
///
/// Handlers are cheap to clone (the callable is shared) and immutable once
/// registered; the chain they belong to never changes after a request
/// begins.
#[derive(Clone)]
pub struct Handler {
    strategy: Strategy,
}

impl Handler {
    /// Wraps and classifies a callable into a chain handler.
    pub fn new<M>(handler: impl IntoHandler<M>) -> Self {
        handler.into_handler()
    }

    /// Returns the shape this handler was classified into.
    #[must_use]
    pub fn shape(&self) -> Shape {
        match &self.strategy {
            Strategy::WriterContext(_) => Shape::WriterContext,
            Strategy::WriterRequest(_) => Shape::WriterRequest,
            Strategy::WriterError(_) => Shape::WriterError,
            Strategy::Injected(_) => Shape::Injected,
        }
    }

    /// Invokes the handler against the active request.
    ///
    /// Called only by the chain walk; each handler runs at most once per
    /// request.
    pub(crate) fn invoke(
        &self,
        resp: &mut ResponseWriter,
        ctx: &mut Context,
    ) -> HandlerResult {
        match &self.strategy {
            Strategy::WriterContext(f) => f(resp, ctx),
            Strategy::WriterRequest(f) => f(resp, ctx.request()),
            Strategy::WriterError(f) => match ctx.error() {
                Some(error) => f(resp, error),
                // Error-shaped handlers declare an error value; with no
                // error in flight that dependency is unresolvable.
                None => Err(DispatchError::Unresolved(ResolveError::custom::<
                    PorticoError,
                >(
                    "no error value in flight"
                ))),
            },
            Strategy::Injected(f) => f(resp, ctx),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("shape", &self.shape())
            .finish()
    }
}

/// A gate handler, run before routing.
///
/// Returns `true` to stop all further request processing, including the
/// main chain and the routing collaborator.
pub type Gate = Arc<dyn Fn(&mut ResponseWriter, &Request) -> bool + Send + Sync>;

/// Conversion of a callable into a classified [`Handler`].
///
/// The marker parameter `M` is one of the types in [`shape`] and exists
/// only to keep the per-shape blanket implementations coherent; callers
/// never name it.
pub trait IntoHandler<M> {
    /// Wraps the callable, classifying it by its declared signature.
    fn into_handler(self) -> Handler;
}

/// Marker types for [`IntoHandler`] shape selection.
pub mod shape {
    use std::marker::PhantomData;

    /// Marker for values that already are a [`Handler`](super::Handler).
    pub struct Ready;
    /// Marker for the writer + context fast path.
    pub struct WriterContext;
    /// Marker for the writer + request fast path.
    pub struct WriterRequest;
    /// Marker for the writer + error fast path.
    pub struct WriterError;
    /// Marker for the generic injected path.
    pub struct Injected<A>(PhantomData<A>);
}

impl IntoHandler<shape::Ready> for Handler {
    fn into_handler(self) -> Handler {
        self
    }
}

impl<F> IntoHandler<shape::WriterContext> for F
where
    F: Fn(&mut ResponseWriter, &mut Context) -> HandlerResult + Send + Sync + 'static,
{
    fn into_handler(self) -> Handler {
        Handler {
            strategy: Strategy::WriterContext(Arc::new(self)),
        }
    }
}

impl<F> IntoHandler<shape::WriterRequest> for F
where
    F: Fn(&mut ResponseWriter, &Request) -> HandlerResult + Send + Sync + 'static,
{
    fn into_handler(self) -> Handler {
        Handler {
            strategy: Strategy::WriterRequest(Arc::new(self)),
        }
    }
}

impl<F> IntoHandler<shape::WriterError> for F
where
    F: Fn(&mut ResponseWriter, &PorticoError) -> HandlerResult + Send + Sync + 'static,
{
    fn into_handler(self) -> Handler {
        Handler {
            strategy: Strategy::WriterError(Arc::new(self)),
        }
    }
}

macro_rules! impl_injected_handler {
    ($($param:ident),+) => {
        impl<F, $($param,)+> IntoHandler<shape::Injected<($($param,)+)>> for F
        where
            F: Fn(&mut ResponseWriter, &mut Context, $($param),+) -> HandlerResult
                + Send
                + Sync
                + 'static,
            $($param: FromInjector + 'static,)+
        {
            fn into_handler(self) -> Handler {
                let invoke = move |resp: &mut ResponseWriter, ctx: &mut Context| -> HandlerResult {
                    $(
                        #[allow(non_snake_case)]
                        let $param = <$param as FromInjector>::from_injector(ctx.injector())?;
                    )+
                    (self)(resp, ctx, $($param),+)
                };
                Handler {
                    strategy: Strategy::Injected(Arc::new(invoke)),
                }
            }
        }
    };
}

impl_injected_handler!(A1);
impl_injected_handler!(A1, A2);
impl_injected_handler!(A1, A2, A3);
impl_injected_handler!(A1, A2, A3, A4);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::{Inject, Injector};
    use crate::error::DispatchError;

    fn empty_context() -> Context {
        Context::new(
            Arc::new(Injector::new()),
            Arc::from(Vec::<Handler>::new()),
            Request::builder().build(),
        )
    }

    #[test]
    fn test_writer_context_classification() {
        let handler = Handler::new(|resp: &mut ResponseWriter, _ctx: &mut Context| {
            resp.write(b"ok");
            Ok(())
        });
        assert_eq!(handler.shape(), Shape::WriterContext);
    }

    #[test]
    fn test_writer_request_classification() {
        let handler = Handler::new(|resp: &mut ResponseWriter, req: &Request| {
            resp.write(req.path().as_bytes());
            Ok(())
        });
        assert_eq!(handler.shape(), Shape::WriterRequest);
    }

    #[test]
    fn test_writer_error_classification() {
        let handler = Handler::new(|resp: &mut ResponseWriter, err: &PorticoError| {
            resp.write(err.to_string().as_bytes());
            Ok(())
        });
        assert_eq!(handler.shape(), Shape::WriterError);
    }

    #[test]
    fn test_injected_classification() {
        let handler = Handler::new(
            |resp: &mut ResponseWriter, _ctx: &mut Context, value: Inject<String>| {
                resp.write(value.as_bytes());
                Ok(())
            },
        );
        assert_eq!(handler.shape(), Shape::Injected);
    }

    #[test]
    fn test_writer_request_invocation() {
        let handler = Handler::new(|resp: &mut ResponseWriter, req: &Request| {
            resp.write(req.path().as_bytes());
            Ok(())
        });

        let mut ctx = empty_context();
        let mut resp = ResponseWriter::new();
        handler.invoke(&mut resp, &mut ctx).unwrap();
        assert_eq!(resp.body(), b"/");
    }

    #[test]
    fn test_writer_error_without_error_in_flight_fails() {
        let handler = Handler::new(|_resp: &mut ResponseWriter, _err: &PorticoError| Ok(()));

        let mut ctx = empty_context();
        let mut resp = ResponseWriter::new();
        let result = handler.invoke(&mut resp, &mut ctx);
        assert!(matches!(result, Err(DispatchError::Unresolved(_))));
    }

    #[test]
    fn test_injected_resolves_bound_service() {
        let mut global = Injector::new();
        global.map(Arc::new("service value".to_string()));

        let mut ctx = Context::new(
            Arc::new(global),
            Arc::from(Vec::<Handler>::new()),
            Request::builder().build(),
        );

        let handler = Handler::new(
            |resp: &mut ResponseWriter, _ctx: &mut Context, value: Inject<String>| {
                resp.write(value.as_bytes());
                Ok(())
            },
        );

        let mut resp = ResponseWriter::new();
        handler.invoke(&mut resp, &mut ctx).unwrap();
        assert_eq!(resp.body(), b"service value");
    }

    #[test]
    fn test_injected_unbound_dependency_is_fatal() {
        struct Unbound;

        let handler = Handler::new(
            |_resp: &mut ResponseWriter, _ctx: &mut Context, _svc: Inject<Unbound>| Ok(()),
        );

        let mut ctx = empty_context();
        let mut resp = ResponseWriter::new();
        let result = handler.invoke(&mut resp, &mut ctx);
        assert!(matches!(result, Err(DispatchError::Unresolved(_))));
        // The handler body never ran.
        assert!(!resp.written());
    }
}
