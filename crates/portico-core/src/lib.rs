//! Dispatch core: type-keyed dependency injection and the handler chain.
//!
//! This crate holds the pieces the `portico` facade assembles into an
//! application. Services live in an [`Injector`] keyed by type identity,
//! handlers are classified once at registration into a fixed invocation
//! shape, and a [`Context`] walks the handler chain one step per
//! [`Context::next`] call. A handler that responds without calling
//! `next` short-circuits everything behind it.
//!
//! # Example
//!
//! ```
//! use portico_core::{Context, Handler, HandlerResult, Injector, Request, ResponseWriter};
//! use std::sync::Arc;
//!
//! let mut injector = Injector::new();
//! injector.map(Arc::new(String::from("hello")));
//!
//! let chain: Vec<Handler> = vec![Handler::new(
//!     |resp: &mut ResponseWriter, _ctx: &mut Context| -> HandlerResult {
//!         resp.write(b"hello");
//!         Ok(())
//!     },
//! )];
//!
//! let request = Request::builder().build();
//! let mut ctx = Context::new(Arc::new(injector), Arc::from(chain), request);
//! let mut resp = ResponseWriter::new();
//! ctx.next(&mut resp).unwrap();
//! assert_eq!(resp.body(), b"hello");
//! ```

#![doc(html_root_url = "https://docs.rs/portico-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod di;
pub mod error;
pub mod handler;
pub mod request;
pub mod response;
pub mod service;

pub use context::{Context, RequestId};
pub use di::{FromInjector, Inject, InjectAs, Injector};
pub use error::{
    DispatchError, ErrorCategory, ErrorDetail, ErrorEnvelope, HandlerResult, PorticoError,
    ResolveError,
};
pub use handler::{shape, Gate, Handler, IntoHandler, Shape};
pub use request::{Request, RequestBuilder};
pub use response::ResponseWriter;
pub use service::{Env, ErrorHandler, Logger, NotFoundHandler, PlainRender, Render};
