//! # Portico
//!
//! **Modular web application framework built around type-keyed injection**
//!
//! Portico dispatches requests through an ordered middleware chain where
//! every handler's dependencies are resolved from a per-request injector:
//!
//! - **Type-keyed services** - bind once, resolve anywhere in the chain
//! - **Shape-classified handlers** - the invocation strategy is fixed at
//!   registration, never guessed per request
//! - **Explicit continuation** - a handler that does not call
//!   [`Context::next`] short-circuits everything behind it
//! - **Swappable collaborators** - not-found, error handling, and
//!   rendering are injector bindings like any other service
//!
//! ## Quick Start
//!
//! ```
//! use portico::prelude::*;
//!
//! let mut app = App::new();
//! app.use_handler(|resp: &mut ResponseWriter, ctx: &mut Context| -> HandlerResult {
//!     let before = resp.size();
//!     ctx.next(resp)?;
//!     tracing::debug!(bytes = resp.size() - before, "handler chain wrote");
//!     Ok(())
//! });
//! app.use_handler(|resp: &mut ResponseWriter, _ctx: &mut Context| -> HandlerResult {
//!     resp.write(b"hello, portico");
//!     Ok(())
//! });
//!
//! let response = app.handle(Request::builder().build());
//! assert_eq!(response.body().as_ref(), b"hello, portico");
//! ```

#![doc(html_root_url = "https://docs.rs/portico/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod app;
pub mod router;

// Re-export core types
pub use portico_core as core;

// Re-export bundled middleware
pub use portico_middleware as middleware;

pub use app::App;
pub use router::{NullRouter, Router};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use portico::prelude::*;
/// ```
pub mod prelude {
    pub use crate::app::App;
    pub use crate::router::{NullRouter, Router};

    pub use portico_core::{
        Context, DispatchError, Env, ErrorHandler, Handler, HandlerResult, Inject, InjectAs,
        Injector, IntoHandler, Logger, NotFoundHandler, PorticoError, Render, Request, RequestId,
        ResponseWriter,
    };

    pub use portico_middleware::{logger, recovery};
}
