//! Route resolution seam.
//!
//! The application does not route by itself. It asks whatever implements
//! [`Router`] for the handler chain matching a request, then appends that
//! chain after its own registered handlers. The default binding is
//! [`NullRouter`], which matches nothing, so a bare application answers
//! every request with its not-found service.

use http::Method;
use portico_core::Handler;

/// Resolves a request line to a handler chain.
///
/// Bound into the global injector under the `dyn Router` identity.
/// Implementations are pure lookups: the dispatch core walks whatever
/// chain they return.
pub trait Router: Send + Sync {
    /// Returns the handler chain for the given method and path, or
    /// `None` when no route matches.
    fn resolve(&self, method: &Method, path: &str) -> Option<Vec<Handler>>;
}

/// Router that matches nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRouter;

impl Router for NullRouter {
    fn resolve(&self, _method: &Method, _path: &str) -> Option<Vec<Handler>> {
        None
    }
}
