//! Layered, type-keyed service injector.
//!
//! The [`Injector`] is a registry of services keyed by type identity with
//! optional parent delegation: a lookup that misses locally walks up the
//! parent chain before failing. The composing application owns one global
//! injector, frozen once traffic starts; each request gets a fresh child
//! injector layered on top, so request-time reads never need a lock.
//!
//! # Example
//!
//! ```rust
//! use portico_core::Injector;
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! let mut global = Injector::new();
//! global.map(Arc::new(Database {
//!     url: "postgres://localhost/app".to_string(),
//! }));
//!
//! // Per-request child delegates to the global registry.
//! let child = Injector::with_parent(Arc::new(global));
//! let db: Arc<Database> = child.get().unwrap();
//! assert_eq!(db.url, "postgres://localhost/app");
//! ```

use crate::error::ResolveError;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A layered, type-keyed service registry with parent delegation.
///
/// Services are bound under a type identity: either their own concrete
/// type via [`Injector::map`], or an explicitly chosen trait-object
/// identity via [`Injector::map_as`]. A later binding under the same
/// identity replaces the earlier one in that injector only; parents are
/// never mutated through children.
///
/// # Cycles
///
/// Parent delegation is a caller-discipline invariant: the injector does
/// not detect cycles formed through [`Injector::set_parent`]. Forming one
/// makes lookups recurse forever.
///
/// # Thread Safety
///
/// The injector is `Send + Sync`; services must be `Arc<T>` where
/// `T: Send + Sync`. Mutation is only valid before the owning application
/// starts serving, which the composing layer enforces structurally by
/// sharing the injector as `Arc<Injector>` at request time.
#[derive(Default, Clone)]
pub struct Injector {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    parent: Option<Arc<Injector>>,
}

impl Injector {
    /// Creates a new empty injector with no parent.
    #[must_use]
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
            parent: None,
        }
    }

    /// Creates an empty injector delegating to `parent` on lookup miss.
    #[must_use]
    pub fn with_parent(parent: Arc<Injector>) -> Self {
        Self {
            services: HashMap::new(),
            parent: Some(parent),
        }
    }

    /// Sets the delegation target for lookup misses.
    ///
    /// Cycle formation is not detected; see the type-level docs.
    pub fn set_parent(&mut self, parent: Arc<Injector>) {
        self.parent = Some(parent);
    }

    /// Returns the parent injector, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<Injector>> {
        self.parent.as_ref()
    }

    /// Binds a service under its own concrete type identity.
    ///
    /// Overwrites any existing binding under that identity in this
    /// injector (last write wins); parent bindings are untouched.
    pub fn map<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        self.services.insert(TypeId::of::<T>(), service);
    }

    /// Binds a service under an explicitly chosen identity.
    ///
    /// This is how a concrete implementation is bound under an abstract
    /// capability, e.g. `map_as::<dyn Render>(Arc::new(PlainRender))`.
    /// Resolution goes through [`Injector::get_as`] with the same identity.
    pub fn map_as<I: ?Sized + Send + Sync + 'static>(&mut self, service: Arc<I>) {
        self.services.insert(TypeId::of::<I>(), Arc::new(service));
    }

    /// Resolves a service bound under its concrete type identity.
    ///
    /// On local miss, delegates to the parent chain; fails with
    /// [`ResolveError`] once the chain is exhausted.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveError> {
        self.lookup(TypeId::of::<T>())
            .and_then(|service| service.clone().downcast::<T>().ok())
            .ok_or_else(ResolveError::unresolved::<T>)
    }

    /// Resolves a service bound under an explicitly chosen identity.
    pub fn get_as<I: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<I>, ResolveError> {
        self.lookup(TypeId::of::<I>())
            .and_then(|service| service.downcast_ref::<Arc<I>>())
            .cloned()
            .ok_or_else(ResolveError::unresolved::<I>)
    }

    /// Checks whether a concrete type identity resolves anywhere in the chain.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.lookup(TypeId::of::<T>()).is_some()
    }

    /// Checks whether an explicit identity resolves anywhere in the chain.
    #[must_use]
    pub fn contains_as<I: ?Sized + Send + Sync + 'static>(&self) -> bool {
        self.lookup(TypeId::of::<I>()).is_some()
    }

    /// Returns the number of local bindings (parents excluded).
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if this injector has no local bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    fn lookup(&self, key: TypeId) -> Option<&Arc<dyn Any + Send + Sync>> {
        match self.services.get(&key) {
            Some(service) => Some(service),
            None => self.parent.as_deref().and_then(|parent| parent.lookup(key)),
        }
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("binding_count", &self.services.len())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// A wrapper for dependencies resolved by concrete type identity.
///
/// `Inject<T>` is the declared-parameter form used by generic handlers:
/// the invocation protocol resolves `T` from the active injector chain
/// before the handler body runs.
///
/// # Example
///
/// ```rust,ignore
/// app.use_handler(|resp: &mut ResponseWriter, ctx: &mut Context, db: Inject<Database>| {
///     resp.write(db.url.as_bytes());
///     Ok(())
/// });
/// ```
#[derive(Clone)]
pub struct Inject<T>(pub Arc<T>);

impl<T> Inject<T> {
    /// Returns a reference to the inner service.
    pub fn inner(&self) -> &T {
        &self.0
    }

    /// Converts into the inner `Arc`.
    pub fn into_inner(self) -> Arc<T> {
        self.0
    }
}

impl<T> std::ops::Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Inject").field(&self.0).finish()
    }
}

/// A wrapper for dependencies resolved by an explicit (trait-object) identity.
///
/// The counterpart of [`Inject`] for services bound with
/// [`Injector::map_as`], e.g. `InjectAs<dyn Render>`.
#[derive(Clone)]
pub struct InjectAs<I: ?Sized>(pub Arc<I>);

impl<I: ?Sized> InjectAs<I> {
    /// Converts into the inner `Arc`.
    pub fn into_inner(self) -> Arc<I> {
        self.0
    }
}

impl<I: ?Sized> std::ops::Deref for InjectAs<I> {
    type Target = I;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Trait for declared handler parameters resolvable from an injector.
///
/// The generic invocation strategy calls this for every declared parameter
/// in order; any failure aborts the request's dispatch.
pub trait FromInjector: Sized {
    /// Resolves the parameter from the active injector chain.
    fn from_injector(injector: &Injector) -> Result<Self, ResolveError>;
}

impl<T: Send + Sync + 'static> FromInjector for Inject<T> {
    fn from_injector(injector: &Injector) -> Result<Self, ResolveError> {
        injector.get::<T>().map(Inject)
    }
}

impl<I: ?Sized + Send + Sync + 'static> FromInjector for InjectAs<I> {
    fn from_injector(injector: &Injector) -> Result<Self, ResolveError> {
        injector.get_as::<I>().map(InjectAs)
    }
}
