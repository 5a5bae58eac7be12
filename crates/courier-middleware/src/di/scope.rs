//! Resolution scopes.
//!
//! A [`DiScope`] is the [`Resolver`] handed to factory handlers. It looks a
//! service up in this order:
//!
//! 1. the seed [`DiValues`] of the scope,
//! 2. the scope cache (scoped services),
//! 3. the container (singletons, or a fresh transient).
//!
//! Clones of a scope share the cache, so a scope bound into a mediator's
//! extras serves the same scoped instances to every dispatch that uses it.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use courier_core::{Extras, ResolveError, Resolver};
use parking_lot::Mutex;
use tracing::trace;

use super::container::{Container, Lifetime, Service};

/// Values injected into a scope for the duration of one or more calls.
#[derive(Clone, Default)]
pub struct DiValues {
    values: Arc<HashMap<TypeId, (&'static str, Service)>>,
}

impl DiValues {
    /// Creates an empty set of values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value (builder pattern).
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Adds a value, replacing any previous value of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        Arc::make_mut(&mut self.values).insert(
            TypeId::of::<T>(),
            (std::any::type_name::<T>(), Arc::new(value)),
        );
    }

    /// Returns `true` if a value of type `T` is present.
    pub fn contains<T: Any>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns `self` overlaid with `other`.
    pub fn merge(&self, other: &DiValues) -> DiValues {
        if other.is_empty() {
            return self.clone();
        }
        let mut merged = self.clone();
        let values = Arc::make_mut(&mut merged.values);
        for (type_id, value) in other.values.iter() {
            values.insert(*type_id, value.clone());
        }
        merged
    }

    fn get(&self, type_id: &TypeId) -> Option<Service> {
        self.values.get(type_id).map(|(_, value)| Arc::clone(value))
    }
}

impl fmt::Debug for DiValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.values.values().map(|(name, _)| name))
            .finish()
    }
}

/// A resolution scope over a [`Container`].
#[derive(Clone)]
pub struct DiScope {
    container: Container,
    values: DiValues,
    cache: Arc<Mutex<HashMap<TypeId, Service>>>,
}

impl DiScope {
    pub(crate) fn new(container: Container, values: DiValues) -> Self {
        trace!(values = values.len(), "Entering DI scope");
        Self {
            container,
            values,
            cache: Arc::default(),
        }
    }

    /// Reads the scope stored under `key` in `extras`.
    ///
    /// [`DiMiddleware`](super::DiMiddleware) stores the active scope there so
    /// closure handlers can resolve services too.
    pub fn from_extras(extras: &Extras, key: &str) -> Option<DiScope> {
        extras.get::<DiScope>(key).cloned()
    }

    /// Returns a scope sharing this one's cache, with `values` layered on top.
    pub fn with_values(&self, values: &DiValues) -> DiScope {
        Self {
            container: self.container.clone(),
            values: self.values.merge(values),
            cache: Arc::clone(&self.cache),
        }
    }

    /// The container this scope was entered from.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// The seed values of this scope.
    pub fn values(&self) -> &DiValues {
        &self.values
    }

    /// Resolves a `T`.
    pub fn resolve<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ResolveError> {
        (self as &dyn Resolver).resolve::<T>()
    }
}

impl Resolver for DiScope {
    fn resolve_any(
        &self,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<Service, ResolveError> {
        if let Some(value) = self.values.get(&type_id) {
            return Ok(value);
        }

        let Some(registration) = self.container.registration(type_id) else {
            return Err(ResolveError::Missing { type_name });
        };

        match registration.lifetime {
            Lifetime::Singleton => self.container.singleton(type_id, registration, self),
            Lifetime::Transient => registration.provide(self),
            Lifetime::Scoped => {
                if let Some(service) = self.cache.lock().get(&type_id) {
                    return Ok(Arc::clone(service));
                }
                let service = registration.provide(self)?;
                trace!(service = type_name, "Scoped service built");
                Ok(Arc::clone(
                    self.cache.lock().entry(type_id).or_insert(service),
                ))
            }
        }
    }
}

impl fmt::Debug for DiScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiScope")
            .field("values", &self.values)
            .field("cached", &self.cache.lock().len())
            .finish()
    }
}
