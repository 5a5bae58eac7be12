//! Service container.
//!
//! A [`Container`] maps service types to providers. Each provider has a
//! [`Lifetime`]:
//!
//! - `Singleton` – built once per container, shared by every scope
//! - `Scoped` – built once per [`DiScope`]
//! - `Transient` – built on every resolution
//!
//! Providers receive a [`Resolver`] so they can pull their own dependencies.
//!
//! ```rust,ignore
//! let container = Container::builder()
//!     .instance(Settings::default())
//!     .singleton(|r| Ok(Pool::new(r.resolve::<Settings>()?)))
//!     .scoped(|r| Ok(UnitOfWork::new(r.resolve::<Pool>()?)))
//!     .build();
//!
//! let scope = container.enter_scope();
//! let uow = scope.resolve::<UnitOfWork>()?;
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use courier_core::{ResolveError, Resolver};
use parking_lot::Mutex;
use tracing::trace;

use super::scope::{DiScope, DiValues};

pub(crate) type Service = Arc<dyn Any + Send + Sync>;

type ProviderFn = dyn Fn(&dyn Resolver) -> Result<Service, ResolveError> + Send + Sync;

/// How long a resolved service lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// One instance per container.
    Singleton,
    /// One instance per scope.
    Scoped,
    /// A new instance on every resolution.
    Transient,
}

#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) lifetime: Lifetime,
    pub(crate) type_name: &'static str,
    provider: Arc<ProviderFn>,
}

impl Registration {
    pub(crate) fn provide(&self, resolver: &dyn Resolver) -> Result<Service, ResolveError> {
        (self.provider)(resolver)
    }
}

/// Collects service registrations. See [`Container::builder`].
#[derive(Default)]
pub struct ContainerBuilder {
    registrations: HashMap<TypeId, Registration>,
    instances: HashMap<TypeId, Service>,
}

impl ContainerBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn register<T, F>(mut self, lifetime: Lifetime, provider: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Resolver) -> Result<T, ResolveError> + Send + Sync + 'static,
    {
        let provider =
            move |resolver: &dyn Resolver| provider(resolver).map(|value| Arc::new(value) as Service);
        self.instances.remove(&TypeId::of::<T>());
        self.registrations.insert(
            TypeId::of::<T>(),
            Registration {
                lifetime,
                type_name: std::any::type_name::<T>(),
                provider: Arc::new(provider),
            },
        );
        self
    }

    /// Registers a ready-made singleton.
    pub fn instance<T: Any + Send + Sync>(mut self, value: T) -> Self {
        let type_id = TypeId::of::<T>();
        let service: Service = Arc::new(value);
        let shared = Arc::clone(&service);
        let provider = move |_: &dyn Resolver| -> Result<Service, ResolveError> {
            Ok(Arc::clone(&shared))
        };
        self.registrations.insert(
            type_id,
            Registration {
                lifetime: Lifetime::Singleton,
                type_name: std::any::type_name::<T>(),
                provider: Arc::new(provider),
            },
        );
        self.instances.insert(type_id, service);
        self
    }

    /// Registers a service built once per container.
    pub fn singleton<T, F>(self, provider: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Resolver) -> Result<T, ResolveError> + Send + Sync + 'static,
    {
        self.register(Lifetime::Singleton, provider)
    }

    /// Registers a service built once per scope.
    pub fn scoped<T, F>(self, provider: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Resolver) -> Result<T, ResolveError> + Send + Sync + 'static,
    {
        self.register(Lifetime::Scoped, provider)
    }

    /// Registers a service built on every resolution.
    pub fn transient<T, F>(self, provider: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Resolver) -> Result<T, ResolveError> + Send + Sync + 'static,
    {
        self.register(Lifetime::Transient, provider)
    }

    /// Finishes the container.
    pub fn build(self) -> Container {
        trace!(services = self.registrations.len(), "Building DI container");
        Container {
            inner: Arc::new(ContainerInner {
                registrations: self.registrations,
                singletons: Mutex::new(self.instances),
            }),
        }
    }
}

struct ContainerInner {
    registrations: HashMap<TypeId, Registration>,
    singletons: Mutex<HashMap<TypeId, Service>>,
}

/// A shared set of service providers.
///
/// Cloning is cheap and clones share singletons.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Default for Container {
    fn default() -> Self {
        ContainerBuilder::new().build()
    }
}

impl Container {
    /// Starts a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Opens a new scope.
    pub fn enter_scope(&self) -> DiScope {
        DiScope::new(self.clone(), DiValues::new())
    }

    /// Opens a new scope seeded with `values`.
    pub fn enter_scope_with(&self, values: DiValues) -> DiScope {
        DiScope::new(self.clone(), values)
    }

    /// Returns `true` if a provider for `T` is registered.
    pub fn contains<T: Any>(&self) -> bool {
        self.inner.registrations.contains_key(&TypeId::of::<T>())
    }

    /// Returns the lifetime `T` is registered with.
    pub fn lifetime_of<T: Any>(&self) -> Option<Lifetime> {
        self.inner
            .registrations
            .get(&TypeId::of::<T>())
            .map(|registration| registration.lifetime)
    }

    /// Returns the number of registered services.
    pub fn len(&self) -> usize {
        self.inner.registrations.len()
    }

    /// Returns `true` if no service is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.registrations.is_empty()
    }

    pub(crate) fn registration(&self, type_id: TypeId) -> Option<&Registration> {
        self.inner.registrations.get(&type_id)
    }

    /// Returns the container-wide instance, building it through `resolver` on first use.
    pub(crate) fn singleton(
        &self,
        type_id: TypeId,
        registration: &Registration,
        resolver: &dyn Resolver,
    ) -> Result<Service, ResolveError> {
        if let Some(service) = self.inner.singletons.lock().get(&type_id) {
            return Ok(Arc::clone(service));
        }

        // Built outside the lock: the provider may resolve other singletons.
        let service = registration.provide(resolver)?;
        trace!(service = registration.type_name, "Singleton built");
        Ok(Arc::clone(
            self.inner
                .singletons
                .lock()
                .entry(type_id)
                .or_insert(service),
        ))
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut services: Vec<_> = self
            .inner
            .registrations
            .values()
            .map(|registration| (registration.type_name, registration.lifetime))
            .collect();
        services.sort_by_key(|(name, _)| *name);
        f.debug_struct("Container").field("services", &services).finish()
    }
}
