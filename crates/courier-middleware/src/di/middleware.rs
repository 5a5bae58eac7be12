use std::sync::Arc;

use async_trait::async_trait;
use courier_core::{ErasedRequest, Extras, MediatorResult, Middleware, Next, Response};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::container::Container;
use super::scope::{DiScope, DiValues};

/// The extras keys [`DiMiddleware`] reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiKeys {
    /// A [`DiScope`] to reuse instead of entering a fresh one.
    pub scope: String,
    /// [`DiValues`] seeded into the scope.
    pub values: String,
    /// A [`Container`] replacing the middleware's own for this call.
    pub container: String,
}

impl Default for DiKeys {
    fn default() -> Self {
        Self {
            scope: "di_scope".to_owned(),
            values: "di_values".to_owned(),
            container: "di_container".to_owned(),
        }
    }
}

/// Builds factory handlers through a DI scope.
///
/// For each call the middleware takes its [`DiKeys`] out of the extras, picks
/// a scope (the one provided under `scope`, or a fresh one entered on the
/// provided or own container), layers the provided values on top and installs
/// it as the resolver of the rest of the chain. The scope is put back under the
/// `scope` key so closure handlers can reach it with [`DiScope::from_extras`].
///
/// Place it last in the chain so outer middlewares see the caller's extras.
#[derive(Debug, Clone)]
pub struct DiMiddleware {
    container: Container,
    keys: DiKeys,
}

impl DiMiddleware {
    /// Creates a middleware entering scopes on `container`, with default keys.
    pub fn new(container: Container) -> Self {
        Self {
            container,
            keys: DiKeys::default(),
        }
    }

    /// Replaces the extras keys (builder pattern).
    pub fn with_keys(mut self, keys: DiKeys) -> Self {
        self.keys = keys;
        self
    }

    /// The extras keys this middleware reads.
    pub fn keys(&self) -> &DiKeys {
        &self.keys
    }

    /// The fallback container used when the call extras carry none.
    pub fn container(&self) -> &Container {
        &self.container
    }

    fn take<T: Clone + Send + Sync + 'static>(extras: &mut Extras, key: &str) -> Option<T> {
        extras
            .remove(key)
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| T::clone(&value))
    }
}

#[async_trait]
impl Middleware for DiMiddleware {
    async fn call(
        &self,
        request: ErasedRequest,
        mut extras: Extras,
        next: Next,
    ) -> MediatorResult<Response> {
        let provided_scope = Self::take::<DiScope>(&mut extras, &self.keys.scope);
        let values = Self::take::<DiValues>(&mut extras, &self.keys.values).unwrap_or_default();
        let container = Self::take::<Container>(&mut extras, &self.keys.container);

        let scope = match provided_scope {
            Some(scope) => scope.with_values(&values),
            None => container
                .as_ref()
                .unwrap_or(&self.container)
                .enter_scope_with(values),
        };
        trace!(
            handler = next.handler().type_name(),
            factory = next.handler().is_factory(),
            "Resolving handler through DI scope"
        );

        extras.insert(self.keys.scope.clone(), scope.clone());
        next.with_resolver(Arc::new(scope)).run(request, extras).await
    }
}
