//! The middleware chain wrapped around every handler invocation.
//!
//! Given middlewares `[m1, m2, ..., mn]` and a terminal handler `h`, a dispatch
//! behaves like `m1(m2(...mn(h)...))`: `m1` runs first on the way in and last
//! on the way out. Each middleware receives the erased request, its own copy
//! of the call extras and a [`Next`] continuation. It may edit the extras,
//! call `next.run(..)` any number of times (usually once) or not at all to
//! short-circuit.
//!
//! The terminal step belongs to [`Next`]: once the chain is exhausted,
//! [`Next::run`] builds factory handlers through the installed resolver
//! ([`EmptyResolver`] if none) and calls the handler. A dispatcher configured
//! without middlewares runs a single pass-through [`DefaultMiddleware`] in
//! front of that step.
//!
//! ```rust,ignore
//! use courier_core::{Middleware, Next, middleware};
//!
//! let adder = middleware::from_fn(|request, extras: Extras, next: Next| async move {
//!     next.run(request, extras.with("additional_data", "value")).await
//! });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::error::MediatorResult;
use crate::extras::Extras;
use crate::handler::{EmptyResolver, HandlerKind, Resolver, Response};
use crate::request::ErasedRequest;

/// A cross-cutting layer around handler invocation.
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    /// Handles the request, usually by forwarding it to `next`.
    async fn call(&self, request: ErasedRequest, extras: Extras, next: Next)
    -> MediatorResult<Response>;
}

/// A shared, type-erased middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The rest of the chain below the current middleware.
#[derive(Clone)]
pub struct Next {
    chain: Arc<[BoxedMiddleware]>,
    position: usize,
    handler: HandlerKind,
    resolver: Option<Arc<dyn Resolver>>,
}

impl Next {
    /// Creates a continuation that runs `chain` from the start, then `handler`.
    pub fn new(chain: Arc<[BoxedMiddleware]>, handler: HandlerKind) -> Self {
        Self {
            chain,
            position: 0,
            handler,
            resolver: None,
        }
    }

    /// Installs the resolver used to build factory handlers below this point.
    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// The terminal handler of the chain.
    pub fn handler(&self) -> &HandlerKind {
        &self.handler
    }

    /// Returns `true` if no middleware is left before the handler.
    pub fn is_terminal(&self) -> bool {
        self.position >= self.chain.len()
    }

    /// Runs the remaining chain.
    pub async fn run(self, request: ErasedRequest, extras: Extras) -> MediatorResult<Response> {
        match self.chain.get(self.position) {
            Some(middleware) => {
                let middleware = Arc::clone(middleware);
                let next = Self {
                    position: self.position + 1,
                    ..self
                };
                middleware.call(request, extras, next).await
            }
            None => {
                let handler = match &self.resolver {
                    Some(resolver) => self.handler.materialize(resolver.as_ref())?,
                    None => self.handler.materialize(&EmptyResolver)?,
                };
                trace!(handler = handler.type_name(), "Invoking handler");
                handler.call(request, extras).await
            }
        }
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("position", &self.position)
            .field("chain_len", &self.chain.len())
            .field("handler", &self.handler)
            .field("has_resolver", &self.resolver.is_some())
            .finish()
    }
}

/// Pass-through middleware used when a dispatcher has no middlewares.
///
/// It only forwards to [`Next`], which owns handler materialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMiddleware;

#[async_trait]
impl Middleware for DefaultMiddleware {
    async fn call(
        &self,
        request: ErasedRequest,
        extras: Extras,
        next: Next,
    ) -> MediatorResult<Response> {
        next.run(request, extras).await
    }
}

/// Returns the chain actually run for `middlewares`.
pub(crate) fn build_chain(middlewares: &Arc<[BoxedMiddleware]>) -> Arc<[BoxedMiddleware]> {
    if middlewares.is_empty() {
        Arc::from(vec![Arc::new(DefaultMiddleware) as BoxedMiddleware])
    } else {
        Arc::clone(middlewares)
    }
}

/// A middleware backed by an async closure. See [`from_fn`].
#[derive(Clone)]
pub struct FnMiddleware<F> {
    f: F,
}

/// Creates a middleware from an async closure.
pub fn from_fn<F, Fut>(f: F) -> FnMiddleware<F>
where
    F: Fn(ErasedRequest, Extras, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MediatorResult<Response>> + Send + 'static,
{
    FnMiddleware { f }
}

#[async_trait]
impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(ErasedRequest, Extras, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MediatorResult<Response>> + Send + 'static,
{
    async fn call(
        &self,
        request: ErasedRequest,
        extras: Extras,
        next: Next,
    ) -> MediatorResult<Response> {
        (self.f)(request, extras, next).await
    }
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Handler;
    use crate::request::{Request, RequestKind, erase};
    use parking_lot::Mutex;

    #[derive(Debug)]
    struct Echo;

    impl Request for Echo {
        type Output = String;
        const KIND: RequestKind = RequestKind::Query;
    }

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Middleware for Recorder {
        async fn call(
            &self,
            request: ErasedRequest,
            extras: Extras,
            next: Next,
        ) -> MediatorResult<Response> {
            self.log.lock().push(format!("{}-before", self.name));
            let response = next.run(request, extras).await;
            self.log.lock().push(format!("{}-after", self.name));
            response
        }
    }

    fn echo_handler(log: Arc<Mutex<Vec<String>>>) -> HandlerKind {
        Handler::<Echo>::from_fn(move |_: Echo, extras: Extras| {
            let log = Arc::clone(&log);
            async move {
                log.lock().push("handler".to_owned());
                Ok(extras.get::<&str>("data").copied().unwrap_or("none").to_owned())
            }
        })
        .into_kind()
    }

    #[tokio::test]
    async fn test_chain_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain: Arc<[BoxedMiddleware]> = Arc::from(vec![
            Arc::new(Recorder {
                name: "A",
                log: Arc::clone(&log),
            }) as BoxedMiddleware,
            Arc::new(Recorder {
                name: "B",
                log: Arc::clone(&log),
            }),
        ]);

        Next::new(chain, echo_handler(Arc::clone(&log)))
            .run(erase(Echo), Extras::new())
            .await
            .unwrap();

        assert_eq!(
            *log.lock(),
            vec!["A-before", "B-before", "handler", "B-after", "A-after"]
        );
    }

    #[tokio::test]
    async fn test_short_circuit_skips_handler() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain: Arc<[BoxedMiddleware]> = Arc::from(vec![Arc::new(from_fn(
            |_request, _extras, _next| async { Ok(Response::new(String::from("cached"))) },
        )) as BoxedMiddleware]);

        let response = Next::new(chain, echo_handler(Arc::clone(&log)))
            .run(erase(Echo), Extras::new())
            .await
            .unwrap();

        assert_eq!(response.into_output::<String>().unwrap(), "cached");
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_closure_middleware_edits_extras() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let adder = from_fn(|request, extras: Extras, next: Next| async move {
            next.run(request, extras.with("data", "added")).await
        });
        let chain = build_chain(&Arc::from(vec![Arc::new(adder) as BoxedMiddleware]));

        let response = Next::new(chain, echo_handler(log))
            .run(erase(Echo), Extras::new())
            .await
            .unwrap();

        assert_eq!(response.into_output::<String>().unwrap(), "added");
    }

    #[test]
    fn test_empty_chain_gets_default_middleware() {
        let chain = build_chain(&Arc::from(Vec::<BoxedMiddleware>::new()));
        assert_eq!(chain.len(), 1);

        let next = Next::new(Arc::clone(&chain), echo_handler(Arc::default()));
        assert!(!next.is_terminal());
    }
}
