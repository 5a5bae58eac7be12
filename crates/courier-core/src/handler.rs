//! Handler contract and the handler representations the dispatchers store.
//!
//! A handler is registered once and reused for every matching request. Two
//! representations are supported through [`HandlerKind`]:
//!
//! - **Instance** – a ready-made handler value, shared across calls.
//! - **Factory** – a recipe that builds a fresh handler for each call, either
//!   from `Default` or from collaborators obtained through a [`Resolver`].
//!
//! The dispatchers never look at the representation; the middleware chain
//! materializes a factory right before the terminal call (see
//! [`Next`](crate::Next)).
//!
//! ```rust,ignore
//! use courier_core::{Extras, Handler, HandlerResult, RequestHandler};
//!
//! struct CreateUserHandler;
//!
//! #[async_trait]
//! impl RequestHandler<CreateUser> for CreateUserHandler {
//!     async fn handle(&self, command: CreateUser, _extras: Extras) -> HandlerResult<i64> {
//!         Ok(command.user_id)
//!     }
//! }
//!
//! let handler: Handler<CreateUser> = Handler::new(CreateUserHandler);
//! let closure = Handler::from_fn(|command: CreateUser, _extras| async move {
//!     Ok(command.user_id)
//! });
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::{HandlerResult, MediatorError, MediatorResult, ResolveError};
use crate::extras::Extras;
use crate::request::{ErasedRequest, Request, downcast_request};

/// A typed handler for requests of type `R`.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync + 'static {
    /// Handles one request together with the extras of the call.
    async fn handle(&self, request: R, extras: Extras) -> HandlerResult<R::Output>;
}

/// Adapts an async closure into a [`RequestHandler`].
pub struct HandlerFn<F, R> {
    f: F,
    _marker: PhantomData<fn() -> R>,
}

impl<F, R> HandlerFn<F, R> {
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut, R> RequestHandler<R> for HandlerFn<F, R>
where
    R: Request,
    F: Fn(R, Extras) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<R::Output>> + Send + 'static,
{
    async fn handle(&self, request: R, extras: Extras) -> HandlerResult<R::Output> {
        (self.f)(request, extras).await
    }
}

// ============================================================================
// Type-erased handlers
// ============================================================================

/// A type-erased handler result.
pub struct Response {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Response {
    /// Wraps a handler output.
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The type name of the wrapped value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the wrapped value is a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Borrows the wrapped value as a `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Takes the wrapped value as a `T`, handing the response back on mismatch.
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        let type_name = self.type_name;
        match self.value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Self { value, type_name }),
        }
    }

    /// Takes the wrapped value as a `T`, failing with [`MediatorError::TypeMismatch`].
    pub fn into_output<T: 'static>(self) -> MediatorResult<T> {
        self.downcast::<T>()
            .map_err(|response| MediatorError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found: response.type_name,
            })
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Object-safe handler invoked at the bottom of the middleware chain.
pub trait ErasedHandler: Send + Sync + 'static {
    /// Invokes the handler with an erased request.
    fn call(&self, request: ErasedRequest, extras: Extras)
    -> BoxFuture<'static, MediatorResult<Response>>;

    /// The name of the concrete handler type.
    fn type_name(&self) -> &'static str;
}

/// A shared, type-erased handler instance.
pub type BoxedHandler = Arc<dyn ErasedHandler>;

struct TypedHandler<R, H> {
    handler: Arc<H>,
    _marker: PhantomData<fn() -> R>,
}

impl<R, H> TypedHandler<R, H> {
    fn boxed(handler: H) -> BoxedHandler
    where
        R: Request,
        H: RequestHandler<R>,
    {
        Arc::new(Self {
            handler: Arc::new(handler),
            _marker: PhantomData,
        })
    }
}

impl<R, H> ErasedHandler for TypedHandler<R, H>
where
    R: Request,
    H: RequestHandler<R>,
{
    fn call(
        &self,
        request: ErasedRequest,
        extras: Extras,
    ) -> BoxFuture<'static, MediatorResult<Response>> {
        let handler = Arc::clone(&self.handler);
        Box::pin(async move {
            let request =
                downcast_request::<R>(request).map_err(|found| MediatorError::TypeMismatch {
                    expected: std::any::type_name::<R>(),
                    found: found.type_name(),
                })?;
            let output = handler
                .handle(request, extras)
                .await
                .map_err(MediatorError::Handler)?;
            Ok(Response::new(output))
        })
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<H>()
    }
}

type BuildFn = dyn Fn(&dyn Resolver) -> Result<BoxedHandler, ResolveError> + Send + Sync;

/// A recipe producing a fresh handler instance for every call.
#[derive(Clone)]
pub struct HandlerFactory {
    type_name: &'static str,
    build: Arc<BuildFn>,
}

impl HandlerFactory {
    /// Builds a handler instance, resolving collaborators through `resolver`.
    pub fn build(&self, resolver: &dyn Resolver) -> Result<BoxedHandler, ResolveError> {
        (self.build)(resolver)
    }

    /// The name of the handler type the factory produces.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// The two handler representations a registry can hold.
#[derive(Clone)]
pub enum HandlerKind {
    /// A pre-built handler shared across calls.
    Instance(BoxedHandler),
    /// A factory instantiated per call.
    Factory(HandlerFactory),
}

impl HandlerKind {
    /// Returns a callable handler, building one if this is a factory.
    pub fn materialize(&self, resolver: &dyn Resolver) -> MediatorResult<BoxedHandler> {
        match self {
            Self::Instance(handler) => Ok(Arc::clone(handler)),
            Self::Factory(factory) => {
                factory
                    .build(resolver)
                    .map_err(|source| MediatorError::Materialize {
                        handler: factory.type_name(),
                        source,
                    })
            }
        }
    }

    /// Returns `true` for the factory representation.
    pub fn is_factory(&self) -> bool {
        matches!(self, Self::Factory(_))
    }

    /// The name of the handler type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Instance(handler) => handler.type_name(),
            Self::Factory(factory) => factory.type_name(),
        }
    }
}

impl fmt::Debug for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(_) => f.debug_tuple("Instance").field(&self.type_name()).finish(),
            Self::Factory(_) => f.debug_tuple("Factory").field(&self.type_name()).finish(),
        }
    }
}

/// A handler for requests of type `R`, in either representation.
pub struct Handler<R> {
    kind: HandlerKind,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Request> Handler<R> {
    fn from_kind(kind: HandlerKind) -> Self {
        Self {
            kind,
            _marker: PhantomData,
        }
    }

    /// A pre-built handler instance.
    pub fn new<H: RequestHandler<R>>(handler: H) -> Self {
        Self::from_kind(HandlerKind::Instance(TypedHandler::<R, H>::boxed(handler)))
    }

    /// A handler backed by an async closure.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(R, Extras) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<R::Output>> + Send + 'static,
    {
        Self::new(HandlerFn::new(f))
    }

    /// A handler built with `H::default()` for every call.
    pub fn from_default<H>() -> Self
    where
        H: RequestHandler<R> + Default,
    {
        Self::from_factory(|_: &dyn Resolver| Ok(H::default()))
    }

    /// A handler built through [`Inject`] for every call.
    pub fn injected<H>() -> Self
    where
        H: RequestHandler<R> + Inject,
    {
        Self::from_factory(H::inject)
    }

    /// A handler built by `f` for every call.
    pub fn from_factory<H, F>(f: F) -> Self
    where
        H: RequestHandler<R>,
        F: Fn(&dyn Resolver) -> Result<H, ResolveError> + Send + Sync + 'static,
    {
        let build = move |resolver: &dyn Resolver| f(resolver).map(TypedHandler::<R, H>::boxed);
        Self::from_kind(HandlerKind::Factory(HandlerFactory {
            type_name: std::any::type_name::<H>(),
            build: Arc::new(build),
        }))
    }

    /// Borrows the untyped representation.
    pub fn kind(&self) -> &HandlerKind {
        &self.kind
    }

    /// Converts into the untyped representation.
    pub fn into_kind(self) -> HandlerKind {
        self.kind
    }
}

impl<R> Clone for Handler<R> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R> fmt::Debug for Handler<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.kind, f)
    }
}

// ============================================================================
// Resolution contract
// ============================================================================

/// The narrow "resolve" contract the core needs from a DI container.
pub trait Resolver: Send + Sync {
    /// Resolves the service registered for `type_id`.
    fn resolve_any(
        &self,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<Arc<dyn Any + Send + Sync>, ResolveError>;
}

impl dyn Resolver + '_ {
    /// Resolves a `T`.
    pub fn resolve<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ResolveError> {
        let type_name = std::any::type_name::<T>();
        self.resolve_any(TypeId::of::<T>(), type_name)?
            .downcast::<T>()
            .map_err(|_| ResolveError::TypeMismatch { type_name })
    }
}

/// A resolver with no services. Used when no DI middleware is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyResolver;

impl Resolver for EmptyResolver {
    fn resolve_any(
        &self,
        _type_id: TypeId,
        type_name: &'static str,
    ) -> Result<Arc<dyn Any + Send + Sync>, ResolveError> {
        Err(ResolveError::Missing { type_name })
    }
}

/// Types that can be constructed from resolved collaborators.
pub trait Inject: Sized {
    /// Builds `Self`, pulling collaborators from `resolver`.
    fn inject(resolver: &dyn Resolver) -> Result<Self, ResolveError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Query, RequestKind, erase};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Double(u32);

    impl Request for Double {
        type Output = u32;
        const KIND: RequestKind = RequestKind::Query;
    }

    impl Query for Double {}

    #[derive(Default)]
    struct DoubleHandler;

    #[async_trait]
    impl RequestHandler<Double> for DoubleHandler {
        async fn handle(&self, request: Double, _extras: Extras) -> HandlerResult<u32> {
            Ok(request.0 * 2)
        }
    }

    struct Multiplier(u32);

    struct MultiplyHandler {
        factor: Arc<Multiplier>,
    }

    impl Inject for MultiplyHandler {
        fn inject(resolver: &dyn Resolver) -> Result<Self, ResolveError> {
            Ok(Self {
                factor: resolver.resolve::<Multiplier>()?,
            })
        }
    }

    #[async_trait]
    impl RequestHandler<Double> for MultiplyHandler {
        async fn handle(&self, request: Double, _extras: Extras) -> HandlerResult<u32> {
            Ok(request.0 * self.factor.0)
        }
    }

    struct StaticResolver;

    impl Resolver for StaticResolver {
        fn resolve_any(
            &self,
            type_id: TypeId,
            type_name: &'static str,
        ) -> Result<Arc<dyn Any + Send + Sync>, ResolveError> {
            if type_id == TypeId::of::<Multiplier>() {
                Ok(Arc::new(Multiplier(10)))
            } else {
                Err(ResolveError::Missing { type_name })
            }
        }
    }

    async fn call(kind: &HandlerKind, resolver: &dyn Resolver, value: u32) -> u32 {
        let handler = kind.materialize(resolver).unwrap();
        handler
            .call(erase(Double(value)), Extras::new())
            .await
            .unwrap()
            .into_output::<u32>()
            .unwrap()
    }

    #[tokio::test]
    async fn test_instance_and_closure_handlers() {
        let instance = Handler::<Double>::new(DoubleHandler);
        let closure = Handler::<Double>::from_fn(|request: Double, _extras| async move {
            Ok(request.0 + 1)
        });

        assert!(!instance.kind().is_factory());
        assert_eq!(call(instance.kind(), &EmptyResolver, 4).await, 8);
        assert_eq!(call(closure.kind(), &EmptyResolver, 4).await, 5);
    }

    #[tokio::test]
    async fn test_factory_builds_per_call() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let handler = Handler::<Double>::from_factory(move |_: &dyn Resolver| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(DoubleHandler)
        });

        assert!(handler.kind().is_factory());
        call(handler.kind(), &EmptyResolver, 1).await;
        call(handler.kind(), &EmptyResolver, 1).await;
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_injected_handler_resolves_collaborators() {
        let handler = Handler::<Double>::injected::<MultiplyHandler>();

        assert_eq!(call(handler.kind(), &StaticResolver, 3).await, 30);

        let err = handler.kind().materialize(&EmptyResolver).err().unwrap();
        assert!(matches!(
            err,
            MediatorError::Materialize {
                source: ResolveError::Missing { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_wrong_request_type_is_reported() {
        #[derive(Debug)]
        struct Other;

        impl Request for Other {
            type Output = ();
            const KIND: RequestKind = RequestKind::Query;
        }

        let handler = Handler::<Double>::from_default::<DoubleHandler>();
        let instance = handler.kind().materialize(&EmptyResolver).unwrap();
        let err = instance.call(erase(Other), Extras::new()).await.unwrap_err();

        assert!(matches!(err, MediatorError::TypeMismatch { .. }));
    }

    #[test]
    fn test_response_downcast() {
        let response = Response::new(String::from("value"));
        assert!(response.is::<String>());

        let response = response.downcast::<u32>().unwrap_err();
        assert_eq!(response.type_name(), "alloc::string::String");
        assert_eq!(response.into_output::<String>().unwrap(), "value");
    }
}
