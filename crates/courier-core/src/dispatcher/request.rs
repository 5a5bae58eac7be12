use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{Instrument, Level, debug, span, trace};

use crate::error::{MediatorError, MediatorResult};
use crate::extras::Extras;
use crate::handler::{Handler, HandlerKind, Response};
use crate::middleware::{BoxedMiddleware, Next, build_chain};
use crate::request::{ErasedRequest, Request, erase};

/// Generic registry + invoke logic shared by commands and queries.
#[derive(Clone)]
pub struct RequestDispatcher {
    handlers: Arc<HashMap<TypeId, HandlerKind>>,
    middlewares: Arc<[BoxedMiddleware]>,
    chain: Arc<[BoxedMiddleware]>,
}

impl Default for RequestDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestDispatcher {
    /// Creates a dispatcher without middlewares.
    pub fn new() -> Self {
        Self::with_middlewares(Vec::new())
    }

    /// Creates a dispatcher running `middlewares` around every handler.
    ///
    /// The first middleware is the outermost layer.
    pub fn with_middlewares(middlewares: impl IntoIterator<Item = BoxedMiddleware>) -> Self {
        let middlewares: Arc<[BoxedMiddleware]> = middlewares.into_iter().collect();
        let chain = build_chain(&middlewares);
        Self {
            handlers: Arc::new(HashMap::new()),
            middlewares,
            chain,
        }
    }

    /// Registers `handler` for requests of type `R`, replacing any previous one.
    pub fn register_handler<R: Request>(&mut self, handler: Handler<R>) {
        let kind = handler.into_kind();
        debug!(
            request = std::any::type_name::<R>(),
            handler = kind.type_name(),
            factory = kind.is_factory(),
            "Registering request handler"
        );
        if let Some(previous) = Arc::make_mut(&mut self.handlers).insert(TypeId::of::<R>(), kind) {
            debug!(previous = previous.type_name(), "Replaced existing handler");
        }
    }

    /// Dispatches a typed request and returns the handler's output.
    pub async fn dispatch<R: Request>(&self, request: R, extras: Extras) -> MediatorResult<R::Output> {
        self.dispatch_or(request, extras, |request| MediatorError::HandlerNotFound {
            request,
        })
        .await
    }

    /// Dispatches `request`, building the not-found error with `not_found`.
    pub(crate) async fn dispatch_or<R: Request>(
        &self,
        request: R,
        extras: Extras,
        not_found: fn(ErasedRequest) -> MediatorError,
    ) -> MediatorResult<R::Output> {
        self.handle_or(erase(request), extras, not_found)
            .await?
            .into_output::<R::Output>()
    }

    /// Dispatches an erased request and returns the erased response.
    pub async fn handle(&self, request: ErasedRequest, extras: Extras) -> MediatorResult<Response> {
        self.handle_or(request, extras, |request| MediatorError::HandlerNotFound {
            request,
        })
        .await
    }

    async fn handle_or(
        &self,
        request: ErasedRequest,
        extras: Extras,
        not_found: fn(ErasedRequest) -> MediatorError,
    ) -> MediatorResult<Response> {
        let Some(handler) = self.handlers.get(&request.request_type()).cloned() else {
            debug!(request = request.type_name(), "No handler registered");
            return Err(not_found(request));
        };

        let span = span!(Level::DEBUG, "dispatch", request = request.short_name());
        async move {
            trace!(
                handler = handler.type_name(),
                middlewares = self.middlewares.len(),
                "Running middleware chain"
            );
            Next::new(Arc::clone(&self.chain), handler)
                .run(request, extras)
                .await
        }
        .instrument(span)
        .await
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if a handler is registered for `R`.
    pub fn contains<R: Request>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<R>())
    }

    /// The configured middlewares, outermost first.
    pub fn middlewares(&self) -> &[BoxedMiddleware] {
        &self.middlewares
    }
}

impl fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("handler_count", &self.handlers.len())
            .field("middleware_count", &self.middlewares.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{RequestHandler, Resolver};
    use crate::middleware::{Middleware, from_fn};
    use crate::request::{Command, RequestKind};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq)]
    struct CreateUser {
        user_id: i64,
        username: String,
    }

    impl Request for CreateUser {
        type Output = i64;
        const KIND: RequestKind = RequestKind::Command;
    }

    impl Command for CreateUser {}

    #[derive(Debug)]
    struct Unregistered;

    impl Request for Unregistered {
        type Output = ();
        const KIND: RequestKind = RequestKind::Command;
    }

    fn create_user() -> CreateUser {
        CreateUser {
            user_id: 1,
            username: "Jon".to_owned(),
        }
    }

    fn returning(value: i64) -> Handler<CreateUser> {
        Handler::from_fn(move |_: CreateUser, _| async move { Ok(value) })
    }

    #[derive(Default)]
    struct EchoId;

    #[async_trait]
    impl RequestHandler<CreateUser> for EchoId {
        async fn handle(&self, command: CreateUser, _extras: Extras) -> crate::HandlerResult<i64> {
            Ok(command.user_id)
        }
    }

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl Middleware for Counting {
        async fn call(
            &self,
            request: ErasedRequest,
            extras: Extras,
            next: Next,
        ) -> MediatorResult<Response> {
            self.0.fetch_add(1, Ordering::SeqCst);
            next.run(request, extras).await
        }
    }

    #[tokio::test]
    async fn test_dispatch_returns_handler_output() {
        let mut dispatcher = RequestDispatcher::new();
        dispatcher.register_handler(Handler::<CreateUser>::from_fn(|command, _| async move {
            Ok(command.user_id)
        }));

        assert!(dispatcher.contains::<CreateUser>());
        assert_eq!(dispatcher.dispatch(create_user(), Extras::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let mut dispatcher = RequestDispatcher::new();
        dispatcher.register_handler(returning(10));
        dispatcher.register_handler(returning(20));

        assert_eq!(dispatcher.handler_count(), 1);
        assert_eq!(dispatcher.dispatch(create_user(), Extras::new()).await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_missing_handler_carries_request() {
        let dispatcher = RequestDispatcher::new();
        let err = dispatcher
            .dispatch(create_user(), Extras::new())
            .await
            .unwrap_err();

        assert!(matches!(err, MediatorError::HandlerNotFound { .. }));
        assert_eq!(err.request_as::<CreateUser>(), Some(&create_user()));

        let err = dispatcher
            .handle(erase(Unregistered), Extras::new())
            .await
            .unwrap_err();
        assert!(err.request_as::<Unregistered>().is_some());
    }

    #[tokio::test]
    async fn test_clone_isolates_registrations() {
        let mut original = RequestDispatcher::new();
        original.register_handler(returning(1));

        let mut copy = original.clone();
        copy.register_handler(returning(2));
        original.register_handler(Handler::<Unregistered>::from_fn(|_, _| async { Ok(()) }));

        assert_eq!(original.dispatch(create_user(), Extras::new()).await.unwrap(), 1);
        assert_eq!(copy.dispatch(create_user(), Extras::new()).await.unwrap(), 2);
        assert!(!copy.contains::<Unregistered>());
    }

    #[tokio::test]
    async fn test_factory_built_once_per_dispatch_without_middlewares() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let mut dispatcher = RequestDispatcher::new();
        dispatcher.register_handler(Handler::<CreateUser>::from_factory(
            move |_: &dyn Resolver| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(EchoId)
            },
        ));

        for _ in 0..3 {
            assert_eq!(dispatcher.dispatch(create_user(), Extras::new()).await.unwrap(), 1);
        }

        assert!(dispatcher.middlewares().is_empty());
        assert_eq!(built.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_default_factory_handler_dispatches() {
        let mut dispatcher = RequestDispatcher::new();
        dispatcher.register_handler(Handler::<CreateUser>::from_default::<EchoId>());

        let output = dispatcher.dispatch(create_user(), Extras::new()).await.unwrap();
        assert_eq!(output, 1);
    }

    #[tokio::test]
    async fn test_chain_runs_once_per_dispatch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = RequestDispatcher::with_middlewares(vec![
            Arc::new(Counting(Arc::clone(&calls))) as BoxedMiddleware,
        ]);
        dispatcher.register_handler(returning(5));

        for _ in 0..3 {
            dispatcher.dispatch(create_user(), Extras::new()).await.unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(dispatcher.middlewares().len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_response_type_is_reported() {
        let mut dispatcher = RequestDispatcher::with_middlewares(vec![Arc::new(from_fn(
            |_request, _extras, _next| async { Ok(Response::new("not an i64")) },
        )) as BoxedMiddleware]);
        dispatcher.register_handler(returning(5));

        let err = dispatcher
            .dispatch(create_user(), Extras::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MediatorError::TypeMismatch {
                expected: "i64",
                ..
            }
        ));
    }
}
