use std::fmt;

use crate::error::{MediatorError, MediatorResult};
use crate::extras::Extras;
use crate::handler::Handler;
use crate::middleware::BoxedMiddleware;
use crate::request::Query;

use super::RequestDispatcher;

/// Routes each query to exactly one handler.
#[derive(Clone, Default)]
pub struct QueryDispatcher {
    inner: RequestDispatcher,
}

impl QueryDispatcher {
    /// Creates a dispatcher without middlewares.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher running `middlewares` around every query handler.
    pub fn with_middlewares(middlewares: impl IntoIterator<Item = BoxedMiddleware>) -> Self {
        Self {
            inner: RequestDispatcher::with_middlewares(middlewares),
        }
    }

    /// Registers the handler for `Q`, replacing any previous one.
    pub fn register_handler<Q: Query>(&mut self, handler: Handler<Q>) {
        self.inner.register_handler(handler);
    }

    /// Runs a query through its handler.
    ///
    /// Fails with [`MediatorError::QueryHandlerNotFound`] if none is registered.
    pub async fn query<Q: Query>(&self, query: Q, extras: Extras) -> MediatorResult<Q::Output> {
        self.inner
            .dispatch_or(query, extras, |request| MediatorError::QueryHandlerNotFound {
                request,
            })
            .await
    }

    /// The shared request dispatcher.
    pub fn inner(&self) -> &RequestDispatcher {
        &self.inner
    }
}

impl fmt::Debug for QueryDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("QueryDispatcher").field(&self.inner).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Request, RequestKind};

    #[derive(Debug, PartialEq)]
    struct CountUsers;

    impl Request for CountUsers {
        type Output = usize;
        const KIND: RequestKind = RequestKind::Query;
    }

    impl Query for CountUsers {}

    #[tokio::test]
    async fn test_query_sees_extras() {
        let mut dispatcher = QueryDispatcher::new();
        dispatcher.register_handler(Handler::<CountUsers>::from_fn(|_, extras| async move {
            Ok(extras.get::<usize>("total").copied().unwrap_or_default())
        }));

        let extras = Extras::new().with("total", 42usize);
        assert_eq!(dispatcher.query(CountUsers, extras).await.unwrap(), 42);
        assert_eq!(dispatcher.query(CountUsers, Extras::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_handler_is_query_specific() {
        let err = QueryDispatcher::new()
            .query(CountUsers, Extras::new())
            .await
            .unwrap_err();

        assert!(matches!(err, MediatorError::QueryHandlerNotFound { .. }));
        assert!(err.request_as::<CountUsers>().is_some());
        assert_eq!(
            err.to_string(),
            "Query handler for CountUsers query is not registered"
        );
    }
}
