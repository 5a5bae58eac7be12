//! Tower adapters for the mediator.
//!
//! [`CommandService`], [`QueryService`] and [`PublishService`] wrap a
//! [`Mediator`] so it can sit at the bottom of a tower stack:
//!
//! ```rust,ignore
//! use tower::{ServiceBuilder, ServiceExt};
//!
//! let service = ServiceBuilder::new()
//!     .map_request(|(id, name)| CreateUser { user_id: id, username: name })
//!     .service(CommandService::new(mediator));
//!
//! let user_id = service.oneshot((1, "Jon".to_owned())).await?;
//! ```
//!
//! The services always report ready; dispatch uses the mediator's bound extras.

use std::task::{Context, Poll};

use courier_core::{BoxFuture, Command, Event, EventBatch, Mediator, MediatorError, Query};
use tower::Service;

/// Sends commands through a [`Mediator`].
#[derive(Debug, Clone)]
pub struct CommandService {
    mediator: Mediator,
}

impl CommandService {
    pub fn new(mediator: Mediator) -> Self {
        Self { mediator }
    }
}

impl<C: Command> Service<C> for CommandService {
    type Response = C::Output;
    type Error = MediatorError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, command: C) -> Self::Future {
        let mediator = self.mediator.clone();
        Box::pin(async move { mediator.send(command).await })
    }
}

/// Runs queries through a [`Mediator`].
#[derive(Debug, Clone)]
pub struct QueryService {
    mediator: Mediator,
}

impl QueryService {
    pub fn new(mediator: Mediator) -> Self {
        Self { mediator }
    }
}

impl<Q: Query> Service<Q> for QueryService {
    type Response = Q::Output;
    type Error = MediatorError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, query: Q) -> Self::Future {
        let mediator = self.mediator.clone();
        Box::pin(async move { mediator.query(query).await })
    }
}

/// Publishes events through a [`Mediator`].
#[derive(Debug, Clone)]
pub struct PublishService {
    mediator: Mediator,
}

impl PublishService {
    pub fn new(mediator: Mediator) -> Self {
        Self { mediator }
    }
}

impl<E: Event> Service<E> for PublishService {
    type Response = ();
    type Error = MediatorError;
    type Future = BoxFuture<'static, Result<(), Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: E) -> Self::Future {
        let mediator = self.mediator.clone();
        let batch = EventBatch::from(event);
        Box::pin(async move { mediator.publish(batch).await })
    }
}
