//! # Courier Core
//!
//! The dispatch and middleware engine of the Courier mediator.
//!
//! Callers submit typed requests to a [`Mediator`], which routes each one to
//! exactly one handler (commands, queries) or to every matching listener
//! (events), always through an ordered chain of middlewares.
//!
//! ## Components
//!
//! - **Request model**: [`Request`], [`Command`], [`Query`], [`Event`] and their
//!   type-erased forms ([`ErasedRequest`], [`BoxedEvent`])
//! - **Context**: the copy-on-write [`Extras`] bag
//! - **Handlers**: [`RequestHandler`], [`Handler`] (instance or factory) and the
//!   [`Resolver`] contract used to build factories
//! - **Middleware chain**: [`Middleware`], [`Next`], [`DefaultMiddleware`]
//! - **Dispatch**: [`RequestDispatcher`], [`CommandDispatcher`],
//!   [`QueryDispatcher`], [`EventObserver`]
//! - **Facade**: [`Mediator`]
//!
//! ```text
//! ┌──────────┐     ┌──────────┐     ┌──────────────────────┐     ┌─────────┐
//! │  caller  │────▶│ Mediator │────▶│ m1 ▶ m2 ▶ ... ▶ mn   │────▶│ Handler │
//! └──────────┘     └──────────┘     └──────────────────────┘     └─────────┘
//!                   bound extras ∪ call-site extras
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use courier_core::{Command, Extras, Handler, Mediator, Request, RequestKind};
//!
//! #[derive(Debug)]
//! struct CreateUser {
//!     user_id: i64,
//!     username: String,
//! }
//!
//! impl Request for CreateUser {
//!     type Output = i64;
//!     const KIND: RequestKind = RequestKind::Command;
//! }
//!
//! impl Command for CreateUser {}
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mediator = Mediator::new();
//!     mediator.register_command_handler(Handler::<CreateUser>::from_fn(|command, _| async move {
//!         Ok(command.user_id)
//!     }));
//!
//!     let user_id = mediator
//!         .send(CreateUser { user_id: 1, username: "Jon".into() })
//!         .await
//!         .unwrap();
//!     assert_eq!(user_id, 1);
//! }
//! ```

pub mod dispatcher;
pub mod error;
pub mod extras;
pub mod handler;
pub mod mediator;
pub mod middleware;
pub mod observer;
pub mod request;

pub use dispatcher::{CommandDispatcher, QueryDispatcher, RequestDispatcher};
pub use error::{BoxError, HandlerResult, MediatorError, MediatorResult, ResolveError};
pub use extras::{ExtraValue, Extras};
pub use handler::{
    BoxedHandler, EmptyResolver, ErasedHandler, Handler, HandlerFactory, HandlerFn, HandlerKind,
    Inject, RequestHandler, Resolver, Response,
};
pub use mediator::Mediator;
pub use middleware::{BoxedMiddleware, DefaultMiddleware, FnMiddleware, Middleware, Next};
pub use observer::{EventBatch, EventObserver, Listener};
pub use request::{
    BoxedEvent, Command, DynRequest, ErasedRequest, Event, Query, Request, RequestKind,
    downcast_request, erase,
};

pub use async_trait::async_trait;
pub use futures::future::BoxFuture;

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        Command, Event, Extras, Handler, HandlerResult, Mediator, MediatorError, MediatorResult,
        Middleware, Next, Query, Request, RequestHandler, RequestKind, async_trait, extras,
    };
}
