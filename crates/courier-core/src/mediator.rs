//! The [`Mediator`] facade.
//!
//! A mediator owns one [`CommandDispatcher`], one [`QueryDispatcher`], one
//! [`EventObserver`] and a bound [`Extras`] context. Every dispatch merges the
//! bound context with the call-site extras (call-site values win on key
//! collision) and hands the result to the matching component.
//!
//! [`bind`](Mediator::bind) and [`unbind`](Mediator::unbind) never mutate the
//! receiver. They return a new mediator holding copies of all three
//! components, so registrations made on either side afterwards stay isolated:
//!
//! ```rust,ignore
//! use courier_core::{Mediator, extras};
//!
//! let mediator = Mediator::new();
//! let request_scoped = mediator.bind(extras! { "user_id" => 42i64 });
//!
//! assert!(mediator.extra_data().is_empty());
//! assert_eq!(request_scoped.extra_data().get::<i64>("user_id"), Some(&42));
//! ```

use std::fmt;

use tracing::trace;

use crate::dispatcher::{CommandDispatcher, QueryDispatcher};
use crate::error::MediatorResult;
use crate::extras::Extras;
use crate::handler::Handler;
use crate::observer::{EventBatch, EventObserver, Listener};
use crate::request::{Command, Event, Query};

/// Facade over command, query and event dispatch with a bound context.
#[derive(Clone, Default)]
pub struct Mediator {
    command_dispatcher: CommandDispatcher,
    query_dispatcher: QueryDispatcher,
    event_observer: EventObserver,
    extra_data: Extras,
}

impl Mediator {
    /// Creates a mediator with empty registries, no middlewares and no context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mediator from pre-configured components.
    pub fn from_parts(
        command_dispatcher: CommandDispatcher,
        query_dispatcher: QueryDispatcher,
        event_observer: EventObserver,
    ) -> Self {
        Self {
            command_dispatcher,
            query_dispatcher,
            event_observer,
            extra_data: Extras::new(),
        }
    }

    /// Replaces the bound context (builder pattern).
    pub fn with_extra_data(mut self, extra_data: Extras) -> Self {
        self.extra_data = extra_data;
        self
    }

    /// The bound context.
    pub fn extra_data(&self) -> &Extras {
        &self.extra_data
    }

    /// The command dispatcher.
    pub fn command_dispatcher(&self) -> &CommandDispatcher {
        &self.command_dispatcher
    }

    /// The query dispatcher.
    pub fn query_dispatcher(&self) -> &QueryDispatcher {
        &self.query_dispatcher
    }

    /// The event observer.
    pub fn event_observer(&self) -> &EventObserver {
        &self.event_observer
    }

    /// Returns a new mediator whose context is this one's overlaid with `extras`.
    pub fn bind(&self, extras: Extras) -> Mediator {
        trace!(keys = ?extras.keys().collect::<Vec<_>>(), "Binding extra data");
        Self {
            command_dispatcher: self.command_dispatcher.clone(),
            query_dispatcher: self.query_dispatcher.clone(),
            event_observer: self.event_observer.clone(),
            extra_data: self.extra_data.merge(&extras),
        }
    }

    /// Returns a new mediator whose context lacks `keys`.
    ///
    /// Keys that are not bound are ignored.
    pub fn unbind<I, K>(&self, keys: I) -> Mediator
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        Self {
            command_dispatcher: self.command_dispatcher.clone(),
            query_dispatcher: self.query_dispatcher.clone(),
            event_observer: self.event_observer.clone(),
            extra_data: self.extra_data.without(keys),
        }
    }

    /// Registers the handler for `C`, replacing any previous one.
    pub fn register_command_handler<C: Command>(&mut self, handler: Handler<C>) -> &mut Self {
        self.command_dispatcher.register_handler(handler);
        self
    }

    /// Registers the handler for `Q`, replacing any previous one.
    pub fn register_query_handler<Q: Query>(&mut self, handler: Handler<Q>) -> &mut Self {
        self.query_dispatcher.register_handler(handler);
        self
    }

    /// Appends a listener for `E`. Several listeners per event type are allowed.
    pub fn register_event_handler<E: Event>(&mut self, handler: Handler<E>) -> &mut Self {
        self.event_observer.register_listener(Listener::new(handler));
        self
    }

    /// Sends a command with the bound context.
    pub async fn send<C: Command>(&self, command: C) -> MediatorResult<C::Output> {
        self.send_with(command, Extras::new()).await
    }

    /// Sends a command with the bound context overlaid by `extras`.
    pub async fn send_with<C: Command>(
        &self,
        command: C,
        extras: Extras,
    ) -> MediatorResult<C::Output> {
        self.command_dispatcher
            .send(command, self.extra_data.merge(&extras))
            .await
    }

    /// Runs a query with the bound context.
    pub async fn query<Q: Query>(&self, query: Q) -> MediatorResult<Q::Output> {
        self.query_with(query, Extras::new()).await
    }

    /// Runs a query with the bound context overlaid by `extras`.
    pub async fn query_with<Q: Query>(&self, query: Q, extras: Extras) -> MediatorResult<Q::Output> {
        self.query_dispatcher
            .query(query, self.extra_data.merge(&extras))
            .await
    }

    /// Publishes one event or a batch of events with the bound context.
    pub async fn publish(&self, events: impl Into<EventBatch>) -> MediatorResult<()> {
        self.publish_with(events, Extras::new()).await
    }

    /// Publishes events with the bound context overlaid by `extras`.
    pub async fn publish_with(
        &self,
        events: impl Into<EventBatch>,
        extras: Extras,
    ) -> MediatorResult<()> {
        self.event_observer
            .publish(events.into(), self.extra_data.merge(&extras))
            .await
    }
}

impl fmt::Debug for Mediator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mediator")
            .field("command_dispatcher", &self.command_dispatcher)
            .field("query_dispatcher", &self.query_dispatcher)
            .field("event_observer", &self.event_observer)
            .field("extra_data", &self.extra_data)
            .finish()
    }
}
