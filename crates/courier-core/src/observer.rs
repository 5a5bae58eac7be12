//! Event fan-out.
//!
//! An [`EventObserver`] keeps an ordered list of [`Listener`]s. Publishing a
//! batch walks the events in input order and, for each event, runs every
//! matching listener in registration order through the middleware chain.
//!
//! Listeners run one after another, never concurrently. The first failing
//! listener aborts the rest of the publish call, including later events in
//! the same batch.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use tracing::{Instrument, Level, debug, span, trace};

use crate::error::MediatorResult;
use crate::extras::Extras;
use crate::handler::{Handler, HandlerKind};
use crate::middleware::{BoxedMiddleware, Next, build_chain};
use crate::request::{BoxedEvent, DynRequest, Event};

/// Binds one event type to one handler.
#[derive(Clone)]
pub struct Listener {
    event_type: TypeId,
    event_name: &'static str,
    handler: HandlerKind,
}

impl Listener {
    /// Creates a listener for events of type `E`.
    pub fn new<E: Event>(handler: Handler<E>) -> Self {
        Self {
            event_type: TypeId::of::<E>(),
            event_name: std::any::type_name::<E>(),
            handler: handler.into_kind(),
        }
    }

    /// Returns `true` if this listener handles `event`.
    ///
    /// Matching is by exact type.
    pub fn is_listen(&self, event: &dyn DynRequest) -> bool {
        event.request_type() == self.event_type
    }

    /// The event type this listener is bound to.
    pub fn event_type(&self) -> TypeId {
        self.event_type
    }

    /// The name of the event type this listener is bound to.
    pub fn event_name(&self) -> &'static str {
        self.event_name
    }

    /// The listener's handler.
    pub fn handler(&self) -> &HandlerKind {
        &self.handler
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("event", &self.event_name)
            .field("handler", &self.handler)
            .finish()
    }
}

/// An ordered batch of events to publish.
#[derive(Debug, Clone, Default)]
pub struct EventBatch {
    events: Vec<BoxedEvent>,
}

impl EventBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event (builder pattern).
    pub fn with<E: Event>(mut self, event: E) -> Self {
        self.events.push(BoxedEvent::new(event));
        self
    }

    /// Appends an event.
    pub fn push(&mut self, event: impl Into<BoxedEvent>) {
        self.events.push(event.into());
    }

    /// Returns the number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterates over the events in publish order.
    pub fn iter(&self) -> impl Iterator<Item = &BoxedEvent> {
        self.events.iter()
    }
}

impl<E: Event> From<E> for EventBatch {
    fn from(event: E) -> Self {
        Self {
            events: vec![BoxedEvent::new(event)],
        }
    }
}

impl<E: Event> From<Vec<E>> for EventBatch {
    fn from(events: Vec<E>) -> Self {
        events.into_iter().collect()
    }
}

impl From<BoxedEvent> for EventBatch {
    fn from(event: BoxedEvent) -> Self {
        Self {
            events: vec![event],
        }
    }
}

impl<E: Event> FromIterator<E> for EventBatch {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().map(BoxedEvent::new).collect(),
        }
    }
}

impl IntoIterator for EventBatch {
    type Item = BoxedEvent;
    type IntoIter = std::vec::IntoIter<BoxedEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

/// Registry of listeners with sequential fan-out.
///
/// Cloning shares the middleware sequence and detaches the listener list on
/// the next registration.
#[derive(Clone)]
pub struct EventObserver {
    listeners: Arc<Vec<Listener>>,
    middlewares: Arc<[BoxedMiddleware]>,
    chain: Arc<[BoxedMiddleware]>,
}

impl Default for EventObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl EventObserver {
    /// Creates an observer without middlewares.
    pub fn new() -> Self {
        Self::with_middlewares(Vec::new())
    }

    /// Creates an observer running `middlewares` around every listener call.
    pub fn with_middlewares(middlewares: impl IntoIterator<Item = BoxedMiddleware>) -> Self {
        let middlewares: Arc<[BoxedMiddleware]> = middlewares.into_iter().collect();
        let chain = build_chain(&middlewares);
        Self {
            listeners: Arc::new(Vec::new()),
            middlewares,
            chain,
        }
    }

    /// Appends a listener.
    pub fn register_listener(&mut self, listener: Listener) {
        debug!(
            event = listener.event_name,
            handler = listener.handler.type_name(),
            "Registering event listener"
        );
        Arc::make_mut(&mut self.listeners).push(listener);
    }

    /// Publishes `events` to every matching listener.
    pub async fn publish(&self, events: impl Into<EventBatch>, extras: Extras) -> MediatorResult<()> {
        for event in events.into() {
            let span = span!(Level::DEBUG, "publish", event = event.as_request().short_name());
            self.publish_one(&event, &extras).instrument(span).await?;
        }
        Ok(())
    }

    async fn publish_one(&self, event: &BoxedEvent, extras: &Extras) -> MediatorResult<()> {
        let mut delivered = 0usize;
        for listener in self.listeners.iter() {
            if !listener.is_listen(event.as_request()) {
                continue;
            }
            trace!(handler = listener.handler.type_name(), "Delivering event");
            Next::new(Arc::clone(&self.chain), listener.handler.clone())
                .run(event.to_request(), extras.clone())
                .await?;
            delivered += 1;
        }
        trace!(delivered, "Event published");
        Ok(())
    }

    /// The registered listeners, in registration order.
    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }

    /// The configured middlewares, outermost first.
    pub fn middlewares(&self) -> &[BoxedMiddleware] {
        &self.middlewares
    }
}

impl fmt::Debug for EventObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventObserver")
            .field("listener_count", &self.listeners.len())
            .field("middleware_count", &self.middlewares.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediatorError;
    use crate::request::{Request, RequestKind};
    use parking_lot::Mutex;

    #[derive(Debug, Clone)]
    struct UserCreated(i64);

    impl Request for UserCreated {
        type Output = ();
        const KIND: RequestKind = RequestKind::Event;
    }

    impl Event for UserCreated {}

    #[derive(Debug, Clone)]
    struct UserDeleted(i64);

    impl Request for UserDeleted {
        type Output = ();
        const KIND: RequestKind = RequestKind::Event;
    }

    impl Event for UserDeleted {}

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording<E: Event>(log: &Log, name: &'static str, id: fn(&E) -> i64) -> Listener {
        let log = Arc::clone(log);
        Listener::new(Handler::<E>::from_fn(move |event: E, _| {
            let log = Arc::clone(&log);
            async move {
                log.lock().push(format!("{name}:{}", id(&event)));
                Ok(())
            }
        }))
    }

    #[tokio::test]
    async fn test_fan_out_in_registration_order() {
        let log = Log::default();
        let mut observer = EventObserver::new();
        observer.register_listener(recording::<UserCreated>(&log, "first", |e| e.0));
        observer.register_listener(recording::<UserDeleted>(&log, "deleted", |e| e.0));
        observer.register_listener(recording::<UserCreated>(&log, "second", |e| e.0));

        observer
            .publish(vec![UserCreated(1), UserCreated(2)], Extras::new())
            .await
            .unwrap();

        assert_eq!(
            *log.lock(),
            vec!["first:1", "second:1", "first:2", "second:2"]
        );
    }

    #[tokio::test]
    async fn test_publish_without_listeners_is_ok() {
        let observer = EventObserver::new();
        observer.publish(UserDeleted(1), Extras::new()).await.unwrap();
        assert!(observer.listeners().is_empty());
    }

    #[tokio::test]
    async fn test_failing_listener_aborts_publish() {
        let log = Log::default();
        let mut observer = EventObserver::new();
        observer.register_listener(Listener::new(Handler::<UserCreated>::from_fn(
            |_, _| async { Err("listener failed".into()) },
        )));
        observer.register_listener(recording::<UserCreated>(&log, "after", |e| e.0));

        let err = observer
            .publish(UserCreated(1), Extras::new())
            .await
            .unwrap_err();

        assert!(matches!(err, MediatorError::Handler(_)));
        assert_eq!(err.to_string(), "listener failed");
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failing_listener_skips_rest_of_batch() {
        let log = Log::default();
        let mut observer = EventObserver::new();
        observer.register_listener(Listener::new(Handler::<UserCreated>::from_fn(
            |event: UserCreated, _| async move {
                if event.0 == 1 {
                    Err("first event rejected".into())
                } else {
                    Ok(())
                }
            },
        )));
        observer.register_listener(recording::<UserCreated>(&log, "after", |e| e.0));
        observer.register_listener(recording::<UserDeleted>(&log, "deleted", |e| e.0));

        let batch = EventBatch::new()
            .with(UserCreated(1))
            .with(UserCreated(2))
            .with(UserDeleted(3));
        let err = observer.publish(batch, Extras::new()).await.unwrap_err();

        assert_eq!(err.to_string(), "first event rejected");
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_clone_isolates_listeners() {
        let log = Log::default();
        let mut original = EventObserver::new();
        original.register_listener(recording::<UserCreated>(&log, "original", |e| e.0));

        let mut copy = original.clone();
        copy.register_listener(recording::<UserCreated>(&log, "copy", |e| e.0));

        original.publish(UserCreated(7), Extras::new()).await.unwrap();

        assert_eq!(*log.lock(), vec!["original:7"]);
        assert_eq!(copy.listeners().len(), 2);
    }

    #[test]
    fn test_listener_matches_exact_type() {
        let log = Log::default();
        let listener = recording::<UserCreated>(&log, "l", |e| e.0);

        assert!(listener.is_listen(&UserCreated(1)));
        assert!(!listener.is_listen(&UserDeleted(1)));
    }
}
