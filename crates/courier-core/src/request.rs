//! Request model for the Courier mediator.
//!
//! Every dispatchable payload belongs to exactly one of three families:
//!
//! - [`Command`] – an intent to change state, routed to exactly one handler
//! - [`Query`] – an intent to read state, routed to exactly one handler
//! - [`Event`] – a notification, fanned out to zero or more listeners
//!
//! Routing identity is the concrete Rust type of the request (its [`TypeId`]),
//! never its value. Inside the dispatch chain requests travel type-erased as
//! [`ErasedRequest`] so middlewares can wrap handlers of any request type.
//!
//! ```rust,ignore
//! use courier_core::{Command, Request, RequestKind};
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
//! ```
//!
//! The `courier-macros` derives generate both impls in one step.

use std::any::{Any, TypeId};
use std::fmt;

/// The family a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Changes state; exactly one handler.
    Command,
    /// Reads state; exactly one handler.
    Query,
    /// Notification; zero or more listeners.
    Event,
}

impl RequestKind {
    /// Returns the lowercase family name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Query => "query",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base contract for every dispatchable payload.
///
/// `KIND` must agree with the family marker trait the type implements
/// ([`Command`], [`Query`] or [`Event`]).
pub trait Request: fmt::Debug + Send + Sync + 'static {
    /// The value produced by the request's handler.
    type Output: Send + 'static;

    /// The family this request belongs to.
    const KIND: RequestKind;
}

/// A request that changes state and is handled by exactly one handler.
pub trait Command: Request {}

/// A request that reads state and is handled by exactly one handler.
pub trait Query: Request {}

/// A notification delivered to every matching listener.
///
/// Events are cloned once per listener during fan-out.
pub trait Event: Request<Output = ()> + Clone {}

// ============================================================================
// Type-erased requests
// ============================================================================

/// Object-safe view of a [`Request`], used inside the middleware chain.
pub trait DynRequest: Any + fmt::Debug + Send + Sync {
    /// The family of the concrete request.
    fn kind(&self) -> RequestKind;

    /// The routing key: `TypeId` of the concrete request type.
    fn request_type(&self) -> TypeId;

    /// The fully qualified name of the concrete request type.
    fn type_name(&self) -> &'static str;

    /// Borrows the request as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Converts the boxed request into `Box<dyn Any>` for owned downcasting.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<R: Request> DynRequest for R {
    fn kind(&self) -> RequestKind {
        R::KIND
    }

    fn request_type(&self) -> TypeId {
        TypeId::of::<R>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<R>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

impl dyn DynRequest + '_ {
    /// Returns `true` if the erased request is a `T`.
    pub fn is<T: Request>(&self) -> bool {
        self.request_type() == TypeId::of::<T>()
    }

    /// Borrows the erased request as a `T`.
    pub fn downcast_ref<T: Request>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Returns the short type name (the last path segment), used in log messages.
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.type_name())
    }
}

/// A boxed, type-erased request travelling through the middleware chain.
pub type ErasedRequest = Box<dyn DynRequest>;

/// Erases a typed request.
pub fn erase<R: Request>(request: R) -> ErasedRequest {
    Box::new(request)
}

/// Recovers the typed request from an erased one.
///
/// On mismatch the erased request is handed back untouched.
pub fn downcast_request<R: Request>(request: ErasedRequest) -> Result<R, ErasedRequest> {
    if !request.is::<R>() {
        return Err(request);
    }
    match request.into_any().downcast::<R>() {
        Ok(typed) => Ok(*typed),
        // `is` already confirmed the type.
        Err(_) => unreachable!("request type id matched but downcast failed"),
    }
}

/// Strips the module path from a `std::any::type_name` string.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

// ============================================================================
// BoxedEvent
// ============================================================================

/// Object-safe view of an [`Event`] that can clone itself for fan-out.
trait DynEvent: DynRequest {
    fn clone_event(&self) -> Box<dyn DynEvent>;
    fn to_request(&self) -> ErasedRequest;
    fn as_request(&self) -> &dyn DynRequest;
}

impl<E: Event> DynEvent for E {
    fn clone_event(&self) -> Box<dyn DynEvent> {
        Box::new(self.clone())
    }

    fn to_request(&self) -> ErasedRequest {
        Box::new(self.clone())
    }

    fn as_request(&self) -> &dyn DynRequest {
        self
    }
}

/// A clonable, type-erased event.
pub struct BoxedEvent(Box<dyn DynEvent>);

impl BoxedEvent {
    /// Erases a typed event.
    pub fn new<E: Event>(event: E) -> Self {
        Self(Box::new(event))
    }

    /// The routing key of the wrapped event.
    pub fn event_type(&self) -> TypeId {
        self.0.request_type()
    }

    /// The type name of the wrapped event.
    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    /// Borrows the wrapped event as a generic request.
    pub fn as_request(&self) -> &dyn DynRequest {
        self.0.as_request()
    }

    /// Clones the wrapped event into a fresh [`ErasedRequest`].
    pub fn to_request(&self) -> ErasedRequest {
        self.0.to_request()
    }

    /// Borrows the wrapped event as an `E`.
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.0.as_request().downcast_ref::<E>()
    }
}

impl Clone for BoxedEvent {
    fn clone(&self) -> Self {
        Self(self.0.clone_event())
    }
}

impl fmt::Debug for BoxedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0.as_request(), f)
    }
}

impl<E: Event> From<E> for BoxedEvent {
    fn from(event: E) -> Self {
        Self::new(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Ping(u32);

    impl Request for Ping {
        type Output = u32;
        const KIND: RequestKind = RequestKind::Query;
    }

    impl Query for Ping {}

    #[derive(Debug, Clone, PartialEq)]
    struct Pinged;

    impl Request for Pinged {
        type Output = ();
        const KIND: RequestKind = RequestKind::Event;
    }

    impl Event for Pinged {}

    #[test]
    fn test_erased_request_keeps_identity() {
        let erased = erase(Ping(7));

        assert_eq!(erased.kind(), RequestKind::Query);
        assert_eq!(erased.request_type(), TypeId::of::<Ping>());
        assert!(erased.is::<Ping>());
        assert!(!erased.is::<Pinged>());
        assert_eq!(erased.downcast_ref::<Ping>(), Some(&Ping(7)));
        assert_eq!(erased.short_name(), "Ping");
    }

    #[test]
    fn test_downcast_request_mismatch_returns_request() {
        let erased = erase(Ping(1));
        let erased = downcast_request::<Pinged>(erased).unwrap_err();
        assert_eq!(downcast_request::<Ping>(erased).unwrap(), Ping(1));
    }

    #[test]
    fn test_boxed_event_clone() {
        let event = BoxedEvent::new(Pinged);
        let copy = event.clone();

        assert_eq!(copy.event_type(), TypeId::of::<Pinged>());
        assert_eq!(copy.downcast_ref::<Pinged>(), Some(&Pinged));
        assert_eq!(event.to_request().kind(), RequestKind::Event);
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::CreateUser"), "CreateUser");
        assert_eq!(short_type_name("Plain"), "Plain");
        assert_eq!(short_type_name("a::Wrapper<b::Inner>"), "Wrapper<b::Inner>");
    }
}
