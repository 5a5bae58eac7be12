//! Error types for the Courier core.
//!
//! Two layers of failure travel through a dispatch:
//!
//! - [`MediatorError`] – routing failures raised by the dispatchers themselves
//!   (no handler registered, a response of the wrong type) and a transparent
//!   wrapper around whatever a handler or middleware returned.
//! - [`ResolveError`] – failures of the narrow dependency-resolution contract
//!   used to materialize factory handlers.
//!
//! Nothing in the core catches, retries or rewrites handler errors; they reach
//! the caller exactly as the handler produced them.

use std::error::Error as StdError;

use thiserror::Error;

use crate::request::{DynRequest, ErasedRequest};

/// A boxed error raised by a handler or a middleware.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Result type returned by request handlers.
pub type HandlerResult<T> = Result<T, BoxError>;

/// Result type returned by dispatch operations.
pub type MediatorResult<T> = Result<T, MediatorError>;

// =============================================================================
// Resolve Errors
// =============================================================================

/// Errors raised while resolving a dependency or building a factory handler.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No provider is registered for the type.
    #[error("no provider registered for {type_name}")]
    Missing {
        /// The requested type.
        type_name: &'static str,
    },

    /// The provider produced a value of another type.
    #[error("provider for {type_name} returned a value of a different type")]
    TypeMismatch {
        /// The requested type.
        type_name: &'static str,
    },

    /// The provider failed to build the value.
    #[error("failed to construct {type_name}: {source}")]
    Construct {
        /// The type being constructed.
        type_name: &'static str,
        /// The underlying failure.
        #[source]
        source: BoxError,
    },
}

impl ResolveError {
    /// Creates a [`ResolveError::Construct`] for `T`.
    pub fn construct<T: ?Sized>(source: impl Into<BoxError>) -> Self {
        Self::Construct {
            type_name: std::any::type_name::<T>(),
            source: source.into(),
        }
    }
}

// =============================================================================
// Mediator Errors
// =============================================================================

/// Errors returned by the dispatchers, the observer and the mediator.
#[derive(Debug, Error)]
pub enum MediatorError {
    /// No handler is registered for the request type.
    #[error("Request handler for {} request is not registered", .request.short_name())]
    HandlerNotFound {
        /// The request that could not be routed.
        request: ErasedRequest,
    },

    /// No handler is registered for the command type.
    #[error("Command handler for {} command is not registered", .request.short_name())]
    CommandHandlerNotFound {
        /// The command that could not be routed.
        request: ErasedRequest,
    },

    /// No handler is registered for the query type.
    #[error("Query handler for {} query is not registered", .request.short_name())]
    QueryHandlerNotFound {
        /// The query that could not be routed.
        request: ErasedRequest,
    },

    /// A value in the chain did not have the type the caller expected.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The expected type.
        expected: &'static str,
        /// The type actually found.
        found: &'static str,
    },

    /// A factory handler could not be instantiated.
    #[error("failed to materialize handler {handler}")]
    Materialize {
        /// The handler type.
        handler: &'static str,
        /// The underlying resolve failure.
        #[source]
        source: ResolveError,
    },

    /// An error raised by a handler or a middleware, passed through untouched.
    #[error(transparent)]
    Handler(BoxError),
}

impl MediatorError {
    /// Wraps a domain error raised by a handler or middleware.
    pub fn handler(error: impl Into<BoxError>) -> Self {
        Self::Handler(error.into())
    }

    /// Returns `true` for any of the three "not registered" variants.
    pub fn is_handler_not_found(&self) -> bool {
        matches!(
            self,
            Self::HandlerNotFound { .. }
                | Self::CommandHandlerNotFound { .. }
                | Self::QueryHandlerNotFound { .. }
        )
    }

    /// The request carried by a "not registered" error.
    pub fn request(&self) -> Option<&dyn DynRequest> {
        match self {
            Self::HandlerNotFound { request }
            | Self::CommandHandlerNotFound { request }
            | Self::QueryHandlerNotFound { request } => Some(request.as_ref()),
            _ => None,
        }
    }

    /// The request carried by a "not registered" error, downcast to `T`.
    pub fn request_as<T: crate::Request>(&self) -> Option<&T> {
        self.request().and_then(|request| request.downcast_ref::<T>())
    }

    /// Takes the request out of a "not registered" error.
    pub fn into_request(self) -> Option<ErasedRequest> {
        match self {
            Self::HandlerNotFound { request }
            | Self::CommandHandlerNotFound { request }
            | Self::QueryHandlerNotFound { request } => Some(request),
            _ => None,
        }
    }

    /// Borrows the handler's domain error as an `E`.
    pub fn handler_error<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::Handler(error) => error.downcast_ref::<E>(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Command, Request, RequestKind, erase};

    #[derive(Debug, PartialEq)]
    struct CreateUser {
        user_id: i64,
    }

    impl Request for CreateUser {
        type Output = i64;
        const KIND: RequestKind = RequestKind::Command;
    }

    impl Command for CreateUser {}

    #[derive(Debug, Error)]
    #[error("user already exists")]
    struct UserAlreadyExists;

    #[test]
    fn test_not_found_messages() {
        let err = MediatorError::HandlerNotFound {
            request: erase(CreateUser { user_id: 1 }),
        };
        assert_eq!(
            err.to_string(),
            "Request handler for CreateUser request is not registered"
        );

        let err = MediatorError::CommandHandlerNotFound {
            request: erase(CreateUser { user_id: 1 }),
        };
        assert_eq!(
            err.to_string(),
            "Command handler for CreateUser command is not registered"
        );
        assert!(err.is_handler_not_found());
        assert_eq!(
            err.request_as::<CreateUser>(),
            Some(&CreateUser { user_id: 1 })
        );
    }

    #[test]
    fn test_handler_error_is_transparent() {
        let err = MediatorError::handler(UserAlreadyExists);

        assert_eq!(err.to_string(), "user already exists");
        assert!(err.handler_error::<UserAlreadyExists>().is_some());
        assert!(err.request().is_none());
        assert!(!err.is_handler_not_found());
    }

    #[test]
    fn test_resolve_error_construct() {
        let err = ResolveError::construct::<String>("boom");
        assert_eq!(
            err.to_string(),
            "failed to construct alloc::string::String: boom"
        );
    }
}
