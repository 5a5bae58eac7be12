//! Dispatchers routing a request to its single registered handler.
//!
//! [`RequestDispatcher`] holds the shared logic: a registry keyed by the
//! request's [`TypeId`](std::any::TypeId) and the middleware chain. The
//! [`CommandDispatcher`] and [`QueryDispatcher`] wrap it and report a missing
//! handler with a family-specific error.
//!
//! # Ownership
//!
//! Cloning a dispatcher is the "copy" operation used when a mediator is bound
//! to new extras:
//!
//! - the middleware sequence is immutable and shared between copies;
//! - the handler registry is copy-on-write, so registering on one copy never
//!   shows up in another.
//!
//! Registration overwrites: the last handler registered for a type wins.

mod command;
mod query;
mod request;

pub use command::CommandDispatcher;
pub use query::QueryDispatcher;
pub use request::RequestDispatcher;
