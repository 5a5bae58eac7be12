//! Dependency injection for factory handlers.
//!
//! The core only knows the narrow [`Resolver`](courier_core::Resolver)
//! contract. This module provides a small container behind it:
//!
//! - [`Container`] / [`ContainerBuilder`] – providers keyed by type, with a
//!   [`Lifetime`]
//! - [`DiScope`] – the resolver handed to handler factories
//! - [`DiMiddleware`] – enters a scope per call and installs it in the chain

mod container;
mod middleware;
mod scope;

pub use container::{Container, ContainerBuilder, Lifetime};
pub use middleware::{DiKeys, DiMiddleware};
pub use scope::{DiScope, DiValues};
