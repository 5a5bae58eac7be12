//! # Courier Middleware
//!
//! Stock middlewares built on the [`Middleware`](courier_core::Middleware)
//! extension point of `courier-core`:
//!
//! - [`LoggingMiddleware`] – logs every request before and after dispatch
//! - [`di`] – a dependency-injection container and the [`DiMiddleware`]
//!   that builds factory handlers through it
//! - [`service`] – tower `Service` adapters over a mediator (`tower` feature)

pub mod di;
pub mod logging;

#[cfg(feature = "tower")]
pub mod service;

pub use di::{Container, ContainerBuilder, DiKeys, DiMiddleware, DiScope, DiValues, Lifetime};
pub use logging::LoggingMiddleware;

#[cfg(feature = "tower")]
pub use service::{CommandService, PublishService, QueryService};
