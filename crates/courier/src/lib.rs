//! # Courier
//!
//! An in-process mediator. Callers hand typed commands, queries and events to
//! a [`Mediator`](prelude::Mediator), which routes each one through an ordered
//! middleware chain to its handler (commands and queries) or to every
//! listener of its type (events).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐     ┌──────────┐     ┌─────────────────────────────────────┐     ┌──────────┐
//! │  caller  │────▶│ Mediator │────▶│ Logging ▶ user middlewares ▶ DI     │────▶│ Handler  │
//! └──────────┘     └──────────┘     └─────────────────────────────────────┘     └──────────┘
//!                  bound extras ∪ call-site extras
//! ```
//!
//! - **core**: request model, extras, handlers, middleware chain, dispatchers
//! - **middleware**: request logging, dependency injection, tower adapters
//! - **runtime**: configuration, logging setup, [`MediatorBuilder`](prelude::MediatorBuilder)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier::prelude::*;
//!
//! #[derive(Debug, Command)]
//! #[command(output = i64)]
//! struct CreateUser {
//!     user_id: i64,
//!     username: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), MediatorError> {
//!     let mut mediator = MediatorBuilder::new().build();
//!     mediator.register_command_handler(Handler::<CreateUser>::from_fn(|command, _| async move {
//!         Ok(command.user_id)
//!     }));
//!
//!     let user_id = mediator
//!         .send(CreateUser { user_id: 1, username: "Jon".into() })
//!         .await?;
//!     assert_eq!(user_id, 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `macros` *(default)*: `Command`, `Query` and `Event` derives
//! - `tower` *(default)*: tower `Service` adapters over a mediator
//! - `toml-config` *(default)* / `yaml-config`: configuration file formats
//! - `json-log`: JSON log output

pub use courier_core as core;
pub use courier_middleware as middleware;
pub use courier_runtime as runtime;

pub use courier_core::*;

#[cfg(feature = "macros")]
pub use courier_macros::{Command, Event, Query};

// Derive expansions resolve through this path.
#[doc(hidden)]
pub use courier_core as __private;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use courier::prelude::*;
/// ```
pub mod prelude {
    pub use courier_core::prelude::*;
    pub use courier_core::{EventBatch, Inject, ResolveError, Resolver};

    #[cfg(feature = "macros")]
    pub use courier_macros::{Command, Event, Query};

    pub use courier_middleware::{Container, DiMiddleware, DiScope, DiValues, LoggingMiddleware};
    pub use courier_runtime::MediatorBuilder;
}
