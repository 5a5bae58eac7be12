//! # Courier Runtime
//!
//! The ambient stack around a Courier mediator:
//!
//! - [`config`] – layered configuration (defaults, files, `COURIER_*` variables)
//! - [`logging`] – `tracing-subscriber` initialization
//! - [`MediatorBuilder`] – a mediator assembled from configuration with the
//!   stock middlewares wired in
//!
//! ```ignore
//! use courier_runtime::{MediatorBuilder, config::load_config, logging};
//!
//! let config = load_config()?;
//! courier_runtime::config::validate_config(&config)?;
//! logging::init_from_config(&config.logging);
//!
//! let mut mediator = MediatorBuilder::from_config(&config).build();
//! ```

pub mod builder;
pub mod config;
pub mod logging;

pub use builder::MediatorBuilder;
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, CourierConfig, LoggingConfig, load_config,
    load_config_from_file, validate_config,
};
pub use logging::{LoggingBuilder, SpanEvents, init_from_config};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros and span helpers.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
