//! Configuration module for the Courier runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for logging, the stock middlewares and the mediator's bound extra data.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    CourierConfig, DiConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    LoggingMiddlewareConfig, MiddlewareConfig, SpanEventConfig,
};
pub use validation::validate_config;
