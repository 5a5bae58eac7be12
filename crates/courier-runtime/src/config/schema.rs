//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use courier_middleware::DiKeys;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CourierConfig {
    /// Logging subscriber settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Settings of the stock middlewares.
    #[serde(default)]
    pub middleware: MiddlewareConfig,

    /// Values bound into the mediator's extra data.
    #[serde(default)]
    pub extra_data: Map<String, Value>,
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the lowercase level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to the matching `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Newline-delimited JSON (`json-log` feature).
    #[cfg(feature = "json-log")]
    Json,
}

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Requires `logging.file_path`.
    File,
}

/// Rotation policy for file output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging subscriber configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level, overridden by `RUST_LOG`.
    pub level: LogLevel,

    pub format: LogFormat,

    pub output: LogOutput,

    /// Log file path when `output = "file"`.
    pub file_path: Option<PathBuf>,

    pub rotation: LogRotation,

    /// Include thread ids in each line.
    pub thread_ids: bool,

    /// Include file and line of the callsite.
    pub file_location: bool,

    pub span_events: SpanEventConfig,

    /// Per-module levels, e.g. `courier_core = "trace"`.
    pub filters: BTreeMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            file_path: None,
            rotation: LogRotation::Never,
            thread_ids: false,
            file_location: false,
            span_events: SpanEventConfig::default(),
            filters: BTreeMap::new(),
        }
    }
}

// =============================================================================
// Middleware
// =============================================================================

/// Settings of the stock middlewares.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MiddlewareConfig {
    pub logging: LoggingMiddlewareConfig,
    pub di: DiConfig,
}

/// Settings of the request logging middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingMiddlewareConfig {
    /// Whether the middleware is installed.
    pub enabled: bool,

    /// Level of the emitted request events.
    pub level: LogLevel,
}

impl Default for LoggingMiddlewareConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: LogLevel::Debug,
        }
    }
}

/// Settings of the dependency-injection middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiConfig {
    /// Whether the middleware is installed when a container is supplied.
    pub enabled: bool,

    /// Extras keys read by the middleware.
    pub keys: DiKeys,
}

impl Default for DiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keys: DiKeys::default(),
        }
    }
}
