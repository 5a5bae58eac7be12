//! Request logging middleware.
//!
//! [`LoggingMiddleware`] emits one `tracing` event before a request enters the
//! rest of the chain and one after it returns:
//!
//! | family  | before               | after                   |
//! |---------|----------------------|-------------------------|
//! | command | `Send X command`     | `Command X sent`        |
//! | query   | `Make X query`       | `Query X made`          |
//! | event   | `Publish X event`    | `Event X published`     |
//!
//! The request's `Debug` form and the response type travel as structured
//! fields. Failures are logged and returned unchanged.

use async_trait::async_trait;
use courier_core::{ErasedRequest, Extras, MediatorResult, Middleware, Next, RequestKind, Response};
use tracing::Level;

/// Emits an event at a level chosen at runtime.
macro_rules! event_at {
    ($level:expr, $($arg:tt)+) => {{
        let level = $level;
        if level == Level::ERROR {
            tracing::error!($($arg)+);
        } else if level == Level::WARN {
            tracing::warn!($($arg)+);
        } else if level == Level::INFO {
            tracing::info!($($arg)+);
        } else if level == Level::DEBUG {
            tracing::debug!($($arg)+);
        } else {
            tracing::trace!($($arg)+);
        }
    }};
}

/// Logs every request passing through the chain.
#[derive(Debug, Clone, Copy)]
pub struct LoggingMiddleware {
    level: Level,
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingMiddleware {
    /// Creates a middleware logging at `DEBUG`.
    pub fn new() -> Self {
        Self {
            level: Level::DEBUG,
        }
    }

    /// Sets the level of the emitted events.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// The level of the emitted events.
    pub fn level(&self) -> Level {
        self.level
    }
}

fn before_message(kind: RequestKind, name: &str) -> String {
    match kind {
        RequestKind::Command => format!("Send {name} command"),
        RequestKind::Query => format!("Make {name} query"),
        RequestKind::Event => format!("Publish {name} event"),
    }
}

fn after_message(kind: RequestKind, name: &str) -> String {
    match kind {
        RequestKind::Command => format!("Command {name} sent"),
        RequestKind::Query => format!("Query {name} made"),
        RequestKind::Event => format!("Event {name} published"),
    }
}

#[async_trait]
impl Middleware for LoggingMiddleware {
    async fn call(
        &self,
        request: ErasedRequest,
        extras: Extras,
        next: Next,
    ) -> MediatorResult<Response> {
        let kind = request.kind();
        let name = request.short_name();

        event_at!(
            self.level,
            request = ?request,
            extras = ?extras,
            "{}",
            before_message(kind, name)
        );

        match next.run(request, extras).await {
            Ok(response) => {
                event_at!(
                    self.level,
                    response_type = response.type_name(),
                    "{}",
                    after_message(kind, name)
                );
                Ok(response)
            }
            Err(err) => {
                event_at!(self.level, error = %err, "{} {} failed", kind, name);
                Err(err)
            }
        }
    }
}
