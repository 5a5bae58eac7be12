//! Config-driven assembly of a [`Mediator`].
//!
//! Every family gets the chain
//!
//! ```text
//! [LoggingMiddleware] ▶ shared middlewares ▶ family middlewares ▶ [DiMiddleware] ▶ handler
//! ```
//!
//! The logging middleware is outermost so it sees the caller's request and
//! extras. The DI middleware is innermost so every other middleware runs
//! before factories are built.
//!
//! ```rust,ignore
//! use courier_runtime::{MediatorBuilder, config::load_config};
//!
//! let config = load_config()?;
//! let mut mediator = MediatorBuilder::from_config(&config)
//!     .container(container)
//!     .middleware(AuditMiddleware::default())
//!     .build();
//! ```

use std::any::Any;
use std::sync::Arc;

use courier_core::{
    BoxedMiddleware, CommandDispatcher, EventObserver, Extras, Mediator, Middleware,
    QueryDispatcher,
};
use courier_middleware::{Container, DiKeys, DiMiddleware, LoggingMiddleware};
use tracing::debug;

use crate::config::CourierConfig;

/// Builds a [`Mediator`] with the stock middlewares wired in.
pub struct MediatorBuilder {
    logging: Option<LoggingMiddleware>,
    middlewares: Vec<BoxedMiddleware>,
    command_middlewares: Vec<BoxedMiddleware>,
    query_middlewares: Vec<BoxedMiddleware>,
    event_middlewares: Vec<BoxedMiddleware>,
    container: Option<Container>,
    di_enabled: bool,
    di_keys: DiKeys,
    extra_data: Extras,
}

impl MediatorBuilder {
    /// A builder with request logging at `DEBUG` and DI enabled.
    pub fn new() -> Self {
        Self {
            logging: Some(LoggingMiddleware::new()),
            middlewares: Vec::new(),
            command_middlewares: Vec::new(),
            query_middlewares: Vec::new(),
            event_middlewares: Vec::new(),
            container: None,
            di_enabled: true,
            di_keys: DiKeys::default(),
            extra_data: Extras::new(),
        }
    }

    /// A builder following `config.middleware`, with `config.extra_data`
    /// bound as [`serde_json::Value`] entries.
    pub fn from_config(config: &CourierConfig) -> Self {
        let logging = &config.middleware.logging;
        let di = &config.middleware.di;

        let extra_data = config
            .extra_data
            .iter()
            .fold(Extras::new(), |extras, (key, value)| {
                extras.with(key.clone(), value.clone())
            });

        Self {
            logging: logging
                .enabled
                .then(|| LoggingMiddleware::new().with_level(logging.level.to_tracing_level())),
            di_enabled: di.enabled,
            di_keys: di.keys.clone(),
            extra_data,
            ..Self::new()
        }
    }

    /// Appends a middleware to every family.
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Appends a middleware to the command chain only.
    pub fn command_middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.command_middlewares.push(Arc::new(middleware));
        self
    }

    /// Appends a middleware to the query chain only.
    pub fn query_middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.query_middlewares.push(Arc::new(middleware));
        self
    }

    /// Appends a middleware to the event chain only.
    pub fn event_middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.event_middlewares.push(Arc::new(middleware));
        self
    }

    /// Replaces the request logging middleware.
    pub fn logging(mut self, logging: LoggingMiddleware) -> Self {
        self.logging = Some(logging);
        self
    }

    pub fn without_logging(mut self) -> Self {
        self.logging = None;
        self
    }

    /// Sets the container used by the DI middleware.
    ///
    /// Without a container no DI middleware is installed and factory
    /// handlers are built with an empty resolver.
    pub fn container(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    /// Binds one extra value into the built mediator.
    pub fn extra<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.extra_data.insert(key, value);
        self
    }

    fn chain(&self, family: &[BoxedMiddleware], di: Option<&BoxedMiddleware>) -> Vec<BoxedMiddleware> {
        let logging = self
            .logging
            .map(|logging| Arc::new(logging) as BoxedMiddleware);

        logging
            .into_iter()
            .chain(self.middlewares.iter().cloned())
            .chain(family.iter().cloned())
            .chain(di.cloned())
            .collect()
    }

    /// Assembles the mediator. The DI middleware is added only when a
    /// container was supplied and DI is enabled.
    pub fn build(self) -> Mediator {
        let di = self
            .container
            .as_ref()
            .filter(|_| self.di_enabled)
            .map(|container| {
                Arc::new(DiMiddleware::new(container.clone()).with_keys(self.di_keys.clone()))
                    as BoxedMiddleware
            });

        let commands = self.chain(&self.command_middlewares, di.as_ref());
        let queries = self.chain(&self.query_middlewares, di.as_ref());
        let events = self.chain(&self.event_middlewares, di.as_ref());

        debug!(
            logging = self.logging.is_some(),
            di = di.is_some(),
            command_middlewares = commands.len(),
            query_middlewares = queries.len(),
            event_middlewares = events.len(),
            extra_data = self.extra_data.len(),
            "Building mediator"
        );

        Mediator::from_parts(
            CommandDispatcher::with_middlewares(commands),
            QueryDispatcher::with_middlewares(queries),
            EventObserver::with_middlewares(events),
        )
        .with_extra_data(self.extra_data)
    }
}

impl Default for MediatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
