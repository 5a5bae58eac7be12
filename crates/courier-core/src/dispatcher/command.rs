use std::fmt;

use crate::error::{MediatorError, MediatorResult};
use crate::extras::Extras;
use crate::handler::Handler;
use crate::middleware::BoxedMiddleware;
use crate::request::Command;

use super::RequestDispatcher;

/// Routes each command to exactly one handler.
#[derive(Clone, Default)]
pub struct CommandDispatcher {
    inner: RequestDispatcher,
}

impl CommandDispatcher {
    /// Creates a dispatcher without middlewares.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher running `middlewares` around every command handler.
    pub fn with_middlewares(middlewares: impl IntoIterator<Item = BoxedMiddleware>) -> Self {
        Self {
            inner: RequestDispatcher::with_middlewares(middlewares),
        }
    }

    /// Registers the handler for `C`, replacing any previous one.
    pub fn register_handler<C: Command>(&mut self, handler: Handler<C>) {
        self.inner.register_handler(handler);
    }

    /// Sends a command to its handler.
    ///
    /// Fails with [`MediatorError::CommandHandlerNotFound`] if none is registered.
    pub async fn send<C: Command>(&self, command: C, extras: Extras) -> MediatorResult<C::Output> {
        self.inner
            .dispatch_or(command, extras, |request| {
                MediatorError::CommandHandlerNotFound { request }
            })
            .await
    }

    /// The shared request dispatcher.
    pub fn inner(&self) -> &RequestDispatcher {
        &self.inner
    }
}

impl fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CommandDispatcher").field(&self.inner).finish()
    }
}
