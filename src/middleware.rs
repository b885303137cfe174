//! Composition hooks wrapping the dispatch path.
//!
//! Middleware composes *outside* the runtime's own command and subscription
//! interception: it observes every dispatched message (including nested
//! `Cmd::Msg` leaves and responder re-entries) without being able to disturb
//! the runtime's ordering guarantees. Middleware must not dispatch from its
//! hooks.

use std::fmt::Debug;

use tracing::debug;

/// Observes the runtime's dispatch path, for logging or instrumentation.
pub trait Middleware<Msg>: Send {
    /// Called before the message reaches the update function.
    fn before_dispatch(&mut self, _msg: &Msg) {}

    /// Called once the transition triggered by the message has settled.
    fn after_dispatch(&mut self) {}
}

/// Logs every dispatched message through `tracing`.
#[derive(Debug, Default)]
pub struct LoggingMiddleware;

impl<Msg: Debug> Middleware<Msg> for LoggingMiddleware {
    fn before_dispatch(&mut self, msg: &Msg) {
        debug!(?msg, "dispatch");
    }
}
