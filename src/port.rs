//! Runtime port surfaces shared with external, effectful code.
//!
//! Port objects are created once at application construction and are stable
//! for the application's whole lifetime. External code attaches handlers to
//! [`OutboundPort`]s and feeds events through [`InboundPort`]s; the runtime
//! invokes the former when executing commands and routes the latter through
//! the currently active subscription set.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::command::ResponseHandler;
use crate::error::RuntimeError;

/// Callback registered on an outbound port. Receives the command payload
/// and a responder for feeding a reply back into the dispatch path.
pub(crate) type OutboundSubscriber<Msg> = Arc<dyn Fn(Value, Responder<Msg>) + Send + Sync>;

/// Internal dispatch surface shared with port handles and responders.
pub(crate) trait Dispatcher<Msg>: Send + Sync {
    fn dispatch_msg(&self, msg: Msg) -> Result<(), RuntimeError>;
    fn route_inbound(&self, port: &str, data: Value) -> Result<(), RuntimeError>;
}

/// Feeds an outbound port's response back into the runtime as a message.
///
/// Handed to every subscriber alongside the command payload. The responder
/// is `Clone + Send + Sync` and may be invoked at any later time from any
/// thread; a late call observes the same initialization and ordering
/// guarantees as a synchronous one.
pub struct Responder<Msg> {
    pub(crate) port: Arc<str>,
    pub(crate) handle: Option<ResponseHandler<Msg>>,
    pub(crate) dispatcher: Arc<dyn Dispatcher<Msg>>,
}

impl<Msg> Clone for Responder<Msg> {
    fn clone(&self) -> Self {
        Self {
            port: self.port.clone(),
            handle: self.handle.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<Msg> Responder<Msg> {
    /// Whether the originating command supplied a response handler.
    pub fn expects_response(&self) -> bool {
        self.handle.is_some()
    }

    /// Convert `value` into a message via the originating command's response
    /// handler and dispatch it.
    ///
    /// Fails with [`RuntimeError::NoResponseExpected`] when the command was
    /// built without a handler; the value is never silently dropped.
    pub fn respond(&self, value: impl Into<Value>) -> Result<(), RuntimeError> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| RuntimeError::NoResponseExpected(self.port.to_string()))?;
        self.dispatcher.dispatch_msg(handle(value.into()))
    }
}

/// Command-driven channel out of the application.
pub struct OutboundPort<Msg> {
    pub(crate) name: Arc<str>,
    pub(crate) subscribers: Arc<Mutex<Vec<OutboundSubscriber<Msg>>>>,
}

impl<Msg> Clone for OutboundPort<Msg> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            subscribers: self.subscribers.clone(),
        }
    }
}

impl<Msg> OutboundPort<Msg> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a handler invoked on every command targeting this port.
    /// Subscribers run in registration order.
    pub fn subscribe<F>(&self, handler: F)
    where
        F: Fn(Value, Responder<Msg>) + Send + Sync + 'static,
    {
        self.subscribers.lock().push(Arc::new(handler));
    }
}

/// Event-driven channel into the application.
pub struct InboundPort<Msg> {
    pub(crate) name: Arc<str>,
    pub(crate) dispatcher: Arc<dyn Dispatcher<Msg>>,
}

impl<Msg> Clone for InboundPort<Msg> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<Msg> InboundPort<Msg> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Route `data` to every currently active listener on this port, in
    /// subscription-declaration order. Callable at any time from any thread;
    /// before `run`, and whenever the current model stops listening, there
    /// are no listeners and the call is a no-op.
    pub fn send(&self, data: impl Into<Value>) -> Result<(), RuntimeError> {
        self.dispatcher.route_inbound(&self.name, data.into())
    }
}

/// The stable set of port objects declared in the api spec.
pub struct Ports<Msg> {
    pub(crate) outbound: HashMap<String, OutboundPort<Msg>>,
    pub(crate) inbound: HashMap<String, InboundPort<Msg>>,
}

impl<Msg> Ports<Msg> {
    /// Look up a declared outbound port.
    pub fn outbound(&self, name: &str) -> Result<&OutboundPort<Msg>, RuntimeError> {
        match self.outbound.get(name) {
            Some(port) => Ok(port),
            None if self.inbound.contains_key(name) => {
                Err(RuntimeError::NotOutbound(name.to_owned()))
            }
            None => Err(RuntimeError::UnknownPort(name.to_owned())),
        }
    }

    /// Look up a declared inbound port.
    pub fn inbound(&self, name: &str) -> Result<&InboundPort<Msg>, RuntimeError> {
        match self.inbound.get(name) {
            Some(port) => Ok(port),
            None if self.outbound.contains_key(name) => {
                Err(RuntimeError::NotInbound(name.to_owned()))
            }
            None => Err(RuntimeError::UnknownPort(name.to_owned())),
        }
    }
}
