//! Declarative port specs and the typed helpers built from them.
//!
//! An [`ApiSpec`] enumerates every port an application exposes, once, at
//! construction time. [`Api`] turns that spec into per-port helpers so the
//! pure `init`/`update`/`subscriptions` functions can build commands and
//! subscriptions without repeating port names as loose strings.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::command::Cmd;
use crate::error::RuntimeError;
use crate::subscription::Sub;

/// How a single named port is declared.
#[derive(Clone, Copy, Debug)]
pub(crate) enum PortDecl {
    Outbound { responds: bool },
    Inbound,
}

/// Declarative description of every port an application exposes.
///
/// The spec is a finite, enumerated list built up front; the runtime never
/// discovers ports dynamically. Duplicate names are rejected when the spec
/// is consumed (by [`Api::new`] or
/// [`Application::new`](crate::application::Application::new)).
#[derive(Clone, Default)]
pub struct ApiSpec {
    pub(crate) ports: Vec<(String, PortDecl)>,
}

impl ApiSpec {
    pub fn new() -> Self {
        Self { ports: Vec::new() }
    }

    /// Declare an outbound port whose handlers never respond.
    pub fn outbound(mut self, name: &str) -> Self {
        self.ports
            .push((name.to_owned(), PortDecl::Outbound { responds: false }));
        self
    }

    /// Declare an outbound port whose handlers may respond with a payload.
    pub fn outbound_with_response(mut self, name: &str) -> Self {
        self.ports
            .push((name.to_owned(), PortDecl::Outbound { responds: true }));
        self
    }

    /// Declare an inbound port that external code feeds data into.
    pub fn inbound(mut self, name: &str) -> Self {
        self.ports.push((name.to_owned(), PortDecl::Inbound));
        self
    }
}

/// Typed helpers for building commands and subscriptions from a declared
/// spec.
///
/// Handles are validated against the spec when created, so a misspelled or
/// misdeclared port name surfaces here rather than deep inside a transition.
#[derive(Debug)]
pub struct Api {
    ports: BTreeMap<String, PortDecl>,
}

impl Api {
    /// Build helpers from `spec`, rejecting duplicate declarations.
    pub fn new(spec: &ApiSpec) -> Result<Self, RuntimeError> {
        let mut ports = BTreeMap::new();
        for (name, decl) in &spec.ports {
            if ports.insert(name.clone(), *decl).is_some() {
                return Err(RuntimeError::DuplicatePort(name.clone()));
            }
        }
        Ok(Self { ports })
    }

    /// Helper for a declared outbound port.
    pub fn command(&self, name: &str) -> Result<CommandPort, RuntimeError> {
        match self.ports.get(name) {
            Some(PortDecl::Outbound { responds }) => Ok(CommandPort {
                name: Arc::from(name),
                responds: *responds,
            }),
            Some(PortDecl::Inbound) => Err(RuntimeError::NotOutbound(name.to_owned())),
            None => Err(RuntimeError::UnknownPort(name.to_owned())),
        }
    }

    /// Helper for a declared inbound port.
    pub fn subscription(&self, name: &str) -> Result<SubscriptionPort, RuntimeError> {
        match self.ports.get(name) {
            Some(PortDecl::Inbound) => Ok(SubscriptionPort {
                name: Arc::from(name),
            }),
            Some(PortDecl::Outbound { .. }) => Err(RuntimeError::NotInbound(name.to_owned())),
            None => Err(RuntimeError::UnknownPort(name.to_owned())),
        }
    }
}

/// Builds [`Cmd::Run`] values against one declared outbound port.
#[derive(Clone)]
pub struct CommandPort {
    name: Arc<str>,
    responds: bool,
}

impl CommandPort {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the declaration allows handlers of this port to respond.
    pub fn responds(&self) -> bool {
        self.responds
    }

    /// Fire-and-forget invocation. A handler that responds anyway gets the
    /// "no response expected" error at the point it calls `respond`.
    pub fn send<Msg>(&self, data: impl Into<Value>) -> Cmd<Msg> {
        Cmd::run(&self.name, data)
    }

    /// Invocation whose eventual response is turned into a message by
    /// `handle_response`.
    ///
    /// Fails with [`RuntimeError::NoResponseExpected`] when the port was
    /// declared without [`ApiSpec::outbound_with_response`]: a handler may
    /// not be attached to a port whose declaration promised none.
    pub fn request<Msg, R>(
        &self,
        data: impl Into<Value>,
        handle_response: R,
    ) -> Result<Cmd<Msg>, RuntimeError>
    where
        R: Fn(Value) -> Msg + Send + Sync + 'static,
    {
        if !self.responds {
            return Err(RuntimeError::NoResponseExpected(self.name.to_string()));
        }
        Ok(Cmd::run_with(&self.name, data, handle_response))
    }
}

/// Builds [`Sub::Listen`] values against one declared inbound port.
#[derive(Clone)]
pub struct SubscriptionPort {
    name: Arc<str>,
}

impl SubscriptionPort {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Listen on this port; `handler` converts each arriving payload into a
    /// message.
    pub fn listen<Msg, H>(&self, handler: H) -> Sub<Msg>
    where
        H: Fn(Value) -> Msg + Send + Sync + 'static,
    {
        Sub::listen(&self.name, handler)
    }
}
