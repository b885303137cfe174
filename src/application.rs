//! The effect-port dispatch runtime.
//!
//! [`Application`] owns the authoritative model, drives the
//! init/update/subscriptions cycle, executes commands against the declared
//! ports, and routes inbound port events through the currently active
//! subscription set.
//!
//! # Ordering discipline
//!
//! Commands are flattened depth-first into a FIFO queue of executable
//! leaves. Every transition recomputes the active subscription set
//! immediately, so an inbound event always observes the set of the most
//! recently completed transition. Commands produced by a nested transition
//! (a `Cmd::Msg` leaf, or a subscriber calling `respond` synchronously) are
//! appended behind every still-pending leaf: a batch from transition N fully
//! resolves before the commands of transition N+1 run, and nested commands
//! are never interleaved ahead of pending siblings.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace};

use crate::api::{ApiSpec, PortDecl};
use crate::command::{Cmd, CmdLeaf};
use crate::error::RuntimeError;
use crate::middleware::Middleware;
use crate::port::{Dispatcher, InboundPort, OutboundPort, OutboundSubscriber, Ports, Responder};
use crate::subscription::{ListenSub, Sub};

type InitFn<Model, Msg, Flags> = Box<dyn FnOnce(Flags) -> (Model, Cmd<Msg>) + Send>;
type UpdateFn<Model, Msg> = Box<dyn FnMut(Model, Msg) -> (Model, Cmd<Msg>) + Send>;
type SubscriptionsFn<Model, Msg> = Box<dyn Fn(&Model) -> Sub<Msg> + Send>;

/// One declared port as the runtime sees it.
enum Registered<Msg> {
    Outbound {
        subscribers: Arc<Mutex<Vec<OutboundSubscriber<Msg>>>>,
    },
    Inbound,
}

/// Mutable runtime state with a single writer: the dispatch path.
///
/// `model: None` is the reserved not-started value. Application code cannot
/// construct it, so it cannot collide with a real model.
struct Cell<Model, Msg> {
    model: Option<Model>,
    update: UpdateFn<Model, Msg>,
    subscriptions: SubscriptionsFn<Model, Msg>,
    subs: Vec<ListenSub<Msg>>,
    queue: VecDeque<CmdLeaf<Msg>>,
    draining: bool,
}

impl<Model, Msg> Cell<Model, Msg> {
    /// Run one transition: compute the next model, install it, replace the
    /// active subscription set, then queue the produced command.
    fn transition(
        &mut self,
        msg: Msg,
        registry: &HashMap<String, Registered<Msg>>,
    ) -> Result<(), RuntimeError> {
        let model = self.model.take().ok_or(RuntimeError::NotStarted)?;
        let (next, cmd) = (self.update)(model, msg);
        let sub_tree = (self.subscriptions)(&next);
        self.model = Some(next);
        self.install(sub_tree, cmd, registry)
    }

    /// Shared tail of `run` and `transition`: the new subscription set
    /// replaces the previous one wholesale, then the command joins the queue.
    fn install(
        &mut self,
        sub_tree: Sub<Msg>,
        cmd: Cmd<Msg>,
        registry: &HashMap<String, Registered<Msg>>,
    ) -> Result<(), RuntimeError> {
        let subs = sub_tree.flatten();
        for sub in &subs {
            match registry.get(sub.port()) {
                Some(Registered::Inbound) => {}
                Some(Registered::Outbound { .. }) => {
                    return Err(RuntimeError::NotInbound(sub.port().to_owned()))
                }
                None => return Err(RuntimeError::UnknownPort(sub.port().to_owned())),
            }
        }
        self.subs = subs;
        cmd.flatten_into(&mut self.queue);
        Ok(())
    }
}

struct Core<Model, Msg> {
    cell: Mutex<Cell<Model, Msg>>,
    registry: HashMap<String, Registered<Msg>>,
    middleware: Mutex<Vec<Box<dyn Middleware<Msg>>>>,
}

/// Model-erased view of the core handed to port handles and responders.
struct CoreHandle<Model, Msg>(Arc<Core<Model, Msg>>);

impl<Model, Msg> Dispatcher<Msg> for CoreHandle<Model, Msg>
where
    Model: Send + 'static,
    Msg: Send + 'static,
{
    fn dispatch_msg(&self, msg: Msg) -> Result<(), RuntimeError> {
        dispatch_msg(&self.0, msg)
    }

    fn route_inbound(&self, port: &str, data: Value) -> Result<(), RuntimeError> {
        route_inbound(&self.0, port, data)
    }
}

/// Dispatch one message through the middleware hooks and the transition
/// machinery.
fn dispatch_msg<Model, Msg>(core: &Arc<Core<Model, Msg>>, msg: Msg) -> Result<(), RuntimeError>
where
    Model: Send + 'static,
    Msg: Send + 'static,
{
    {
        let mut middleware = core.middleware.lock();
        for mw in middleware.iter_mut() {
            mw.before_dispatch(&msg);
        }
    }
    let result = enter(core, msg);
    {
        let mut middleware = core.middleware.lock();
        for mw in middleware.iter_mut() {
            mw.after_dispatch();
        }
    }
    result
}

/// Run the transition for `msg` and drain the command queue unless a drain
/// is already in progress on an outer frame, which will pick the queued
/// leaves up after its pending siblings.
fn enter<Model, Msg>(core: &Arc<Core<Model, Msg>>, msg: Msg) -> Result<(), RuntimeError>
where
    Model: Send + 'static,
    Msg: Send + 'static,
{
    {
        let mut cell = core.cell.lock();
        cell.transition(msg, &core.registry)?;
        if cell.draining {
            return Ok(());
        }
        cell.draining = true;
    }
    drain(core)
}

/// Execute queued command leaves in FIFO order until the queue is empty.
/// The cell lock is never held while a leaf executes, so port handlers and
/// nested dispatches re-enter freely.
fn drain<Model, Msg>(core: &Arc<Core<Model, Msg>>) -> Result<(), RuntimeError>
where
    Model: Send + 'static,
    Msg: Send + 'static,
{
    loop {
        let leaf = {
            let mut cell = core.cell.lock();
            match cell.queue.pop_front() {
                Some(leaf) => leaf,
                None => {
                    cell.draining = false;
                    return Ok(());
                }
            }
        };
        if let Err(err) = execute(core, leaf) {
            // Fatal to the offending call: discard what the failed drain
            // still had pending and leave the runtime usable.
            let mut cell = core.cell.lock();
            cell.queue.clear();
            cell.draining = false;
            return Err(err);
        }
    }
}

fn execute<Model, Msg>(core: &Arc<Core<Model, Msg>>, leaf: CmdLeaf<Msg>) -> Result<(), RuntimeError>
where
    Model: Send + 'static,
    Msg: Send + 'static,
{
    match leaf {
        CmdLeaf::Msg(msg) => dispatch_msg(core, msg),
        CmdLeaf::Run(run) => {
            let subscribers = match core.registry.get(run.port()) {
                Some(Registered::Outbound { subscribers }) => subscribers,
                Some(Registered::Inbound) => {
                    return Err(RuntimeError::NotOutbound(run.port().to_owned()))
                }
                None => return Err(RuntimeError::UnknownPort(run.port().to_owned())),
            };
            let snapshot = subscribers.lock().clone();
            trace!(port = %run.port(), subscribers = snapshot.len(), "invoking outbound port");
            let dispatcher: Arc<dyn Dispatcher<Msg>> = Arc::new(CoreHandle(core.clone()));
            for subscriber in &snapshot {
                let responder = Responder {
                    port: run.port.clone(),
                    handle: run.handle_response.clone(),
                    dispatcher: dispatcher.clone(),
                };
                subscriber(run.data.clone(), responder);
            }
            Ok(())
        }
    }
}

/// Route an inbound event through the currently active subscription set.
///
/// The listener snapshot is taken from the most recently completed
/// transition; each matching handler's message is dispatched in
/// subscription-declaration order.
fn route_inbound<Model, Msg>(
    core: &Arc<Core<Model, Msg>>,
    port: &str,
    data: Value,
) -> Result<(), RuntimeError>
where
    Model: Send + 'static,
    Msg: Send + 'static,
{
    let listeners: Vec<_> = {
        let cell = core.cell.lock();
        cell.subs
            .iter()
            .filter(|sub| sub.port() == port)
            .map(|sub| sub.handler.clone())
            .collect()
    };
    trace!(port, listeners = listeners.len(), "routing inbound event");
    for listener in listeners {
        dispatch_msg(core, listener(data.clone()))?;
    }
    Ok(())
}

/// An Elm-style application wired to named effect ports.
///
/// Construction takes the three pure functions of the architecture plus the
/// declarative [`ApiSpec`]; the runtime does the rest:
///
/// * `init: Flags -> (Model, Cmd<Msg>)` seeds the model when [`run`] is
///   called.
/// * `update: (Model, Msg) -> (Model, Cmd<Msg>)` computes every transition.
/// * `subscriptions: &Model -> Sub<Msg>` is recomputed after every
///   transition and replaces the active listener set wholesale.
///
/// Until [`run`] is called the application holds no model and every external
/// dispatch fails with [`RuntimeError::NotStarted`].
///
/// [`run`]: Application::run
pub struct Application<Model, Msg, Flags = ()> {
    core: Arc<Core<Model, Msg>>,
    init: Mutex<Option<InitFn<Model, Msg, Flags>>>,
    ports: Ports<Msg>,
}

impl<Model, Msg, Flags> Application<Model, Msg, Flags>
where
    Model: Clone + Send + 'static,
    Msg: Send + 'static,
{
    /// Build an application from its pure functions and port spec.
    ///
    /// Exactly one port object is created per declared name; the objects are
    /// stable for the application's lifetime. Fails with
    /// [`RuntimeError::DuplicatePort`] when the spec declares a name twice.
    pub fn new(
        init: impl FnOnce(Flags) -> (Model, Cmd<Msg>) + Send + 'static,
        subscriptions: impl Fn(&Model) -> Sub<Msg> + Send + 'static,
        update: impl FnMut(Model, Msg) -> (Model, Cmd<Msg>) + Send + 'static,
        spec: ApiSpec,
    ) -> Result<Self, RuntimeError> {
        let mut registry: HashMap<String, Registered<Msg>> = HashMap::new();
        for (name, decl) in &spec.ports {
            let entry = match decl {
                PortDecl::Outbound { .. } => Registered::Outbound {
                    subscribers: Arc::new(Mutex::new(Vec::new())),
                },
                PortDecl::Inbound => Registered::Inbound,
            };
            if registry.insert(name.clone(), entry).is_some() {
                return Err(RuntimeError::DuplicatePort(name.clone()));
            }
        }

        let core = Arc::new(Core {
            cell: Mutex::new(Cell {
                model: None,
                update: Box::new(update),
                subscriptions: Box::new(subscriptions),
                subs: Vec::new(),
                queue: VecDeque::new(),
                draining: false,
            }),
            registry,
            middleware: Mutex::new(Vec::new()),
        });

        let dispatcher: Arc<dyn Dispatcher<Msg>> = Arc::new(CoreHandle(core.clone()));
        let mut ports = Ports {
            outbound: HashMap::new(),
            inbound: HashMap::new(),
        };
        for (name, entry) in &core.registry {
            match entry {
                Registered::Outbound { subscribers } => {
                    ports.outbound.insert(
                        name.clone(),
                        OutboundPort {
                            name: Arc::from(name.as_str()),
                            subscribers: subscribers.clone(),
                        },
                    );
                }
                Registered::Inbound => {
                    ports.inbound.insert(
                        name.clone(),
                        InboundPort {
                            name: Arc::from(name.as_str()),
                            dispatcher: dispatcher.clone(),
                        },
                    );
                }
            }
        }

        Ok(Self {
            core,
            init: Mutex::new(Some(Box::new(init))),
            ports,
        })
    }

    /// Attach a middleware observing the dispatch path.
    ///
    /// Middleware composes outside the runtime's own interception and must
    /// not dispatch from its hooks.
    pub fn with_middleware(self, middleware: impl Middleware<Msg> + 'static) -> Self {
        self.core.middleware.lock().push(Box::new(middleware));
        self
    }

    /// Start the application: seed the model from `init(flags)`, activate
    /// the initial subscription set, then execute the initial command.
    ///
    /// Must be called exactly once; a second call fails with
    /// [`RuntimeError::AlreadyStarted`].
    pub fn run(&self, flags: Flags) -> Result<(), RuntimeError> {
        let init = self
            .init
            .lock()
            .take()
            .ok_or(RuntimeError::AlreadyStarted)?;
        let (model, cmd) = init(flags);
        debug!("application started");
        {
            let mut cell = self.core.cell.lock();
            let sub_tree = (cell.subscriptions)(&model);
            cell.model = Some(model);
            cell.install(sub_tree, cmd, &self.core.registry)?;
            cell.draining = true;
        }
        drain(&self.core)
    }

    /// Dispatch a message into the runtime.
    ///
    /// Fails with [`RuntimeError::NotStarted`] before [`Application::run`].
    pub fn dispatch(&self, msg: Msg) -> Result<(), RuntimeError> {
        dispatch_msg(&self.core, msg)
    }

    /// A snapshot of the current model.
    pub fn state(&self) -> Result<Model, RuntimeError> {
        self.core
            .cell
            .lock()
            .model
            .clone()
            .ok_or(RuntimeError::NotStarted)
    }

    /// Swap the update function.
    ///
    /// The current model, the active subscription set, and every port object
    /// are preserved; only future transitions use the new function.
    pub fn replace_update(
        &self,
        update: impl FnMut(Model, Msg) -> (Model, Cmd<Msg>) + Send + 'static,
    ) {
        self.core.cell.lock().update = Box::new(update);
    }

    /// The port objects declared in the api spec.
    pub fn ports(&self) -> &Ports<Msg> {
        &self.ports
    }
}
