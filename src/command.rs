use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::Value;

/// Shared handler converting a port response payload into a message.
pub(crate) type ResponseHandler<Msg> = Arc<dyn Fn(Value) -> Msg + Send + Sync>;

/// A request to invoke a named outbound port.
///
/// Carries the payload handed to the port's subscribers and, optionally, a
/// handler that turns an eventual response back into a message. Built via
/// [`Cmd::run`] and [`Cmd::run_with`].
pub struct RunCmd<Msg> {
    pub(crate) port: Arc<str>,
    pub(crate) data: Value,
    pub(crate) handle_response: Option<ResponseHandler<Msg>>,
}

impl<Msg> RunCmd<Msg> {
    /// Name of the outbound port this command targets.
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Payload handed to the port's subscribers.
    pub fn data(&self) -> &Value {
        &self.data
    }
}

impl<Msg> Clone for RunCmd<Msg> {
    fn clone(&self) -> Self {
        Self {
            port: self.port.clone(),
            data: self.data.clone(),
            handle_response: self.handle_response.clone(),
        }
    }
}

/// A declarative description of a one-shot effect.
///
/// Commands are returned from `init` and `update` and executed by the
/// [`Application`](crate::application::Application) runtime against the
/// declared ports. They are immutable trees; construction never fails and
/// performs no effect by itself.
///
/// # Examples
///
/// ```
/// use teaport::prelude::*;
///
/// enum Msg {
///     Saved,
/// }
///
/// let cmd: Cmd<Msg> = Cmd::batch([
///     Cmd::run("save", "payload"),
///     Cmd::msg(Msg::Saved),
/// ]);
/// ```
#[derive(Clone)]
pub enum Cmd<Msg> {
    /// No effect.
    None,
    /// Dispatch the message directly, bypassing any port.
    Msg(Msg),
    /// Invoke a named outbound port.
    Run(RunCmd<Msg>),
    /// Execute all child commands, in declaration order.
    Batch(Vec<Cmd<Msg>>),
}

impl<Msg> Cmd<Msg> {
    /// A command that does nothing.
    pub fn none() -> Self {
        Cmd::None
    }

    /// Dispatch `msg` directly, without touching any port.
    pub fn msg(msg: Msg) -> Self {
        Cmd::Msg(msg)
    }

    /// Invoke the named outbound port with `data`, expecting no response.
    ///
    /// A subscriber that calls `respond` anyway gets
    /// [`RuntimeError::NoResponseExpected`](crate::error::RuntimeError::NoResponseExpected).
    pub fn run(port: &str, data: impl Into<Value>) -> Self {
        Cmd::Run(RunCmd {
            port: Arc::from(port),
            data: data.into(),
            handle_response: None,
        })
    }

    /// Invoke the named outbound port with `data`; an eventual response is
    /// converted into a message by `handle_response` and dispatched.
    pub fn run_with<R>(port: &str, data: impl Into<Value>, handle_response: R) -> Self
    where
        R: Fn(Value) -> Msg + Send + Sync + 'static,
    {
        Cmd::Run(RunCmd {
            port: Arc::from(port),
            data: data.into(),
            handle_response: Some(Arc::new(handle_response)),
        })
    }

    /// Group commands into a single command. Order is significant: children
    /// execute in declaration order, nested batches flatten depth-first.
    pub fn batch(cmds: impl IntoIterator<Item = Cmd<Msg>>) -> Self {
        Cmd::Batch(cmds.into_iter().collect())
    }

    /// Order-preserving depth-first flattening into executable leaves.
    pub(crate) fn flatten_into(self, out: &mut VecDeque<CmdLeaf<Msg>>) {
        match self {
            Cmd::None => {}
            Cmd::Msg(msg) => out.push_back(CmdLeaf::Msg(msg)),
            Cmd::Run(run) => out.push_back(CmdLeaf::Run(run)),
            Cmd::Batch(cmds) => {
                for cmd in cmds {
                    cmd.flatten_into(out);
                }
            }
        }
    }
}

/// A single executable step extracted from a command tree.
pub(crate) enum CmdLeaf<Msg> {
    Msg(Msg),
    Run(RunCmd<Msg>),
}
