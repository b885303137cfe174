use thiserror::Error;

/// Errors reported by the effect-port runtime.
///
/// All of these signal programmer error in the calling application; none is
/// retried or recovered internally. Panics raised by user `init`, `update`,
/// or `subscriptions` functions are not caught and propagate to the caller
/// of `run` or `dispatch`.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A transition was attempted before the application was started.
    #[error("run() must be called before dispatch()")]
    NotStarted,

    /// `run` was called more than once.
    #[error("application has already been started")]
    AlreadyStarted,

    /// A response handler was requested on a port declared without one, or
    /// `respond` was called for a command carrying no handler.
    #[error("no response expected on port `{0}`")]
    NoResponseExpected(String),

    /// A command, subscription, or lookup referenced a port missing from the
    /// declared api spec.
    #[error("unknown port `{0}`")]
    UnknownPort(String),

    /// An outbound operation targeted an inbound port.
    #[error("port `{0}` is inbound, not outbound")]
    NotOutbound(String),

    /// An inbound operation targeted an outbound port.
    #[error("port `{0}` is outbound, not inbound")]
    NotInbound(String),

    /// The api spec declared the same port name twice.
    #[error("port `{0}` is declared more than once")]
    DuplicatePort(String),
}
