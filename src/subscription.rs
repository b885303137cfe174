use std::sync::Arc;

use serde_json::Value;

/// Shared handler converting inbound port data into a message.
pub(crate) type ListenHandler<Msg> = Arc<dyn Fn(Value) -> Msg + Send + Sync>;

/// A single listener on a named inbound port.
pub struct ListenSub<Msg> {
    pub(crate) port: Arc<str>,
    pub(crate) handler: ListenHandler<Msg>,
}

impl<Msg> ListenSub<Msg> {
    /// Name of the inbound port this subscription listens on.
    pub fn port(&self) -> &str {
        &self.port
    }
}

impl<Msg> Clone for ListenSub<Msg> {
    fn clone(&self) -> Self {
        Self {
            port: self.port.clone(),
            handler: self.handler.clone(),
        }
    }
}

/// A declarative description of the listeners the application currently
/// wants active.
///
/// The runtime recomputes `subscriptions(model)` after every transition and
/// replaces the active set wholesale; nothing is diffed or retained. A port
/// listened to in one transition but not the next receives no further
/// dispatch.
///
/// # Examples
///
/// ```
/// use serde_json::Value;
/// use teaport::prelude::*;
///
/// enum Msg {
///     Got(i64),
/// }
///
/// let sub: Sub<Msg> = Sub::listen("number", |data: Value| {
///     Msg::Got(data.as_i64().unwrap_or(0))
/// });
/// ```
pub enum Sub<Msg> {
    /// Listen to nothing.
    None,
    /// Listen on a named inbound port.
    Listen(ListenSub<Msg>),
    /// All child subscriptions, in declaration order.
    Batch(Vec<Sub<Msg>>),
}

impl<Msg> Sub<Msg> {
    /// A subscription to nothing.
    pub fn none() -> Self {
        Sub::None
    }

    /// Listen on the named inbound port; `handler` converts each arriving
    /// payload into a message.
    pub fn listen<H>(port: &str, handler: H) -> Self
    where
        H: Fn(Value) -> Msg + Send + Sync + 'static,
    {
        Sub::Listen(ListenSub {
            port: Arc::from(port),
            handler: Arc::new(handler),
        })
    }

    /// Group subscriptions. Declaration order is the routing order for
    /// inbound events that match more than one listener.
    pub fn batch(subs: impl IntoIterator<Item = Sub<Msg>>) -> Self {
        Sub::Batch(subs.into_iter().collect())
    }

    /// Order-preserving depth-first flattening into the active listener list.
    pub(crate) fn flatten(self) -> Vec<ListenSub<Msg>> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(self, out: &mut Vec<ListenSub<Msg>>) {
        match self {
            Sub::None => {}
            Sub::Listen(listen) => out.push(listen),
            Sub::Batch(subs) => {
                for sub in subs {
                    sub.flatten_into(out);
                }
            }
        }
    }
}

impl<Msg> Clone for Sub<Msg> {
    fn clone(&self) -> Self {
        match self {
            Sub::None => Sub::None,
            Sub::Listen(listen) => Sub::Listen(listen.clone()),
            Sub::Batch(subs) => Sub::Batch(subs.clone()),
        }
    }
}
