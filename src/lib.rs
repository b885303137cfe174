//! # Teaport - Effect-Port Dispatch Runtime
//!
//! Teaport lets a purely functional model/update application (in the Elm
//! Architecture style) perform effects without the update function doing any
//! I/O. `update` only returns *descriptions* of effects ([`Cmd`]) and of the
//! listeners it currently wants ([`Sub`]); the runtime turns those
//! descriptions into calls against externally supplied port handlers and
//! turns port events back into dispatched messages.
//!
//! ## Architecture
//!
//! 1. **Model**: your application state, replaced wholesale on every
//!    transition
//! 2. **Msg**: events that can change the state
//! 3. **Update**: pure function processing messages into a new model and a
//!    command
//! 4. **Subscriptions**: pure function deriving the active listener set from
//!    the model
//! 5. **Ports**: named boundaries to external effectful code, declared once
//!    in an [`ApiSpec`]
//!
//! ## Core Components
//!
//! - [`Application`](application::Application): owns the model and drives
//!   the init/update/subscriptions cycle
//! - [`Cmd`](command::Cmd): declarative one-shot effects
//! - [`Sub`](subscription::Sub): declarative ongoing listeners
//! - [`ApiSpec`](api::ApiSpec) / [`Api`](api::Api): port declarations and
//!   the typed helpers built from them
//! - [`Ports`](port::Ports): the stable port objects external code attaches
//!   to
//!
//! ## Example
//!
//! ```
//! use serde_json::{json, Value};
//! use teaport::prelude::*;
//!
//! #[derive(Debug, Clone)]
//! enum Msg {
//!     Got(i64),
//! }
//!
//! let spec = ApiSpec::new().outbound("log").inbound("number");
//! let api = Api::new(&spec)?;
//! let log = api.command("log")?;
//! let number = api.subscription("number")?;
//!
//! let app = Application::new(
//!     move |flags: i64| (flags, log.send("started")),
//!     move |_model: &i64| number.listen(|data: Value| Msg::Got(data.as_i64().unwrap_or(0))),
//!     |model: i64, msg: Msg| match msg {
//!         Msg::Got(n) => (model + n, Cmd::none()),
//!     },
//!     spec,
//! )?;
//!
//! app.ports().outbound("log")?.subscribe(|data, _responder| {
//!     println!("log: {data}");
//! });
//!
//! app.run(40)?;
//! app.ports().inbound("number")?.send(json!(2))?;
//! assert_eq!(app.state()?, 42);
//! # Ok::<(), teaport::RuntimeError>(())
//! ```
//!
//! ## Ordering guarantees
//!
//! Commands from one transition fully resolve, in declaration order, before
//! the commands of any transition they trigger; the active subscription set
//! is replaced at every transition, so inbound events always route through
//! the set of the most recently completed transition. See
//! [`application`] for the details.

pub mod api;
pub mod application;
pub mod command;
pub mod error;
pub mod middleware;
pub mod port;
pub mod prelude;
pub mod subscription;

pub use crate::error::RuntimeError;
