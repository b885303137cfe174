//! Prelude module for convenient imports.
//!
//! ```
//! use teaport::prelude::*;
//! ```

pub use crate::api::{Api, ApiSpec, CommandPort, SubscriptionPort};
pub use crate::application::Application;
pub use crate::command::Cmd;
pub use crate::error::RuntimeError;
pub use crate::middleware::{LoggingMiddleware, Middleware};
pub use crate::port::{InboundPort, OutboundPort, Ports, Responder};
pub use crate::subscription::Sub;
