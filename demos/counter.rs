//! Minimal counter wired through ports.
//!
//! Keystrokes arrive through the inbound `key` port; the current count goes
//! out through the outbound `print` port.

use serde_json::{json, Value};
use teaport::prelude::*;

#[derive(Debug, Clone)]
enum Msg {
    Increment,
    Decrement,
    Report,
}

fn main() -> Result<(), RuntimeError> {
    let spec = ApiSpec::new().outbound("print").inbound("key");
    let api = Api::new(&spec)?;
    let print = api.command("print")?;
    let key = api.subscription("key")?;

    let app = Application::new(
        |_: ()| (0i64, Cmd::none()),
        move |_: &i64| {
            key.listen(|data: Value| match data.as_str() {
                Some("+") => Msg::Increment,
                Some("-") => Msg::Decrement,
                _ => Msg::Report,
            })
        },
        move |model: i64, msg: Msg| match msg {
            Msg::Increment => (model + 1, Cmd::none()),
            Msg::Decrement => (model - 1, Cmd::none()),
            Msg::Report => (model, print.send(json!({ "count": model }))),
        },
        spec,
    )?
    .with_middleware(LoggingMiddleware);

    app.ports().outbound("print")?.subscribe(|data, _responder| {
        println!("{data}");
    });

    app.run(())?;

    for input in ["+", "+", "+", "-", "?"] {
        app.ports().inbound("key")?.send(input)?;
    }

    Ok(())
}
