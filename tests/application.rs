// Integration tests for the application lifecycle: construction, start-up,
// dispatch, and port wiring.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use teaport::prelude::*;

#[derive(Debug, Clone)]
enum Msg {
    Inc,
    Dec,
    Add(i64),
    Mul(i64),
    Kick,
}

fn arith(model: i64, msg: Msg) -> (i64, Cmd<Msg>) {
    match msg {
        Msg::Inc => (model + 1, Cmd::none()),
        Msg::Dec => (model - 1, Cmd::none()),
        Msg::Add(n) => (model + n, Cmd::none()),
        Msg::Mul(n) => (model * n, Cmd::none()),
        Msg::Kick => (model, Cmd::none()),
    }
}

type Recorder = Arc<Mutex<Vec<String>>>;

fn record_strings(recorder: &Recorder) -> impl Fn(Value, Responder<Msg>) + Send + Sync + 'static {
    let recorder = recorder.clone();
    move |data, _responder| {
        recorder
            .lock()
            .push(data.as_str().unwrap_or_default().to_owned());
    }
}

#[test]
fn initializes_state_from_flags() {
    let app = Application::new(
        |n: i64| (n, Cmd::none()),
        |_: &i64| Sub::none(),
        |_: i64, _: Msg| unreachable!("update not expected"),
        ApiSpec::new(),
    )
    .unwrap();

    app.run(42).unwrap();
    assert_eq!(app.state().unwrap(), 42);
}

#[test]
fn state_before_run_fails() {
    let app = Application::new(
        |n: i64| (n, Cmd::none()),
        |_: &i64| Sub::none(),
        |_: i64, _: Msg| unreachable!("update not expected"),
        ApiSpec::new(),
    )
    .unwrap();

    assert!(matches!(app.state(), Err(RuntimeError::NotStarted)));
}

#[test]
fn dispatch_before_run_fails() {
    let app = Application::new(
        |n: i64| (n, Cmd::none()),
        |_: &i64| Sub::none(),
        arith,
        ApiSpec::new(),
    )
    .unwrap();

    let err = app.dispatch(Msg::Inc).unwrap_err();
    assert!(matches!(err, RuntimeError::NotStarted));
    assert_eq!(err.to_string(), "run() must be called before dispatch()");
}

#[test]
fn runs_the_initial_command() {
    let spec = ApiSpec::new().outbound("log");
    let api = Api::new(&spec).unwrap();
    let log = api.command("log").unwrap();

    let app = Application::new(
        move |n: i64| (n, log.send("hi")),
        |_: &i64| Sub::none(),
        |_: i64, _: Msg| unreachable!("update not expected"),
        spec,
    )
    .unwrap();

    let recorded: Recorder = Arc::new(Mutex::new(Vec::new()));
    app.ports()
        .outbound("log")
        .unwrap()
        .subscribe(record_strings(&recorded));

    app.run(12).unwrap();
    assert_eq!(app.state().unwrap(), 12);
    assert_eq!(*recorded.lock(), vec!["hi"]);
}

#[test]
fn dispatch_updates_the_state() {
    let app = Application::new(
        |n: i64| (n, Cmd::none()),
        |_: &i64| Sub::none(),
        arith,
        ApiSpec::new(),
    )
    .unwrap();

    app.run(12).unwrap();
    app.dispatch(Msg::Inc).unwrap();
    assert_eq!(app.state().unwrap(), 13);
    app.dispatch(Msg::Dec).unwrap();
    app.dispatch(Msg::Dec).unwrap();
    app.dispatch(Msg::Dec).unwrap();
    assert_eq!(app.state().unwrap(), 10);
}

#[test]
fn active_subscriptions_route_inbound_events() {
    let spec = ApiSpec::new().inbound("number");
    let api = Api::new(&spec).unwrap();
    let number = api.subscription("number").unwrap();

    let app = Application::new(
        |n: i64| (n, Cmd::none()),
        move |_: &i64| number.listen(|data: Value| Msg::Add(data.as_i64().unwrap_or(0))),
        arith,
        spec,
    )
    .unwrap();

    app.run(12).unwrap();
    app.ports().inbound("number").unwrap().send(10).unwrap();
    assert_eq!(app.state().unwrap(), 22);
}

#[test]
fn inactive_subscriptions_are_skipped() {
    let spec = ApiSpec::new().inbound("number");

    let app = Application::new(
        |n: i64| (n, Cmd::none()),
        |_: &i64| Sub::none(),
        arith,
        spec,
    )
    .unwrap();

    app.run(12).unwrap();
    app.ports().inbound("number").unwrap().send(10).unwrap();
    assert_eq!(app.state().unwrap(), 12);
}

#[test]
fn batched_subscriptions_dispatch_in_declaration_order() {
    let spec = ApiSpec::new().inbound("number");
    let api = Api::new(&spec).unwrap();
    let number = api.subscription("number").unwrap();

    // add-then-multiply: (12 + 10) * 10 = 220, distinguishable from
    // multiply-then-add (130).
    let app = Application::new(
        |n: i64| (n, Cmd::none()),
        move |_: &i64| {
            Sub::batch([
                number.listen(|data: Value| Msg::Add(data.as_i64().unwrap_or(0))),
                number.listen(|data: Value| Msg::Mul(data.as_i64().unwrap_or(0))),
            ])
        },
        arith,
        spec,
    )
    .unwrap();

    app.run(12).unwrap();
    app.ports().inbound("number").unwrap().send(10).unwrap();
    assert_eq!(app.state().unwrap(), 220);
}

#[test]
fn batched_commands_execute_in_declaration_order() {
    let spec = ApiSpec::new().outbound("log");
    let api = Api::new(&spec).unwrap();
    let log = api.command("log").unwrap();

    let app = Application::new(
        |n: i64| (n, Cmd::none()),
        |_: &i64| Sub::none(),
        move |model: i64, msg: Msg| match msg {
            Msg::Kick => (model, Cmd::batch([log.send("yo"), Cmd::msg(Msg::Inc)])),
            other => arith(model, other),
        },
        spec,
    )
    .unwrap();

    let recorded: Recorder = Arc::new(Mutex::new(Vec::new()));
    app.ports()
        .outbound("log")
        .unwrap()
        .subscribe(record_strings(&recorded));

    app.run(12).unwrap();
    app.dispatch(Msg::Kick).unwrap();
    assert_eq!(*recorded.lock(), vec!["yo"]);
    assert_eq!(app.state().unwrap(), 13);
}

#[test]
fn command_responses_are_dispatched() {
    let spec = ApiSpec::new().outbound_with_response("log");
    let api = Api::new(&spec).unwrap();
    let log = api.command("log").unwrap();

    let app = Application::new(
        move |n: i64| {
            (
                n,
                log.request("hi", |response: Value| {
                    Msg::Mul(response.as_i64().unwrap_or(0))
                })
                .unwrap(),
            )
        },
        |_: &i64| Sub::none(),
        arith,
        spec,
    )
    .unwrap();

    let recorded: Recorder = Arc::new(Mutex::new(Vec::new()));
    let inner = recorded.clone();
    app.ports()
        .outbound("log")
        .unwrap()
        .subscribe(move |data, responder| {
            inner
                .lock()
                .push(data.as_str().unwrap_or_default().to_owned());
            responder.respond(2).unwrap();
        });

    app.run(12).unwrap();
    assert_eq!(*recorded.lock(), vec!["hi"]);
    assert_eq!(app.state().unwrap(), 24);
}

#[test]
fn responding_without_a_handler_fails() {
    let spec = ApiSpec::new().outbound("log");
    let api = Api::new(&spec).unwrap();
    let log = api.command("log").unwrap();

    let app = Application::new(
        move |n: i64| (n, log.send("hi")),
        |_: &i64| Sub::none(),
        arith,
        spec,
    )
    .unwrap();

    let seen: Arc<Mutex<Option<RuntimeError>>> = Arc::new(Mutex::new(None));
    let inner = seen.clone();
    app.ports()
        .outbound("log")
        .unwrap()
        .subscribe(move |_data, responder| {
            assert!(!responder.expects_response());
            *inner.lock() = responder.respond(5).err();
        });

    app.run(12).unwrap();

    let err = seen.lock().take().expect("respond should have failed");
    assert!(matches!(err, RuntimeError::NoResponseExpected(ref port) if port == "log"));
    assert_eq!(err.to_string(), "no response expected on port `log`");
    // The stray response never reached the update function.
    assert_eq!(app.state().unwrap(), 12);
}
