use std::rc::Rc;

use rtlify::protocol::{Command, Response, dispatch, dispatch_json};
use rtlify::{Engine, EngineConfig, Tick};
use rtlify_dom::{Document, DocumentConfig};
use rtlify_traits::{DummyShellProvider, ManualClock};
use serde_json::{Value, json};

fn engine_with_rtl_heading() -> Engine {
    let mut doc = Document::new(DocumentConfig::default());
    let h1 = doc.append_element(0, "h1", &[]).unwrap();
    doc.append_text(h1, "عنوان الصفحة").unwrap();
    let p = doc.append_element(0, "p", &[]).unwrap();
    doc.append_text(p, "English body text").unwrap();
    Engine::new(doc.into_shared(), EngineConfig::default(), Rc::new(DummyShellProvider))
        .unwrap()
        .with_clock(Rc::new(ManualClock::new()))
}

fn settle(engine: &mut Engine) {
    while engine.tick() == Tick::Busy {}
}

fn send(engine: &mut Engine, request: Value) -> Value {
    let reply = dispatch_json(Some(engine), &request.to_string());
    serde_json::from_str(&reply).unwrap()
}

#[test]
fn test_enable_then_get_stats() {
    let mut engine = engine_with_rtl_heading();

    assert_eq!(send(&mut engine, json!({"action": "enable"})), json!({"success": true}));
    settle(&mut engine);

    let reply = send(&mut engine, json!({"action": "getStats"}));
    assert_eq!(
        reply,
        json!({
            "success": true,
            "stats": {"count": 1, "meanRatio": 1.0, "byCategory": {"heading": 1}}
        })
    );
}

#[test]
fn test_rescan_fails_while_disabled() {
    let mut engine = engine_with_rtl_heading();

    let reply = send(&mut engine, json!({"action": "rescan"}));
    assert_eq!(reply["success"], false);
    assert!(reply["error"].as_str().is_some_and(|error| !error.is_empty()));

    send(&mut engine, json!({"action": "enable"}));
    settle(&mut engine);
    assert_eq!(send(&mut engine, json!({"action": "rescan"}))["success"], true);
}

#[test]
fn test_disable_clears_stats() {
    let mut engine = engine_with_rtl_heading();
    dispatch(Some(&mut engine), Command::Enable);
    settle(&mut engine);

    assert_eq!(dispatch(Some(&mut engine), Command::Disable), Response::ok());
    let reply = dispatch(Some(&mut engine), Command::GetStats);
    assert_eq!(reply.stats.map(|stats| stats.count), Some(0));
}

#[test]
fn test_malformed_requests_get_failure_replies() {
    let mut engine = engine_with_rtl_heading();
    for request in ["", "{}", r#"{"action": "reboot"}"#, r#"["enable"]"#] {
        let reply: Response = serde_json::from_str(&dispatch_json(Some(&mut engine), request)).unwrap();
        assert!(!reply.success, "{request:?} should fail");
        assert!(reply.error.is_some());
    }
    assert!(!engine.is_enabled());
}

#[test]
fn test_context_without_engine() {
    for command in [Command::Enable, Command::GetStats, Command::Rescan] {
        let reply = dispatch(None, command);
        assert!(!reply.success);
    }
}

#[test]
fn test_destroyed_engine_reports_errors() {
    let mut engine = engine_with_rtl_heading();
    engine.destroy().unwrap();
    let reply = send(&mut engine, json!({"action": "getStats"}));
    assert_eq!(reply, json!({"success": false, "error": "Engine has been destroyed"}));
}
