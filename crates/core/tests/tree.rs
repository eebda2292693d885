//! Tree builder output and its JSON form.

mod common;

use common::{CATALOG, SCENE};
use gdexpr_core::{Fragment, ParseOptions, ValueKind, parse_expression, result_to_pretty_json};

#[test]
fn tree_mirrors_the_event_stream() {
    let result = parse_expression(
        r#""Lives: " + ToString(Player.Platformer::JumpSpeed() + 1)"#,
        ValueKind::Text,
        &*CATALOG,
        &*SCENE,
        ParseOptions::default(),
    );
    assert!(result.is_ok(), "{:?}", result.diagnostics);
    let expression = result.expression.unwrap();
    assert!(matches!(&expression.fragments[0], Fragment::Literal { value, .. } if value == "Lives: "));
    assert!(matches!(&expression.fragments[1], Fragment::Constant { text } if text == " + "));
    assert_eq!(expression.call_count(), 2);

    let to_string = expression.calls().next().unwrap();
    let inner = to_string.arguments[0].parsed().unwrap();
    assert_eq!(inner.kind, ValueKind::Number);
    let jump = inner.calls().next().unwrap();
    assert_eq!(jump.function_name, "JumpSpeed");
    assert_eq!(jump.owner_behavior.as_deref(), Some("Platformer"));
}

#[test]
fn json_form_is_tagged() {
    let result = parse_expression(
        "Player.X() + 1",
        ValueKind::Number,
        &*CATALOG,
        &*SCENE,
        ParseOptions::default(),
    );
    let json: serde_json::Value = serde_json::from_str(&result_to_pretty_json(&result)).unwrap();
    assert_eq!(json["diagnostics"].as_array().map(Vec::len), Some(0));
    let call = &json["expression"]["fragments"][0];
    assert_eq!(call["type"], "call");
    assert_eq!(call["functionName"], "X");
    assert_eq!(call["scope"], "object");
    assert_eq!(call["ownerObject"], "Player");
    assert_eq!(call["arguments"][0]["type"], "text");
    assert_eq!(json["expression"]["fragments"][1]["text"], " + 1");
}

#[test]
fn failed_parse_serializes_without_expression() {
    let result = parse_expression(
        "Nope(",
        ValueKind::Number,
        &*CATALOG,
        &*SCENE,
        ParseOptions::default(),
    );
    let json: serde_json::Value = serde_json::from_str(&result_to_pretty_json(&result)).unwrap();
    assert!(json.get("expression").is_none());
    assert_eq!(json["diagnostics"][0]["id"], "GDX1002");
}
