//! Text grammar: literals, text functions and `+` concatenation.

mod common;

use common::{parse_err, record, string};
use gdexpr_core::{ErrorKind, ValueKind};

#[test]
fn literals_joined_by_plus() {
    assert_eq!(
        string(r#""a"+"b""#).unwrap(),
        vec![r#"literal "a""#, r#"const "+""#, r#"literal "b""#]
    );
}

#[test]
fn literal_and_object_function() {
    assert_eq!(
        string(r#""Hi " + Player.Layer()"#).unwrap(),
        vec![
            r#"literal "Hi ""#,
            r#"const " + ""#,
            "object Player.Layer []",
        ]
    );
}

#[test]
fn surrounding_whitespace_is_not_reported() {
    assert_eq!(string(r#"  "a"  "#).unwrap(), vec![r#"literal "a""#]);
}

#[test]
fn escaped_quotes_are_decoded() {
    assert_eq!(
        string(r#""say \"hi\"""#).unwrap(),
        vec![r#"literal "say \"hi\"""#]
    );
}

#[test]
fn structural_characters_inside_literals_are_inert() {
    assert_eq!(
        string(r#""f(x). " + "y""#).unwrap(),
        vec![r#"literal "f(x). ""#, r#"const " + ""#, r#"literal "y""#]
    );
}

#[test]
fn numeric_arguments_switch_to_the_numeric_grammar() {
    let rec = record(r#""Score: " + ToString(Random(10))"#, ValueKind::Text).unwrap();
    assert_eq!(rec.subs, vec![(ValueKind::Number, "Random(10)".to_string())]);
    let to_string = rec.calls.last().unwrap();
    assert_eq!(to_string.function_name, "ToString");
    assert_eq!(
        to_string.arguments[0].parsed().unwrap(),
        &vec![r#"static Random ["10"]"#.to_string()]
    );
}

#[test]
fn behavior_text_function() {
    assert_eq!(
        string("Player.Platformer::State()").unwrap(),
        vec!["behavior Player.Platformer::State []"]
    );
}

#[test]
fn type_specific_and_global_objects() {
    assert_eq!(
        string("Score~Label.String() + Hud.String()").unwrap(),
        vec![
            "object Score Label.String []",
            r#"const " + ""#,
            "object Hud.String []",
        ]
    );
    assert_eq!(
        string("Enemy.AnimationName()").unwrap(),
        vec!["object Enemy.AnimationName []"]
    );
}

#[test]
fn arity_with_one_optional_parameter() {
    assert_eq!(
        string(r#"Trim("a")"#).unwrap(),
        vec![r#"static Trim ["\"a\"", "\"\""]"#]
    );
    assert!(string(r#"Trim("a", "b")"#).is_ok());
    for text in ["Trim()", r#"Trim("a", "b", "c")"#] {
        let err = parse_err(text, ValueKind::Text);
        assert_eq!(err.kind, ErrorKind::ArityMismatch, "{text}");
        assert_eq!(err.position(), 4, "{text}");
    }
}

#[test]
fn declared_default_fills_omitted_optional() {
    assert_eq!(
        string(r#"SubStr("abc", 1)"#).unwrap(),
        vec![r#"static SubStr ["\"abc\"", " 1", "1"]"#]
    );
}

#[test]
fn generator_only_placeholder() {
    let rec = record("SceneName()", ValueKind::Text).unwrap();
    assert_eq!(rec.events, vec![r#"static SceneName [""]"#]);
    assert!(rec.subs.is_empty());
}

#[test]
fn object_names_in_raw_arguments_are_trimmed() {
    let rec = record("Player.VariableString( Score )", ValueKind::Text).unwrap();
    assert_eq!(rec.events, vec![r#"object Player.VariableString ["Score"]"#]);
}

#[test]
fn reparsing_is_idempotent() {
    for text in [
        r#""a" + UpperCase("b") + Player.Layer()"#,
        r#""a""b""#,
        r#""unterminated"#,
        "Enemy.Platformer::State()",
    ] {
        assert_eq!(string(text), string(text), "{text}");
    }
}
