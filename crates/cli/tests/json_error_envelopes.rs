//! Ensure CLI command failures honor `--output json`.

use std::fs;
use std::process::Command;

use assert_cmd::cargo;

fn gdexpr_cmd() -> Command {
    Command::new(cargo::cargo_bin!("gdexpr"))
}

fn envelope(args: &[&str]) -> serde_json::Value {
    let output = gdexpr_cmd().args(args).output().expect("run command");
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid json envelope");
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "command_failed");
    json
}

#[test]
fn parse_missing_file_emits_json_error_envelope() {
    let json = envelope(&["parse", "nope-does-not-exist.txt", "--output", "json"]);
    assert!(
        json["message"]
            .as_str()
            .is_some_and(|m| m.contains("failed to read expression file")),
        "unexpected message: {}",
        json["message"]
    );
}

#[test]
fn missing_catalog_path_emits_json_error_envelope() {
    let json = envelope(&[
        "check",
        "-e",
        "1",
        "--catalog",
        "missing-catalog.jsonc",
        "--output",
        "json",
    ]);
    assert!(
        json["message"]
            .as_str()
            .is_some_and(|m| m.contains("catalog file")),
        "unexpected message: {}",
        json["message"]
    );
}

#[test]
fn invalid_scene_emits_json_error_envelope() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scene.jsonc");
    fs::write(
        &path,
        r#"{ "objects": [
          { "name": "A", "type": "Sprite" },
          { "name": "A", "type": "Text" },
        ] }"#,
    )
    .expect("write scene");

    let json = envelope(&[
        "check",
        "-e",
        "1",
        "--scene",
        &path.to_string_lossy(),
        "--output",
        "json",
    ]);
    assert!(
        json["message"]
            .as_str()
            .is_some_and(|m| m.contains("duplicate")),
        "unexpected message: {}",
        json["message"]
    );
}
