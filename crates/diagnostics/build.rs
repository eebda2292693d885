//! Generates the diagnostic tables from `spec/diagnostics.jsonc`.
//!
//! Every entry is validated once into an [`Entry`], then rendered into four
//! files under `OUT_DIR`:
//! - `generated_codes.rs`: one `GDX` constant per entry plus `ALL`
//! - `generated_explain.rs`: id → long description
//! - `generated_severity.rs`: id → default severity
//! - `generated_templates.rs`: (id, variant) → message template

use std::collections::{BTreeSet, HashSet};
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use gdexpr_jsonc::strip_jsonc;

const CATALOGUE: &str = "spec/diagnostics.jsonc";
const HEADER: &str = "// Generated by build.rs from spec/diagnostics.jsonc. Edit the catalogue, not this file.\n\n";

struct Entry {
    id: String,
    const_name: String,
    summary: String,
    description: String,
    severity: &'static str,
    templates: Vec<(String, String)>,
}

fn main() {
    println!("cargo:rerun-if-changed={CATALOGUE}");

    let raw = fs::read_to_string(CATALOGUE)
        .unwrap_or_else(|e| panic!("cannot read {CATALOGUE}: {e}"));
    let doc: serde_json::Value = serde_json::from_str(&strip_jsonc(&raw))
        .unwrap_or_else(|e| panic!("{CATALOGUE} is not valid JSON: {e}"));
    let list = doc["diagnostics"]
        .as_array()
        .unwrap_or_else(|| panic!("{CATALOGUE}: top-level `diagnostics` must be an array"));

    let entries = load(list);
    let out = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));

    emit(&out, "generated_codes.rs", &format!("{HEADER}{}", codes(&entries)));
    emit(&out, "generated_explain.rs", &lookup(&entries, |e| {
        vec![(format!("\"{}\"", e.id), format!("Some(\"{}\")", escape(&e.description)))]
    }, "id"));
    emit(&out, "generated_severity.rs", &format!("{HEADER}{}", lookup(&entries, |e| {
        vec![(format!("\"{}\"", e.id), format!("Some({})", e.severity))]
    }, "id")));
    emit(&out, "generated_templates.rs", &format!("{HEADER}{}", lookup(&entries, |e| {
        e.templates
            .iter()
            .map(|(variant, text)| {
                (format!("(\"{}\", \"{variant}\")", e.id), format!("Some(\"{}\")", escape(text)))
            })
            .collect()
    }, "(id, variant)")));
}

// ── Validation ──────────────────────────────────────────────────────────

fn load(list: &[serde_json::Value]) -> Vec<Entry> {
    let mut ids = HashSet::new();
    let mut names = HashSet::new();

    list.iter()
        .enumerate()
        .map(|(i, raw)| {
            let field = |key: &str| -> String {
                raw[key]
                    .as_str()
                    .unwrap_or_else(|| panic!("entry {i}: `{key}` must be a string"))
                    .to_string()
            };
            let id = field("id");
            let at = format!("entry {i} ({id})");

            assert!(is_code(&id), "{at}: id must be GDX followed by four digits");
            assert!(ids.insert(id.clone()), "{at}: id used twice");

            let const_name = field("constName");
            assert!(
                is_screaming_snake(&const_name),
                "{at}: constName `{const_name}` is not SCREAMING_SNAKE_CASE"
            );
            assert!(names.insert(const_name.clone()), "{at}: constName used twice");

            let severity = match field("severity").as_str() {
                "error" => "Severity::Error",
                "warn" => "Severity::Warn",
                "info" => "Severity::Info",
                other => panic!("{at}: unknown severity `{other}`"),
            };

            let keys: HashSet<&str> = raw["contextKeys"]
                .as_array()
                .unwrap_or_else(|| panic!("{at}: `contextKeys` must be an array"))
                .iter()
                .map(|k| k.as_str().unwrap_or_else(|| panic!("{at}: context keys are strings")))
                .collect();

            let object = raw["messageTemplates"]
                .as_object()
                .unwrap_or_else(|| panic!("{at}: `messageTemplates` must be an object"));
            assert!(!object.is_empty(), "{at}: no message templates");

            let templates = object
                .iter()
                .map(|(variant, text)| {
                    let text = text
                        .as_str()
                        .unwrap_or_else(|| panic!("{at}: template `{variant}` must be a string"));
                    for key in placeholders(text) {
                        assert!(
                            keys.contains(key),
                            "{at}: template `{variant}` uses `{{{key}}}` but contextKeys does not declare it"
                        );
                    }
                    (variant.clone(), text.to_string())
                })
                .collect();

            Entry {
                summary: field("summary"),
                description: field("description"),
                id,
                const_name,
                severity,
                templates,
            }
        })
        .collect()
}

fn is_code(id: &str) -> bool {
    id.len() == 7 && id.starts_with("GDX") && id[3..].bytes().all(|b| b.is_ascii_digit())
}

fn is_screaming_snake(name: &str) -> bool {
    name.bytes().next().is_some_and(|b| b.is_ascii_uppercase())
        && name
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}

/// Names between `{` and `}`; an unclosed brace ends the scan.
fn placeholders(template: &str) -> BTreeSet<&str> {
    let mut found = BTreeSet::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(len) = rest[open + 1..].find('}') else {
            break;
        };
        let key = rest[open + 1..open + 1 + len].trim();
        if !key.is_empty() {
            found.insert(key);
        }
        rest = &rest[open + len + 2..];
    }
    found
}

// ── Rendering ───────────────────────────────────────────────────────────

fn codes(entries: &[Entry]) -> String {
    let mut src = String::new();
    for e in entries {
        let _ = writeln!(src, "/// {}\npub const {}: &str = \"{}\";\n", e.summary, e.const_name, e.id);
    }
    src.push_str("/// Every diagnostic code, in catalogue order.\npub const ALL: &[&str] = &[\n");
    for e in entries {
        let _ = writeln!(src, "    {},", e.const_name);
    }
    src.push_str("];\n");
    src
}

/// A `match` over `scrutinee` with one arm per generated pair and a `None`
/// fallback.
fn lookup(entries: &[Entry], arms: impl Fn(&Entry) -> Vec<(String, String)>, scrutinee: &str) -> String {
    let mut src = format!("match {scrutinee} {{\n");
    for (pattern, value) in entries.iter().flat_map(arms) {
        let _ = writeln!(src, "    {pattern} => {value},");
    }
    src.push_str("    _ => None,\n}\n");
    src
}

fn escape(text: &str) -> String {
    text.chars().flat_map(char::escape_default).collect()
}

fn emit(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap_or_else(|e| panic!("cannot write {name}: {e}"));
}
