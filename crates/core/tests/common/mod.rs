//! Shared test helpers for `gdexpr_core` integration tests.

#![allow(unreachable_pub)]

use gdexpr_core::{
    Catalog, ExpressionCallbacks, ExpressionParser, FunctionSignature, ParseError, ParseOptions,
    ResolvedCall, Scene, UnknownFunctionPolicy, ValueKind,
};
use std::path::Path;
use std::sync::LazyLock;

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e))
}

/// Catalog loaded once per test binary via LazyLock.
pub static CATALOG: LazyLock<Catalog> = LazyLock::new(|| {
    Catalog::from_jsonc(&fixture("catalog.jsonc"))
        .unwrap_or_else(|e| panic!("failed to load catalog fixture: {e}"))
});

/// Scene loaded once per test binary via LazyLock.
pub static SCENE: LazyLock<Scene> = LazyLock::new(|| {
    Scene::from_jsonc(&fixture("scene.jsonc"))
        .unwrap_or_else(|e| panic!("failed to load scene fixture: {e}"))
});

/// Parser over the fixtures with default options.
#[allow(dead_code)]
pub fn parser() -> ExpressionParser<'static, Catalog, Scene> {
    ExpressionParser::new(&*CATALOG, &*SCENE)
}

/// Parser that only lets built-in math functions through unresolved.
#[allow(dead_code)]
pub fn strict_parser() -> ExpressionParser<'static, Catalog, Scene> {
    parser().with_options(ParseOptions {
        unknown_functions: UnknownFunctionPolicy::BuiltinsOnly,
        ..ParseOptions::default()
    })
}

// ─── Recording consumer ─────────────────────────────────────────────────────

/// Records every event as a line of text. Sub-expressions are parsed with the
/// same parser; their events become the `Sub` value of the argument.
#[allow(dead_code)]
pub struct Recorder {
    parser: ExpressionParser<'static, Catalog, Scene>,
    /// Top-level events, in order.
    pub events: Vec<String>,
    /// Resolved calls, in order.
    pub calls: Vec<ResolvedCall<Vec<String>>>,
    /// Sub-expression requests made at this level.
    pub subs: Vec<(ValueKind, String)>,
}

#[allow(dead_code)]
impl Recorder {
    /// Empty recorder that recurses with `parser`.
    pub fn new(parser: ExpressionParser<'static, Catalog, Scene>) -> Self {
        Self {
            parser,
            events: Vec::new(),
            calls: Vec::new(),
            subs: Vec::new(),
        }
    }

    fn record_call(&mut self, label: String, call: ResolvedCall<Vec<String>>) {
        let args: Vec<&str> = call.arguments.iter().map(|a| a.text()).collect();
        self.events.push(format!("{label} {args:?}"));
        self.calls.push(call);
    }

    fn nested(&mut self, text: &str, kind: ValueKind) -> Result<Vec<String>, ParseError> {
        self.subs.push((kind, text.to_string()));
        let mut inner = Recorder::new(self.parser);
        self.parser.parse(text, kind, &mut inner)?;
        Ok(inner.events)
    }
}

impl ExpressionCallbacks for Recorder {
    type Sub = Vec<String>;

    fn on_constant_token(&mut self, text: &str) {
        self.events.push(format!("const {text:?}"));
    }

    fn on_static_function(&mut self, call: ResolvedCall<Self::Sub>, _: &FunctionSignature) {
        if call.is_text_literal() {
            self.events.push(format!("literal {:?}", call.arguments[0].text()));
            self.calls.push(call);
            return;
        }
        let label = format!("static {}", call.function_name);
        self.record_call(label, call);
    }

    fn on_object_function(&mut self, call: ResolvedCall<Self::Sub>, _: &FunctionSignature) {
        let label = format!(
            "object {}.{}",
            call.owner_object.as_deref().unwrap_or_default(),
            call.function_name
        );
        self.record_call(label, call);
    }

    fn on_object_behavior_function(
        &mut self,
        call: ResolvedCall<Self::Sub>,
        _: &FunctionSignature,
    ) {
        let label = format!(
            "behavior {}.{}::{}",
            call.owner_object.as_deref().unwrap_or_default(),
            call.owner_behavior.as_deref().unwrap_or_default(),
            call.function_name
        );
        self.record_call(label, call);
    }

    fn on_sub_numeric_expression(&mut self, text: &str) -> Result<Self::Sub, ParseError> {
        self.nested(text, ValueKind::Number)
    }

    fn on_sub_string_expression(&mut self, text: &str) -> Result<Self::Sub, ParseError> {
        self.nested(text, ValueKind::Text)
    }
}

// ─── Parse helpers ──────────────────────────────────────────────────────────

/// Parse with `parser` and return the recorder.
#[allow(dead_code)]
pub fn record_with(
    parser: ExpressionParser<'static, Catalog, Scene>,
    text: &str,
    kind: ValueKind,
) -> Result<Recorder, ParseError> {
    let mut recorder = Recorder::new(parser);
    parser.parse(text, kind, &mut recorder)?;
    Ok(recorder)
}

/// Parse with the default parser and return the recorder.
#[allow(dead_code)]
pub fn record(text: &str, kind: ValueKind) -> Result<Recorder, ParseError> {
    record_with(parser(), text, kind)
}

/// Events of a numeric parse.
#[allow(dead_code)]
pub fn numeric(text: &str) -> Result<Vec<String>, ParseError> {
    record(text, ValueKind::Number).map(|r| r.events)
}

/// Events of a text parse.
#[allow(dead_code)]
pub fn string(text: &str) -> Result<Vec<String>, ParseError> {
    record(text, ValueKind::Text).map(|r| r.events)
}

/// The error of a parse that must fail.
#[allow(dead_code)]
pub fn parse_err(text: &str, kind: ValueKind) -> ParseError {
    match record(text, kind) {
        Ok(r) => panic!("expected {text:?} to fail, got events {:?}", r.events),
        Err(e) => e,
    }
}
