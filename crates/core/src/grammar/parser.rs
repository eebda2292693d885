use super::{
    bind::bind,
    builtins,
    callbacks::{ExpressionCallbacks, ResolvedArgument, ResolvedCall, TEXT_LITERAL_SIGNATURE},
    error::{ErrorKind, ParseError},
    literal::scan_literal,
    resolve::{Resolution, Unresolved, resolve},
    segment::{BoundaryKind, CallSite, Grammar, call_site, identifier_start, next_boundary},
};
use gdexpr_catalog::{FunctionCatalog, OwnerScope, SceneQuery, ValueKind};
use gdexpr_diagnostics::Span;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

/// Default cap on sub-expression nesting, see [`ParseOptions::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// What the numeric grammar does with a `name(` that does not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnknownFunctionPolicy {
    /// Pass it through as constant text for the evaluator to handle.
    #[default]
    PassThrough,
    /// Pass through only built-in math functions and grouping parentheses;
    /// anything else is [`ErrorKind::UnknownFunction`].
    BuiltinsOnly,
}

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseOptions {
    /// Policy for unresolved static calls in numeric expressions.
    pub unknown_functions: UnknownFunctionPolicy,
    /// Deepest sub-expression nesting accepted by consumers that recurse
    /// through the parser (the tree builder enforces it).
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            unknown_functions: UnknownFunctionPolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

// ─── Public API ─────────────────────────────────────────────────────────────

/// Parses expression text against a function catalog and a scene.
///
/// Holds only shared references, so it is `Copy` and can be handed to the
/// callbacks that run nested parses.
pub struct ExpressionParser<'a, C: ?Sized, S: ?Sized> {
    catalog: &'a C,
    scene: &'a S,
    options: ParseOptions,
}

impl<C: ?Sized, S: ?Sized> Clone for ExpressionParser<'_, C, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: ?Sized, S: ?Sized> Copy for ExpressionParser<'_, C, S> {}

impl<C: ?Sized, S: ?Sized> std::fmt::Debug for ExpressionParser<'_, C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionParser")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'a, C, S> ExpressionParser<'a, C, S>
where
    C: FunctionCatalog + ?Sized,
    S: SceneQuery + ?Sized,
{
    /// Create a parser with default options.
    pub fn new(catalog: &'a C, scene: &'a S) -> Self {
        Self {
            catalog,
            scene,
            options: ParseOptions::default(),
        }
    }

    /// Replace the options (builder pattern).
    #[must_use]
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Current options.
    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// The catalog calls are resolved against.
    pub fn catalog(&self) -> &'a C {
        self.catalog
    }

    /// The scene object names are resolved against.
    pub fn scene(&self) -> &'a S {
        self.scene
    }

    /// Parse `text` with the grammar for `kind`.
    pub fn parse<Cb>(&self, text: &str, kind: ValueKind, callbacks: &mut Cb) -> Result<(), ParseError>
    where
        Cb: ExpressionCallbacks + ?Sized,
    {
        match kind {
            ValueKind::Number => self.parse_numeric(text, callbacks),
            ValueKind::Text => self.parse_string(text, callbacks),
        }
    }

    /// Parse a numeric expression.
    ///
    /// Resolved calls are reported to `callbacks`; everything else (numbers,
    /// operators, math functions, grouping) is reported as constant text.
    #[instrument(level = "trace", skip_all, fields(kind = "number", len = text.len()))]
    pub fn parse_numeric<Cb>(&self, text: &str, callbacks: &mut Cb) -> Result<(), ParseError>
    where
        Cb: ExpressionCallbacks + ?Sized,
    {
        NumericMachine {
            parser: *self,
            text,
            callbacks,
            cursor: 0,
            constant_start: 0,
        }
        .run()
    }

    /// Parse a text expression: literals and text functions joined by `+`.
    #[instrument(level = "trace", skip_all, fields(kind = "text", len = text.len()))]
    pub fn parse_string<Cb>(&self, text: &str, callbacks: &mut Cb) -> Result<(), ParseError>
    where
        Cb: ExpressionCallbacks + ?Sized,
    {
        StringMachine {
            parser: *self,
            text,
            callbacks,
            cursor: 0,
            previous_end: None,
        }
        .run()
    }

    /// Bind a resolved call and hand it to the matching callback.
    fn emit_call<Cb>(
        &self,
        text: &str,
        callbacks: &mut Cb,
        site: &CallSite<'_>,
        resolution: Resolution<'_>,
    ) -> Result<usize, ParseError>
    where
        Cb: ExpressionCallbacks + ?Sized,
    {
        let written = site.written_name(text);
        let Some(arguments) = &site.arguments else {
            return Err(ParseError::new(
                ErrorKind::MissingArgumentList,
                site.member_span,
                "default",
                ctx!("function" => written),
            ));
        };
        let signature = resolution.signature();
        let bound = bind(callbacks, signature, arguments, written)?;
        let span = Span::new(site.start, arguments.close + 1);
        let scope = resolution.scope();
        debug!(function = written, %scope, "resolved call");
        let (function_name, owner_object, owner_behavior) = match resolution {
            Resolution::Static { .. } => (site.member.to_string(), None, None),
            Resolution::Object { object, .. } => (site.member.to_string(), Some(object), None),
            Resolution::Behavior {
                object,
                behavior,
                function,
                ..
            } => (function, Some(object), Some(behavior)),
        };
        let call = ResolvedCall {
            function_name,
            scope,
            owner_object,
            owner_behavior,
            arguments: bound,
            span,
        };
        match scope {
            OwnerScope::Static => callbacks.on_static_function(call, signature),
            OwnerScope::ObjectBound => callbacks.on_object_function(call, signature),
            OwnerScope::BehaviorBound => callbacks.on_object_behavior_function(call, signature),
        }
        Ok(arguments.close + 1)
    }
}

/// `UnknownFunction` for a site that did not resolve.
fn unknown_function(text: &str, site: &CallSite<'_>, why: &Unresolved) -> ParseError {
    let span = Span::new(site.start, site.member_span.end);
    let function = site.written_name(text);
    match (why, &site.owner) {
        (Unresolved::BehaviorNotAttached { object, behavior }, _) => ParseError::new(
            ErrorKind::UnknownFunction,
            span,
            "behaviorNotAttached",
            ctx!("function" => function, "object" => object.as_str(), "behavior" => behavior.as_str()),
        ),
        (Unresolved::NotFound, Some(owner)) => ParseError::new(
            ErrorKind::UnknownFunction,
            span,
            "object",
            ctx!("function" => site.member, "object" => owner.name.to_string()),
        ),
        (Unresolved::NotFound, None) => ParseError::new(
            ErrorKind::UnknownFunction,
            span,
            "static",
            ctx!("function" => function),
        ),
    }
}

// ─── Numeric grammar ────────────────────────────────────────────────────────

struct NumericMachine<'p, 't, 'c, C: ?Sized, S: ?Sized, Cb: ?Sized> {
    parser: ExpressionParser<'p, C, S>,
    text: &'t str,
    callbacks: &'c mut Cb,
    /// Where the next boundary search starts.
    cursor: usize,
    /// Start of constant text not yet reported.
    constant_start: usize,
}

impl<C, S, Cb> NumericMachine<'_, '_, '_, C, S, Cb>
where
    C: FunctionCatalog + ?Sized,
    S: SceneQuery + ?Sized,
    Cb: ExpressionCallbacks + ?Sized,
{
    fn run(mut self) -> Result<(), ParseError> {
        let text = self.text;
        while let Some(boundary) = next_boundary(text, self.cursor, Grammar::Numeric) {
            let site = call_site(text, self.cursor, boundary)?;
            if !site.is_well_formed() {
                trace!(pos = boundary.pos, "not a call, passing boundary through");
                self.check_builtin(&site)?;
                self.cursor = boundary.pos + 1;
                continue;
            }
            match resolve(
                self.parser.catalog,
                self.parser.scene,
                ValueKind::Number,
                &site,
            ) {
                Ok(resolution) => {
                    self.flush_constant(site.start);
                    let end = self
                        .parser
                        .emit_call(text, self.callbacks, &site, resolution)?;
                    self.cursor = end;
                    self.constant_start = end;
                }
                Err(_) => {
                    self.check_builtin(&site)?;
                    let inert_end = match boundary.kind {
                        BoundaryKind::Paren => boundary.pos + 1,
                        _ => site.member_span.end,
                    };
                    trace!(
                        span = &text[site.start..inert_end],
                        "unresolved, passed through"
                    );
                    self.cursor = inert_end;
                }
            }
        }
        self.flush_constant(text.len());
        Ok(())
    }

    /// Under the strict policy only built-in math functions may stay
    /// unresolved.
    fn check_builtin(&self, site: &CallSite<'_>) -> Result<(), ParseError> {
        if self.parser.options.unknown_functions == UnknownFunctionPolicy::BuiltinsOnly
            && site.owner.is_none()
            && !builtins::is_builtin(site.member)
        {
            return Err(unknown_function(self.text, site, &Unresolved::NotFound));
        }
        Ok(())
    }

    /// Report constant text up to `end`, if any.
    fn flush_constant(&mut self, end: usize) {
        if end > self.constant_start {
            self.callbacks
                .on_constant_token(&self.text[self.constant_start..end]);
        }
        self.constant_start = end;
    }
}

// ─── Text grammar ───────────────────────────────────────────────────────────

struct StringMachine<'p, 't, 'c, C: ?Sized, S: ?Sized, Cb: ?Sized> {
    parser: ExpressionParser<'p, C, S>,
    text: &'t str,
    callbacks: &'c mut Cb,
    cursor: usize,
    /// End of the last token, `None` before the first one.
    previous_end: Option<usize>,
}

impl<C, S, Cb> StringMachine<'_, '_, '_, C, S, Cb>
where
    C: FunctionCatalog + ?Sized,
    S: SceneQuery + ?Sized,
    Cb: ExpressionCallbacks + ?Sized,
{
    fn run(mut self) -> Result<(), ParseError> {
        let text = self.text;
        if !text.bytes().any(|b| matches!(b, b'.' | b'(' | b'"')) {
            return Err(ParseError::bare(
                ErrorKind::EmptyOrInvalidExpression,
                Span::empty(0),
                "default",
            ));
        }

        while let Some(boundary) = next_boundary(text, self.cursor, Grammar::Text) {
            let token_start = match boundary.kind {
                BoundaryKind::Quote => boundary.pos,
                _ => identifier_start(text, self.cursor, boundary.pos),
            };
            self.check_gap(token_start)?;

            let end = if boundary.kind == BoundaryKind::Quote {
                self.emit_literal(boundary.pos)?
            } else {
                let site = call_site(text, self.cursor, boundary)?;
                if !site.is_well_formed() {
                    return Err(unknown_function(text, &site, &Unresolved::NotFound));
                }
                match resolve(self.parser.catalog, self.parser.scene, ValueKind::Text, &site) {
                    Ok(resolution) => {
                        self.parser
                            .emit_call(text, self.callbacks, &site, resolution)?
                    }
                    Err(why) => return Err(unknown_function(text, &site, &why)),
                }
            };
            self.cursor = end;
            self.previous_end = Some(end);
        }

        self.check_trailing()
    }

    /// The text before a token: whitespace only before the first token,
    /// whitespace and exactly one `+` between two tokens.
    fn check_gap(&mut self, token_start: usize) -> Result<(), ParseError> {
        let gap_start = self.previous_end.unwrap_or(0);
        let gap = &self.text[gap_start..token_start];
        let mut plus = Vec::new();
        for (i, b) in gap.bytes().enumerate() {
            match b {
                b'+' if self.previous_end.is_some() => plus.push(gap_start + i),
                b if b.is_ascii_whitespace() => {}
                _ => return Err(unexpected_text(self.text, gap_start + i, "default")),
            }
        }
        if self.previous_end.is_none() {
            return Ok(());
        }
        match plus.as_slice() {
            [] => Err(ParseError::bare(
                ErrorKind::MissingConcatenationOperator,
                Span::empty(token_start),
                "missing",
            )),
            [_] => {
                self.callbacks.on_constant_token(gap);
                Ok(())
            }
            [first, ..] => Err(ParseError::bare(
                ErrorKind::MissingConcatenationOperator,
                Span::new(*first, first + 1),
                "doubled",
            )),
        }
    }

    /// Report a string literal as a nameless static text call.
    fn emit_literal(&mut self, quote: usize) -> Result<usize, ParseError> {
        let Some(literal) = scan_literal(self.text, quote)? else {
            return Ok(quote + 1);
        };
        trace!(value = %literal.value, "string literal");
        let call = ResolvedCall {
            function_name: String::new(),
            scope: OwnerScope::Static,
            owner_object: None,
            owner_behavior: None,
            arguments: vec![ResolvedArgument::Raw {
                text: literal.value.into_owned(),
            }],
            span: literal.span,
        };
        self.callbacks
            .on_static_function(call, &TEXT_LITERAL_SIGNATURE);
        Ok(literal.span.end)
    }

    fn check_trailing(&self) -> Result<(), ParseError> {
        let from = self.previous_end.unwrap_or(0);
        match self.text[from..].bytes().position(|b| !b.is_ascii_whitespace()) {
            Some(i) => Err(unexpected_text(self.text, from + i, "trailing")),
            None => Ok(()),
        }
    }
}

/// `UnexpectedText` for the run of non-whitespace text starting at `pos`.
fn unexpected_text(text: &str, pos: usize, variant: &str) -> ParseError {
    let end = text.as_bytes()[pos..]
        .iter()
        .position(|b| b.is_ascii_whitespace() || matches!(b, b'"' | b'+'))
        .map_or(text.len(), |i| pos + i)
        .max(pos + 1)
        .min(text.len());
    let end = (end..=text.len())
        .find(|&e| text.is_char_boundary(e))
        .unwrap_or(text.len());
    ParseError::new(
        ErrorKind::UnexpectedText,
        Span::new(pos, end),
        variant,
        ctx!("text" => &text[pos..end]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdexpr_catalog::{Catalog, FunctionSignature, Scene, SceneObject};

    /// Flat event log; sub-expressions are parsed with the same parser and
    /// their events are nested in brackets.
    struct Log<'a> {
        parser: ExpressionParser<'a, Catalog, Scene>,
        events: Vec<String>,
    }

    impl ExpressionCallbacks for Log<'_> {
        type Sub = Vec<String>;

        fn on_constant_token(&mut self, text: &str) {
            self.events.push(format!("const {text:?}"));
        }

        fn on_static_function(&mut self, call: ResolvedCall<Self::Sub>, _: &FunctionSignature) {
            self.events.push(format!("static {} {:?}", call.function_name, args(&call)));
        }

        fn on_object_function(&mut self, call: ResolvedCall<Self::Sub>, _: &FunctionSignature) {
            self.events.push(format!(
                "object {}.{} {:?}",
                call.owner_object.as_deref().unwrap_or_default(),
                call.function_name,
                args(&call)
            ));
        }

        fn on_object_behavior_function(
            &mut self,
            call: ResolvedCall<Self::Sub>,
            _: &FunctionSignature,
        ) {
            self.events.push(format!(
                "behavior {}.{}::{} {:?}",
                call.owner_object.as_deref().unwrap_or_default(),
                call.owner_behavior.as_deref().unwrap_or_default(),
                call.function_name,
                args(&call)
            ));
        }

        fn on_sub_numeric_expression(&mut self, text: &str) -> Result<Self::Sub, ParseError> {
            let mut inner = Log {
                parser: self.parser,
                events: Vec::new(),
            };
            self.parser.parse_numeric(text, &mut inner)?;
            Ok(inner.events)
        }

        fn on_sub_string_expression(&mut self, text: &str) -> Result<Self::Sub, ParseError> {
            let mut inner = Log {
                parser: self.parser,
                events: Vec::new(),
            };
            self.parser.parse_string(text, &mut inner)?;
            Ok(inner.events)
        }
    }

    fn args(call: &ResolvedCall<Vec<String>>) -> Vec<String> {
        call.arguments.iter().map(|a| a.text().to_string()).collect()
    }

    fn fixtures() -> (Catalog, Scene) {
        let catalog = Catalog::from_jsonc(
            r#"{ "functions": [
              { "name": "Random", "scope": "static", "returns": "number",
                "parameters": [ { "kind": "expression" } ] },
              { "name": "ToString", "scope": "static", "returns": "text",
                "parameters": [ { "kind": "expression" } ] },
              { "name": "X", "scope": "object", "ownerType": "", "returns": "number" },
              { "name": "Name", "scope": "object", "ownerType": "", "returns": "text" },
              { "name": "Speed", "scope": "behavior", "ownerType": "PhysicsBehavior", "returns": "number" },
            ] }"#,
        )
        .unwrap();
        let scene = Scene::new(
            vec![SceneObject::new("Player", "Sprite").with_behavior("Physics", "PhysicsBehavior")],
            vec![],
        )
        .unwrap();
        (catalog, scene)
    }

    fn numeric(text: &str) -> Result<Vec<String>, ParseError> {
        let (catalog, scene) = fixtures();
        let parser = ExpressionParser::new(&catalog, &scene);
        let mut log = Log {
            parser,
            events: Vec::new(),
        };
        parser.parse_numeric(text, &mut log).map(|()| log.events)
    }

    fn string(text: &str) -> Result<Vec<String>, ParseError> {
        let (catalog, scene) = fixtures();
        let parser = ExpressionParser::new(&catalog, &scene);
        let mut log = Log {
            parser,
            events: Vec::new(),
        };
        parser.parse_string(text, &mut log).map(|()| log.events)
    }

    #[test]
    fn numeric_without_calls_is_one_constant() {
        assert_eq!(numeric("1 + 2*3").unwrap(), vec![r#"const "1 + 2*3""#]);
        assert!(numeric("").unwrap().is_empty());
    }

    #[test]
    fn numeric_resolves_calls_between_constants() {
        assert_eq!(
            numeric("2*Random(10)+Player.X()").unwrap(),
            vec![
                r#"const "2*""#.to_string(),
                r#"static Random ["10"]"#.to_string(),
                r#"const "+""#.to_string(),
                r#"object Player.X []"#.to_string(),
            ]
        );
    }

    #[test]
    fn math_functions_and_fractions_pass_through_coalesced() {
        assert_eq!(
            numeric("sin(3.5*Player.X())").unwrap(),
            vec![
                r#"const "sin(3.5*""#.to_string(),
                r#"object Player.X []"#.to_string(),
                r#"const ")""#.to_string(),
            ]
        );
    }

    #[test]
    fn behavior_call_is_reported_with_owner_parts() {
        assert_eq!(
            numeric("Player.Physics::Speed()").unwrap(),
            vec![r#"behavior Player.Physics::Speed []"#]
        );
    }

    #[test]
    fn member_without_parentheses_is_an_error() {
        let err = numeric("Player.X + 1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingArgumentList);
        assert_eq!(err.span, Span::new(7, 8));
    }

    #[test]
    fn strict_policy_rejects_unknown_static_calls() {
        let (catalog, scene) = fixtures();
        let parser = ExpressionParser::new(&catalog, &scene).with_options(ParseOptions {
            unknown_functions: UnknownFunctionPolicy::BuiltinsOnly,
            ..ParseOptions::default()
        });
        let mut log = Log {
            parser,
            events: Vec::new(),
        };
        assert!(parser.parse_numeric("abs(-1) + (2)", &mut log).is_ok());
        let err = parser.parse_numeric("1 + Foo(2)", &mut log).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownFunction);
        assert_eq!(err.position(), 4);
    }

    #[test]
    fn string_literals_and_functions_concatenate() {
        assert_eq!(
            string(r#""Hi " + Player.Name()"#).unwrap(),
            vec![
                r#"static  ["Hi "]"#.to_string(),
                r#"const " + ""#.to_string(),
                r#"object Player.Name []"#.to_string(),
            ]
        );
    }

    #[test]
    fn string_function_arguments_recurse_into_numeric_grammar() {
        assert_eq!(
            string("ToString(Player.X() + 1)").unwrap(),
            vec![r#"static ToString ["Player.X() + 1"]"#]
        );
    }

    #[test]
    fn missing_and_doubled_plus() {
        let err = string(r#""a""b""#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingConcatenationOperator);
        assert_eq!(err.position(), 3);
        let err = string(r#""a" + + "b""#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingConcatenationOperator);
        assert_eq!(err.position(), 4);
    }

    #[test]
    fn stray_text_and_trailing_operator() {
        let err = string(r#""a" + x "b""#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedText);
        assert_eq!(err.position(), 6);
        let err = string(r#""a" +"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedText);
        assert_eq!(err.position(), 4);
        assert_eq!(err.message, "unexpected + at the end of the expression");
    }

    #[test]
    fn empty_text_expression() {
        for text in ["", "   ", "abc"] {
            let err = string(text).unwrap_err();
            assert_eq!(err.kind, ErrorKind::EmptyOrInvalidExpression, "{text:?}");
            assert_eq!(err.position(), 0);
        }
    }

    #[test]
    fn unknown_text_function() {
        let err = string(r#""a" + Nope()"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownFunction);
        assert_eq!(err.position(), 6);
        assert_eq!(err.message, "unknown function Nope");
    }

    #[test]
    fn numeric_function_in_text_grammar_is_unknown() {
        let err = string("Random(1)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownFunction);
    }

    #[test]
    fn parser_is_copy_and_reusable() {
        let (catalog, scene) = fixtures();
        let parser = ExpressionParser::new(&catalog, &scene);
        let copy = parser;
        assert_eq!(copy.options(), parser.options());
    }
}
