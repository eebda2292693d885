use super::{
    callbacks::{ExpressionCallbacks, ResolvedArgument, ResolvedCall},
    error::{ErrorKind, ParseError},
    parser::{ExpressionParser, ParseOptions},
};
use gdexpr_catalog::{FunctionCatalog, FunctionSignature, SceneQuery, ValueKind};
use gdexpr_diagnostics::{Diagnostic, Span};
use serde::Serialize;

/// Result of parsing one expression into a tree.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    /// The tree, when parsing succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<ParsedExpression>,
    /// At most one error diagnostic (parsing stops at the first error).
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    /// Whether the expression parsed without errors.
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Byte offset of the first error, if any.
    pub fn first_error_position(&self) -> Option<usize> {
        self.diagnostics
            .first()
            .and_then(|d| d.span)
            .map(|s| s.start)
    }
}

/// A parsed expression: constant text, literals, and resolved calls whose
/// arguments are parsed expressions themselves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedExpression {
    /// Grammar the expression was parsed with.
    pub kind: ValueKind,
    /// Fragments in source order.
    pub fragments: Vec<Fragment>,
}

impl ParsedExpression {
    /// Resolved calls at the top level of this expression.
    pub fn calls(&self) -> impl Iterator<Item = &ResolvedCall<ParsedExpression>> {
        self.fragments.iter().filter_map(|f| match f {
            Fragment::Call(call) => Some(call),
            _ => None,
        })
    }

    /// Number of resolved calls, nested arguments included.
    pub fn call_count(&self) -> usize {
        self.calls()
            .map(|call| {
                1 + call
                    .arguments
                    .iter()
                    .filter_map(ResolvedArgument::parsed)
                    .map(ParsedExpression::call_count)
                    .sum::<usize>()
            })
            .sum()
    }
}

/// One piece of a parsed expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Fragment {
    /// Text passed through verbatim (numbers, operators, math functions,
    /// the `+` between text tokens).
    Constant {
        /// The text.
        text: String,
    },
    /// A string literal, unescaped.
    Literal {
        /// Literal value.
        value: String,
        /// From the opening through the closing quote.
        span: Span,
    },
    /// A resolved function call.
    Call(ResolvedCall<ParsedExpression>),
}

/// Consumer that builds a [`ParsedExpression`], parsing arguments
/// recursively with the same parser.
///
/// Enforces [`ParseOptions::max_depth`] on the nesting of arguments.
pub struct TreeBuilder<'a, C: ?Sized, S: ?Sized> {
    parser: ExpressionParser<'a, C, S>,
    depth: usize,
    fragments: Vec<Fragment>,
}

impl<'a, C, S> TreeBuilder<'a, C, S>
where
    C: FunctionCatalog + ?Sized,
    S: SceneQuery + ?Sized,
{
    /// Parse `text` as a `kind` expression into a tree.
    pub fn build(
        parser: ExpressionParser<'a, C, S>,
        text: &str,
        kind: ValueKind,
    ) -> Result<ParsedExpression, ParseError> {
        Self::at_depth(parser, 0).run(text, kind)
    }

    fn at_depth(parser: ExpressionParser<'a, C, S>, depth: usize) -> Self {
        Self {
            parser,
            depth,
            fragments: Vec::new(),
        }
    }

    fn run(mut self, text: &str, kind: ValueKind) -> Result<ParsedExpression, ParseError> {
        let parser = self.parser;
        parser.parse(text, kind, &mut self)?;
        Ok(ParsedExpression {
            kind,
            fragments: self.fragments,
        })
    }

    /// Parse an argument one level deeper. Errors are relative to `text`.
    fn nested(&self, text: &str, kind: ValueKind) -> Result<ParsedExpression, ParseError> {
        let depth = self.depth + 1;
        let limit = self.parser.options().max_depth;
        if depth > limit {
            return Err(ParseError::new(
                ErrorKind::NestingTooDeep,
                Span::new(0, text.len()),
                "default",
                ctx!("limit" => limit.to_string()),
            ));
        }
        Self::at_depth(self.parser, depth).run(text, kind)
    }
}

impl<C, S> ExpressionCallbacks for TreeBuilder<'_, C, S>
where
    C: FunctionCatalog + ?Sized,
    S: SceneQuery + ?Sized,
{
    type Sub = ParsedExpression;

    fn on_constant_token(&mut self, text: &str) {
        self.fragments.push(Fragment::Constant {
            text: text.to_string(),
        });
    }

    fn on_static_function(&mut self, mut call: ResolvedCall<Self::Sub>, _: &FunctionSignature) {
        if call.is_text_literal() {
            if let Some(ResolvedArgument::Raw { text }) = call.arguments.pop() {
                self.fragments.push(Fragment::Literal {
                    value: text,
                    span: call.span,
                });
            }
            return;
        }
        self.fragments.push(Fragment::Call(call));
    }

    fn on_object_function(&mut self, call: ResolvedCall<Self::Sub>, _: &FunctionSignature) {
        self.fragments.push(Fragment::Call(call));
    }

    fn on_object_behavior_function(&mut self, call: ResolvedCall<Self::Sub>, _: &FunctionSignature) {
        self.fragments.push(Fragment::Call(call));
    }

    fn on_sub_numeric_expression(&mut self, text: &str) -> Result<Self::Sub, ParseError> {
        self.nested(text, ValueKind::Number)
    }

    fn on_sub_string_expression(&mut self, text: &str) -> Result<Self::Sub, ParseError> {
        self.nested(text, ValueKind::Text)
    }
}

// ─── Public API ─────────────────────────────────────────────────────────────

/// Parse `text` into a tree and report the outcome as diagnostics.
pub fn parse_expression<C, S>(
    text: &str,
    kind: ValueKind,
    catalog: &C,
    scene: &S,
    options: ParseOptions,
) -> ParseResult
where
    C: FunctionCatalog + ?Sized,
    S: SceneQuery + ?Sized,
{
    let parser = ExpressionParser::new(catalog, scene).with_options(options);
    match TreeBuilder::build(parser, text, kind) {
        Ok(expression) => ParseResult {
            expression: Some(expression),
            diagnostics: Vec::new(),
        },
        Err(err) => ParseResult {
            expression: None,
            diagnostics: vec![err.into()],
        },
    }
}
