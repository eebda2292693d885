use gdexpr_diagnostics::{Diagnostic, Span, codes, render_message};
use serde::Serialize;
use std::collections::BTreeMap;

/// Shorthand for building a `BTreeMap<String, String>` context from key-value pairs.
macro_rules! ctx {
    ($($k:expr => $v:expr),+ $(,)?) => {
        std::collections::BTreeMap::from([$(($k.into(), $v.into())),+])
    };
}

/// What went wrong. Each kind maps to one diagnostic code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub enum ErrorKind {
    /// A string literal has no closing quote.
    UnterminatedLiteral,
    /// An argument list's `(` has no matching `)`.
    UnbalancedParentheses,
    /// A resolved member function is not followed by `(`.
    MissingArgumentList,
    /// Too few or too many arguments for the resolved signature.
    ArityMismatch,
    /// The call does not resolve in any scope.
    UnknownFunction,
    /// Two text tokens without a `+` between them, or two `+` in a row.
    MissingConcatenationOperator,
    /// A text expression with nothing to parse.
    EmptyOrInvalidExpression,
    /// Bare text outside a string literal in a text expression.
    UnexpectedText,
    /// Sub-expressions nested past the configured limit.
    NestingTooDeep,
}

impl ErrorKind {
    /// The diagnostic code this kind is reported under.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::UnterminatedLiteral => codes::UNTERMINATED_LITERAL,
            ErrorKind::UnbalancedParentheses => codes::UNBALANCED_PARENTHESES,
            ErrorKind::MissingArgumentList => codes::MISSING_ARGUMENT_LIST,
            ErrorKind::ArityMismatch => codes::ARITY_MISMATCH,
            ErrorKind::UnknownFunction => codes::UNKNOWN_FUNCTION,
            ErrorKind::MissingConcatenationOperator => codes::MISSING_CONCATENATION_OPERATOR,
            ErrorKind::EmptyOrInvalidExpression => codes::EMPTY_OR_INVALID_EXPRESSION,
            ErrorKind::UnexpectedText => codes::UNEXPECTED_TEXT,
            ErrorKind::NestingTooDeep => codes::NESTING_TOO_DEEP,
        }
    }
}

/// The first error of a parse. Parsing stops as soon as one is raised.
///
/// `span` is always expressed in the coordinates of the text handed to the
/// parse call that returns it, including errors raised inside nested
/// argument expressions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    /// Error category.
    pub kind: ErrorKind,
    /// Offending bytes.
    pub span: Span,
    /// Rendered human-readable message.
    pub message: String,
    /// Machine-readable details (`function`, `min`, `max`, ...).
    pub context: BTreeMap<String, String>,
}

impl ParseError {
    /// Build an error, rendering its message from the `variant` template of
    /// the kind's diagnostic code.
    pub fn new(
        kind: ErrorKind,
        span: Span,
        variant: &str,
        context: BTreeMap<String, String>,
    ) -> Self {
        let message = render_message(kind.code(), variant, &context)
            .or_else(|| render_message(kind.code(), "default", &context))
            .unwrap_or_else(|| kind.code().to_string());
        Self {
            kind,
            span,
            message,
            context,
        }
    }

    /// Build an error whose template takes no context.
    pub fn bare(kind: ErrorKind, span: Span, variant: &str) -> Self {
        Self::new(kind, span, variant, BTreeMap::new())
    }

    /// Byte offset of the error (start of its span).
    pub fn position(&self) -> usize {
        self.span.start
    }

    /// Move the error `offset` bytes to the right.
    #[must_use]
    pub fn shifted(mut self, offset: usize) -> Self {
        self.span = self.span.shifted(offset);
        self
    }

    /// Replace the span, keeping kind and message.
    #[must_use]
    pub fn relocated(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Convert into an editor/CLI diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::from_code(self.kind.code(), self.message.clone(), Some(self.span))
            .with_context(self.context.clone())
    }
}

impl From<ParseError> for Diagnostic {
    fn from(err: ParseError) -> Self {
        err.to_diagnostic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_is_rendered_from_template() {
        let err = ParseError::new(
            ErrorKind::ArityMismatch,
            Span::new(6, 7),
            "exact",
            ctx!("function" => "Random", "min" => "1", "max" => "1", "actual" => "2"),
        );
        assert_eq!(err.message, "Random expects 1 arguments, got 2");
        assert_eq!(err.position(), 6);
    }

    #[test]
    fn unknown_variant_falls_back_to_default_template() {
        let err = ParseError::bare(ErrorKind::UnterminatedLiteral, Span::empty(0), "nope");
        assert_eq!(err.message, "unterminated string literal");
    }

    #[test]
    fn shifted_moves_span_only() {
        let err = ParseError::bare(ErrorKind::EmptyOrInvalidExpression, Span::empty(0), "default")
            .shifted(12);
        assert_eq!(err.span, Span::empty(12));
        assert_eq!(err.kind, ErrorKind::EmptyOrInvalidExpression);
    }

    #[test]
    fn converts_to_diagnostic_with_code_and_context() {
        let err = ParseError::new(
            ErrorKind::UnknownFunction,
            Span::new(0, 3),
            "static",
            ctx!("function" => "Foo"),
        );
        let diag: Diagnostic = err.into();
        assert_eq!(diag.id, "GDX1102");
        assert_eq!(diag.message, "unknown function Foo");
        assert_eq!(diag.span, Some(Span::new(0, 3)));
        assert_eq!(
            diag.context.unwrap().get("function").map(String::as_str),
            Some("Foo")
        );
    }

    #[test]
    fn every_kind_has_a_known_code() {
        for kind in [
            ErrorKind::UnterminatedLiteral,
            ErrorKind::UnbalancedParentheses,
            ErrorKind::MissingArgumentList,
            ErrorKind::ArityMismatch,
            ErrorKind::UnknownFunction,
            ErrorKind::MissingConcatenationOperator,
            ErrorKind::EmptyOrInvalidExpression,
            ErrorKind::UnexpectedText,
            ErrorKind::NestingTooDeep,
        ] {
            assert!(codes::is_known(kind.code()), "{kind:?}");
        }
    }
}
