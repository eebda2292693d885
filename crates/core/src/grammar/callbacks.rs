use super::error::ParseError;
use gdexpr_catalog::{FunctionSignature, OwnerScope, ValueKind};
use gdexpr_diagnostics::Span;
use serde::Serialize;

/// One bound argument of a resolved call, in declaration order.
///
/// `S` is whatever the consumer's sub-expression callbacks produce.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ResolvedArgument<S> {
    /// Passed through unparsed: generator-only placeholders, parameter kinds
    /// without a grammar, and the value of a string literal.
    Raw {
        /// The value.
        text: String,
    },
    /// Parsed as a numeric sub-expression.
    Numeric {
        /// Text handed to the sub-expression callback.
        source: String,
        /// What the callback returned.
        parsed: S,
    },
    /// Parsed as a text sub-expression.
    Text {
        /// Text handed to the sub-expression callback.
        source: String,
        /// What the callback returned.
        parsed: S,
    },
}

impl<S> ResolvedArgument<S> {
    /// The argument text: the raw value or the sub-expression source.
    pub fn text(&self) -> &str {
        match self {
            ResolvedArgument::Raw { text } => text,
            ResolvedArgument::Numeric { source, .. } | ResolvedArgument::Text { source, .. } => {
                source
            }
        }
    }

    /// The parsed sub-expression, if the argument was parsed.
    pub fn parsed(&self) -> Option<&S> {
        match self {
            ResolvedArgument::Raw { .. } => None,
            ResolvedArgument::Numeric { parsed, .. } | ResolvedArgument::Text { parsed, .. } => {
                Some(parsed)
            }
        }
    }
}

/// A call site that resolved against the catalog, with its arguments bound.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCall<S> {
    /// Function name without owner or behavior prefix; empty for literals.
    pub function_name: String,
    /// Scope the call resolved in.
    pub scope: OwnerScope,
    /// Owner object (tildes decoded) for object and behavior calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_object: Option<String>,
    /// Behavior name for behavior calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_behavior: Option<String>,
    /// One entry per declared parameter.
    pub arguments: Vec<ResolvedArgument<S>>,
    /// From the first identifier byte through the closing parenthesis.
    pub span: Span,
}

impl<S> ResolvedCall<S> {
    /// Whether this is the nameless call a string literal is reported as.
    pub fn is_text_literal(&self) -> bool {
        self.function_name.is_empty() && self.scope == OwnerScope::Static
    }
}

/// Signature handed along with string literals: a nameless static text
/// function with no declared parameters.
pub static TEXT_LITERAL_SIGNATURE: FunctionSignature = FunctionSignature {
    name: String::new(),
    scope: OwnerScope::Static,
    owner_type: None,
    returns: ValueKind::Text,
    parameters: Vec::new(),
    description: None,
};

/// Consumer side of a parse.
///
/// The parser reports, in source order, the constant text between calls and
/// every resolved call. Bound arguments are parsed by calling back into the
/// consumer, which normally runs a nested parse and returns its product as
/// `Sub`; an error returned from a sub-expression callback aborts the whole
/// parse.
pub trait ExpressionCallbacks {
    /// Product of a nested parse.
    type Sub;

    /// Verbatim text that is not a call. Never empty.
    fn on_constant_token(&mut self, text: &str);

    /// A static function call, or a string literal (see
    /// [`ResolvedCall::is_text_literal`]).
    fn on_static_function(&mut self, call: ResolvedCall<Self::Sub>, signature: &FunctionSignature);

    /// A function of an object.
    fn on_object_function(&mut self, call: ResolvedCall<Self::Sub>, signature: &FunctionSignature);

    /// A function of a behavior attached to an object.
    fn on_object_behavior_function(
        &mut self,
        call: ResolvedCall<Self::Sub>,
        signature: &FunctionSignature,
    );

    /// Parse `text` as a numeric expression. Error spans are relative to
    /// `text`.
    fn on_sub_numeric_expression(&mut self, text: &str) -> Result<Self::Sub, ParseError>;

    /// Parse `text` as a text expression. Error spans are relative to `text`.
    fn on_sub_string_expression(&mut self, text: &str) -> Result<Self::Sub, ParseError>;
}
