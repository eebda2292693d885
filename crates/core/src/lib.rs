//! Expression parsing and function resolution for event-based game logic.
//!
//! Expressions come in two grammars: numeric (arithmetic with embedded
//! calls) and text (string literals and text calls joined by `+`). Calls are
//! resolved against a [`FunctionCatalog`] in three scopes (static, object
//! and behavior), their arguments are checked and bound to the declared
//! parameters, and every piece of the expression is reported to an
//! [`ExpressionCallbacks`] consumer.
//!
//! [`ExpressionParser`] is the streaming entry point; [`parse_expression`]
//! builds a [`ParsedExpression`] tree in one call.

#![warn(missing_docs)]

/// Expression grammars, resolution, binding and the tree builder.
pub mod grammar;

// ── Convenience re-exports ──────────────────────────────────────────────────

// Parser
pub use grammar::parser::{
    DEFAULT_MAX_DEPTH, ExpressionParser, ParseOptions, UnknownFunctionPolicy,
};

// Consumer interface
pub use grammar::callbacks::{ExpressionCallbacks, ResolvedArgument, ResolvedCall};

// Errors
pub use grammar::error::{ErrorKind, ParseError};

// Tree
pub use grammar::tree::{Fragment, ParseResult, ParsedExpression, TreeBuilder, parse_expression};

// Diagnostics (re-exported from the diagnostics crate)
pub use gdexpr_diagnostics::{Diagnostic, Severity, Span, codes};

// Catalog (re-exported from the catalog crate)
pub use gdexpr_catalog::{
    Catalog, FunctionCatalog, FunctionSignature, OwnerScope, ParameterDescriptor, ParameterKind,
    Scene, SceneObject, SceneQuery, ValueKind,
};

// Serialization helpers
pub use grammar::dump::{result_to_pretty_json, to_pretty_json};
