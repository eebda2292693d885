/// Parse errors and the `ctx!` helper macro.
#[macro_use]
pub mod error;

/// Arity checking and argument binding.
pub(crate) mod bind;
/// Math functions that pass through the numeric grammar.
pub mod builtins;
/// Consumer interface and the resolved call types handed to it.
pub mod callbacks;
/// JSON serialization helpers for parsed expressions.
pub mod dump;
/// String literal scanning.
pub mod literal;
/// The numeric and text grammars.
pub mod parser;
/// Call site resolution against the catalog and scene.
pub(crate) mod resolve;
/// Boundary search, call sites and argument splitting.
pub mod segment;
/// Tree-building consumer and the one-shot [`parse_expression`](tree::parse_expression).
pub mod tree;
