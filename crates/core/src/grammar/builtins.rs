/// Math functions the downstream evaluator understands natively. Sorted for
/// binary search.
pub const MATH_FUNCTIONS: &[&str] = &[
    "abs", "acos", "acosh", "asin", "asinh", "atan", "atan2", "atanh", "avg", "cbrt", "ceil",
    "cos", "cosh", "cot", "csc", "else", "eval", "exp", "floor", "if", "int", "ln", "log",
    "log10", "log2", "nthroot", "pow", "rint", "sec", "sign", "sin", "sinh", "sqrt", "sum",
    "tan", "tanh", "then", "trunc",
];

/// Whether `name(` may pass through the numeric grammar unresolved under
/// the strict policy. The empty name is a grouping parenthesis.
pub fn is_builtin(name: &str) -> bool {
    name.is_empty() || MATH_FUNCTIONS.binary_search(&name).is_ok()
}
