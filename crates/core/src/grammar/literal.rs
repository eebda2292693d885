use super::error::{ErrorKind, ParseError};
use gdexpr_diagnostics::Span;
use std::borrow::Cow;

/// A quoted string literal located in an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal<'a> {
    /// From the opening quote through the closing quote.
    pub span: Span,
    /// Text between the quotes, escapes untouched.
    pub raw: &'a str,
    /// Text between the quotes with `\"` turned into `"`.
    pub value: Cow<'a, str>,
}

/// Offset of the next `"` at or after `from` that is not escaped by a
/// backslash.
pub fn find_unescaped_quote(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Scan the literal whose opening quote is the first unescaped `"` at or
/// after `from`.
///
/// Returns `Ok(None)` when there is no opening quote and
/// [`ErrorKind::UnterminatedLiteral`] (at the opening quote) when there is
/// no closing one.
pub fn scan_literal(text: &str, from: usize) -> Result<Option<Literal<'_>>, ParseError> {
    let Some(open) = find_unescaped_quote(text, from) else {
        return Ok(None);
    };
    let Some(close) = find_unescaped_quote(text, open + 1) else {
        return Err(ParseError::bare(
            ErrorKind::UnterminatedLiteral,
            Span::new(open, text.len()),
            "default",
        ));
    };
    let raw = &text[open + 1..close];
    Ok(Some(Literal {
        span: Span::new(open, close + 1),
        raw,
        value: unescape_quotes(raw),
    }))
}

/// Replace each `\"` pair with `"`. Other backslash pairs are kept as
/// written.
pub fn unescape_quotes(raw: &str) -> Cow<'_, str> {
    if !raw.contains("\\\"") {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('"') => out.push('"'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}
