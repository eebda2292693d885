//! JSONC preprocessing for catalog, scene, and diagnostics files.
//!
//! Turns JSON-with-comments into plain JSON that `serde_json` accepts:
//! - `//` line comments and `/* ... */` block comments are removed
//! - a trailing comma before `}` or `]` is removed
//! - string literals (including escaped quotes) pass through untouched

use std::iter::Peekable;
use std::str::Chars;

/// Strip comments and trailing commas from JSONC input.
///
/// Line structure is preserved (line comments keep their newline, block
/// comments are dropped entirely), so `serde_json` error line numbers still
/// point close to the original location.
#[must_use]
pub fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    // Byte index in `out` of a comma that may turn out to be trailing.
    let mut pending_comma: Option<usize> = None;

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                pending_comma = None;
                out.push(c);
                copy_string_body(&mut chars, &mut out);
            }
            '/' if chars.peek() == Some(&'/') => {
                chars.next();
                skip_line_comment(&mut chars);
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                skip_block_comment(&mut chars);
            }
            ',' => {
                pending_comma = Some(out.len());
                out.push(c);
            }
            '}' | ']' => {
                if let Some(idx) = pending_comma.take() {
                    out.remove(idx);
                }
                out.push(c);
            }
            c if c.is_whitespace() => out.push(c),
            _ => {
                pending_comma = None;
                out.push(c);
            }
        }
    }
    out
}

/// Copy the rest of a string literal (the opening quote is already written).
fn copy_string_body(chars: &mut Peekable<Chars<'_>>, out: &mut String) {
    while let Some(c) = chars.next() {
        out.push(c);
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '"' => return,
            _ => {}
        }
    }
}

fn skip_line_comment(chars: &mut Peekable<Chars<'_>>) {
    while let Some(&c) = chars.peek() {
        if c == '\n' {
            return;
        }
        chars.next();
    }
}

fn skip_block_comment(chars: &mut Peekable<Chars<'_>>) {
    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'/') {
            chars.next();
            return;
        }
    }
}
