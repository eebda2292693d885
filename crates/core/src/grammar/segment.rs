//! Call-site segmentation.
//!
//! Finds the next token boundary, the identifier in front of it, and splits
//! a parenthesized argument list into raw argument substrings. Nothing here
//! consults the catalog; the resolver decides whether a segmented candidate
//! is actually a call.

use super::error::{ErrorKind, ParseError};
use gdexpr_diagnostics::Span;
use std::borrow::Cow;
use tracing::trace;

/// Characters that end an identifier when scanning backward from a boundary.
/// ASCII whitespace is a separator too.
pub const SEPARATORS: &str = " ,+-*/%.<>=&|;()#^![]{}";

/// Whether `b` ends an identifier.
pub fn is_separator(b: u8) -> bool {
    b.is_ascii_whitespace() || SEPARATORS.as_bytes().contains(&b)
}

/// Which grammar is scanning; only the text grammar stops at quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// `.` and `(` are boundaries.
    Numeric,
    /// `.`, `(` and `"` are boundaries.
    Text,
}

/// Kind of token boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    /// `.` between an owner name and a member name.
    Dot,
    /// `(` after a function name.
    Paren,
    /// `"` opening a literal.
    Quote,
}

/// The nearest boundary character at or after the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    /// Byte offset of the boundary character.
    pub pos: usize,
    /// Which character it is.
    pub kind: BoundaryKind,
}

/// Locate the next boundary at or after `from`.
pub fn next_boundary(text: &str, from: usize, grammar: Grammar) -> Option<Boundary> {
    text.as_bytes()
        .iter()
        .enumerate()
        .skip(from)
        .find_map(|(pos, &b)| {
            let kind = match b {
                b'.' => BoundaryKind::Dot,
                b'(' => BoundaryKind::Paren,
                b'"' if grammar == Grammar::Text => BoundaryKind::Quote,
                _ => return None,
            };
            Some(Boundary { pos, kind })
        })
}

/// Start of the identifier ending at `end`: one past the nearest separator
/// before `end`, never before `floor`.
pub fn identifier_start(text: &str, floor: usize, end: usize) -> usize {
    text.as_bytes()[floor..end]
        .iter()
        .rposition(|&b| is_separator(b))
        .map_or(floor, |i| floor + i + 1)
}

/// Decode `~` (an encoded space) in an object name.
pub fn decode_owner_name(raw: &str) -> Cow<'_, str> {
    if raw.contains('~') {
        Cow::Owned(raw.replace('~', " "))
    } else {
        Cow::Borrowed(raw)
    }
}

/// One comma-delimited argument as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawArgument<'a> {
    /// Argument text, surrounding whitespace included.
    pub text: &'a str,
    /// Byte offset of `text` in the whole expression.
    pub start: usize,
}

impl RawArgument<'_> {
    /// Whether the argument is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A parenthesized argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentList<'a> {
    /// Offset of `(`.
    pub open: usize,
    /// Offset of the matching `)`.
    pub close: usize,
    /// Top-level arguments, in order.
    pub arguments: Vec<RawArgument<'a>>,
}

/// Split the argument list opened by the `(` at `open`.
///
/// Commas split arguments only at depth zero and outside string literals;
/// inside a literal a backslash escapes the next character. A blank final
/// argument is dropped, so `F()` has none and `F(1,)` has one.
pub fn split_arguments<'a>(
    text: &'a str,
    open: usize,
    function: &str,
) -> Result<ArgumentList<'a>, ParseError> {
    let bytes = text.as_bytes();
    let mut arguments = Vec::new();
    let mut depth = 0usize;
    let mut in_literal = false;
    let mut arg_start = open + 1;
    let mut i = open + 1;

    while i < bytes.len() {
        let b = bytes[i];
        if in_literal {
            match b {
                b'\\' => i += 1,
                b'"' => in_literal = false,
                _ => {}
            }
        } else {
            match b {
                b'"' => in_literal = true,
                b'(' => depth += 1,
                b')' if depth == 0 => {
                    arguments.push(RawArgument {
                        text: &text[arg_start..i],
                        start: arg_start,
                    });
                    if arguments.last().is_some_and(RawArgument::is_blank) {
                        arguments.pop();
                    }
                    return Ok(ArgumentList {
                        open,
                        close: i,
                        arguments,
                    });
                }
                b')' => depth -= 1,
                b',' if depth == 0 => {
                    arguments.push(RawArgument {
                        text: &text[arg_start..i],
                        start: arg_start,
                    });
                    arg_start = i + 1;
                }
                _ => {}
            }
        }
        i += 1;
    }

    let (variant, context) = if function.is_empty() {
        ("anonymous", std::collections::BTreeMap::new())
    } else {
        ("default", ctx!("function" => function))
    };
    Err(ParseError::new(
        ErrorKind::UnbalancedParentheses,
        Span::new(open, open + 1),
        variant,
        context,
    ))
}

/// Owner part of a member call (`Player` in `Player.X()`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner<'a> {
    /// Name as written (`Enemy~Ship`).
    pub raw: &'a str,
    /// Name with tildes decoded (`Enemy Ship`).
    pub name: Cow<'a, str>,
}

/// A segmented call candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite<'a> {
    /// Offset of the first identifier byte (owner or function name).
    pub start: usize,
    /// Owner object, for `owner.member` candidates.
    pub owner: Option<Owner<'a>>,
    /// Function name as written after the dot (may hold `Behavior::Name`),
    /// or before `(` for static candidates.
    pub member: &'a str,
    /// Span of `member`.
    pub member_span: Span,
    /// The argument list, when the name is followed by `(`.
    pub arguments: Option<ArgumentList<'a>>,
}

impl<'a> CallSite<'a> {
    /// Whether this candidate has the shape of a call: a non-empty static
    /// name, or a non-empty owner and a member free of separators.
    pub fn is_well_formed(&self) -> bool {
        match &self.owner {
            None => !self.member.is_empty(),
            Some(owner) => {
                !owner.raw.is_empty()
                    && !self.member.is_empty()
                    && !self.member.bytes().any(is_separator)
            }
        }
    }

    /// Name as written, owner included (`Player.X`).
    pub fn written_name<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.member_span.end]
    }

    /// Offset just past the call: past `)` when there is an argument list,
    /// past the member name otherwise.
    pub fn end(&self) -> usize {
        self.arguments
            .as_ref()
            .map_or(self.member_span.end, |args| args.close + 1)
    }
}

/// Segment the candidate at `boundary` (a dot or parenthesis).
///
/// `floor` is the current parse position; the identifier never starts
/// before it. Argument lists are split for every `(` candidate, so an
/// unbalanced parenthesis is reported before anything is resolved.
pub fn call_site<'a>(
    text: &'a str,
    floor: usize,
    boundary: Boundary,
) -> Result<CallSite<'a>, ParseError> {
    let start = identifier_start(text, floor, boundary.pos);
    match boundary.kind {
        BoundaryKind::Paren => {
            let member = &text[start..boundary.pos];
            let arguments = split_arguments(text, boundary.pos, member)?;
            trace!(function = member, start, "static call candidate");
            Ok(CallSite {
                start,
                owner: None,
                member,
                member_span: Span::new(start, boundary.pos),
                arguments: Some(arguments),
            })
        }
        BoundaryKind::Dot => {
            let raw = &text[start..boundary.pos];
            let member_start = boundary.pos + 1;
            let member_end = text.as_bytes()[member_start..]
                .iter()
                .position(|&b| b == b'(' || b.is_ascii_whitespace())
                .map_or(text.len(), |i| member_start + i);
            let member = &text[member_start..member_end];
            let mut site = CallSite {
                start,
                owner: Some(Owner {
                    raw,
                    name: decode_owner_name(raw),
                }),
                member,
                member_span: Span::new(member_start, member_end),
                arguments: None,
            };
            if site.is_well_formed() {
                let after = text.as_bytes()[member_end..]
                    .iter()
                    .position(|b| !b.is_ascii_whitespace())
                    .map(|i| member_end + i);
                if let Some(open) = after.filter(|&p| text.as_bytes()[p] == b'(') {
                    site.arguments = Some(split_arguments(text, open, site.written_name(text))?);
                }
            }
            trace!(owner = raw, member, start, "member call candidate");
            Ok(site)
        }
        BoundaryKind::Quote => unreachable!("call_site called on a quote boundary"),
    }
}
