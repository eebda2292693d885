use super::callbacks::{ExpressionCallbacks, ResolvedArgument};
use super::error::{ErrorKind, ParseError};
use super::segment::{ArgumentList, RawArgument};
use gdexpr_catalog::{FunctionSignature, ParameterDescriptor, ValueKind};
use gdexpr_diagnostics::Span;
use tracing::trace;

/// Where a bound value came from.
enum Bound<'a> {
    /// Written by the author, starting at this offset.
    Written(&'a str, usize),
    /// Default or placeholder; has no position of its own.
    Synthesized(String),
}

impl Bound<'_> {
    fn text(&self) -> &str {
        match self {
            Bound::Written(text, _) => text,
            Bound::Synthesized(text) => text,
        }
    }
}

/// Value substituted for an optional parameter left blank.
fn default_value(param: &ParameterDescriptor) -> String {
    if !param.default_value.is_empty() {
        return param.default_value.clone();
    }
    match param.kind.value_kind() {
        Some(ValueKind::Number) => "0".to_string(),
        Some(ValueKind::Text) => "\"\"".to_string(),
        None => String::new(),
    }
}

/// Check arity, place arguments on declared parameters, and parse each one
/// through the consumer.
///
/// Error spans from nested parses are moved into the caller's coordinates:
/// by the argument's offset for written arguments, onto the `(` for
/// synthesized ones.
pub(crate) fn bind<Cb>(
    callbacks: &mut Cb,
    signature: &FunctionSignature,
    arguments: &ArgumentList<'_>,
    function: &str,
) -> Result<Vec<ResolvedArgument<Cb::Sub>>, ParseError>
where
    Cb: ExpressionCallbacks + ?Sized,
{
    let open = Span::new(arguments.open, arguments.open + 1);
    let (min, max) = (signature.min_arguments(), signature.max_arguments());
    let actual = arguments.arguments.len();
    if actual < min || actual > max {
        let variant = if min == max { "exact" } else { "default" };
        return Err(ParseError::new(
            ErrorKind::ArityMismatch,
            open,
            variant,
            ctx!(
                "function" => function,
                "min" => min.to_string(),
                "max" => max.to_string(),
                "actual" => actual.to_string(),
            ),
        ));
    }

    let mut supplied = arguments.arguments.iter();
    let mut bound = Vec::with_capacity(signature.parameters.len());
    for param in &signature.parameters {
        if param.generator_only {
            bound.push(ResolvedArgument::Raw {
                text: String::new(),
            });
            continue;
        }
        let value = match supplied.next() {
            Some(arg) if !(param.optional && arg.is_blank()) => {
                let RawArgument { text, start } = *arg;
                Bound::Written(text, start)
            }
            Some(_) | None if param.optional => Bound::Synthesized(default_value(param)),
            _ => Bound::Synthesized(String::new()),
        };
        bound.push(parse_bound(callbacks, param, &value, open)?);
    }
    Ok(bound)
}

fn parse_bound<Cb>(
    callbacks: &mut Cb,
    param: &ParameterDescriptor,
    value: &Bound<'_>,
    open: Span,
) -> Result<ResolvedArgument<Cb::Sub>, ParseError>
where
    Cb: ExpressionCallbacks + ?Sized,
{
    let text = value.text();
    let remap = |err: ParseError| match value {
        Bound::Written(_, start) => err.shifted(*start),
        Bound::Synthesized(_) => err.relocated(open),
    };
    trace!(kind = %param.kind, value = text, "binding argument");
    Ok(match param.kind.value_kind() {
        Some(ValueKind::Number) => ResolvedArgument::Numeric {
            source: text.to_string(),
            parsed: callbacks.on_sub_numeric_expression(text).map_err(remap)?,
        },
        Some(ValueKind::Text) => ResolvedArgument::Text {
            source: text.to_string(),
            parsed: callbacks.on_sub_string_expression(text).map_err(remap)?,
        },
        None => ResolvedArgument::Raw {
            text: text.trim().to_string(),
        },
    })
}
