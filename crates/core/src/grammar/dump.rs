use super::tree::{ParseResult, ParsedExpression};

/// Serialize a parsed expression to a pretty-printed JSON string.
pub fn to_pretty_json(expression: &ParsedExpression) -> String {
    serde_json::to_string_pretty(expression).expect("ParsedExpression serialization cannot fail")
}

/// Serialize a whole parse result (tree and diagnostics) to pretty JSON.
pub fn result_to_pretty_json(result: &ParseResult) -> String {
    serde_json::to_string_pretty(result).expect("ParseResult serialization cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::tree::Fragment;
    use gdexpr_catalog::ValueKind;

    #[test]
    fn fragments_are_tagged_by_type() {
        let expression = ParsedExpression {
            kind: ValueKind::Number,
            fragments: vec![Fragment::Constant { text: "1+2".into() }],
        };
        let json: serde_json::Value = serde_json::from_str(&to_pretty_json(&expression)).unwrap();
        assert_eq!(json["kind"], "number");
        assert_eq!(json["fragments"][0]["type"], "constant");
        assert_eq!(json["fragments"][0]["text"], "1+2");
    }
}
