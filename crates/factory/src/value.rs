//! Dynamic property values.
//!
//! Property values are plain JSON values. A positional constructor argument is
//! an [`Arg`]: `None` means "not supplied", which is different from supplying
//! an explicit `null`.

pub use serde_json::{Map, Value};

/// A positional constructor argument. `None` is the absent marker.
pub type Arg = Option<Value>;

/// Text of a value as it appears when substituted into a message.
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether a value counts as "nothing" when used as a message.
pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

/// Raw message text for a value assigned to `message` or `_message`.
///
/// Blank values produce an empty message, which renders as the type name.
pub(crate) fn message_text(value: &Value) -> String {
    match is_blank(value) {
        true => String::new(),
        false => display(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!("Hello"), "Hello")]
    #[case(json!(42), "42")]
    #[case(json!(true), "true")]
    #[case(json!(null), "null")]
    #[case(json!([1, 2]), "[1,2]")]
    fn test_display(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(display(&value), expected);
    }

    #[rstest]
    #[case(json!(null), "")]
    #[case(json!(false), "")]
    #[case(json!(0), "")]
    #[case(json!(""), "")]
    #[case(json!("text"), "text")]
    #[case(json!(true), "true")]
    #[case(json!(7), "7")]
    fn test_message_text(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(message_text(&value), expected);
    }
}
