//! Message rendering.
//!
//! Raw messages may contain `{{token}}` placeholders which are filled from the
//! instance's `messageData` object when it is read. Tokens without data are
//! left in place, so rendering never fails.

use crate::value::{Map, Value, display};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{([^}]+)\}\}").unwrap());

/// Renders a raw message, falling back to `name` when the raw message is empty.
///
/// ```
/// use errgen_factory::message::render;
/// use serde_json::json;
///
/// let data = json!({"bar": "Hello"}).as_object().cloned().unwrap();
/// assert_eq!(render("Foo {{bar}}", "TestError", Some(&data)), "Foo Hello");
/// assert_eq!(render("Foo {{baz}}", "TestError", Some(&data)), "Foo {{baz}}");
/// assert_eq!(render("", "TestError", None), "TestError");
/// ```
pub fn render(raw: &str, name: &str, data: Option<&Map<String, Value>>) -> String {
    let message = match raw.is_empty() {
        true => name,
        false => raw,
    };
    match data {
        Some(data) => substitute(message, data).into_owned(),
        None => message.to_string(),
    }
}

fn substitute<'a>(message: &'a str, data: &Map<String, Value>) -> Cow<'a, str> {
    TOKEN_REGEX.replace_all(message, |captures: &Captures<'_>| match data.get(&captures[1]) {
        Some(value) => display(value),
        None => captures[0].to_string(),
    })
}

/// Rewrites the first occurrence of the previously rendered message in a
/// stack string. Plain substring replacement, no template expansion.
pub(crate) fn restamp(stack: &str, previous: &str, current: &str) -> String {
    stack.replacen(previous, current, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[rstest]
    #[case("Foo {{bar}}", json!({"bar": "Hello"}), "Foo Hello")]
    #[case("Foo {{bar}}", json!({"foo": "Hello"}), "Foo {{bar}}")]
    #[case("{{a}} and {{a}}", json!({"a": 1}), "1 and 1")]
    #[case("{{ spaced }}", json!({" spaced ": "yes"}), "yes")]
    #[case("{{n}}/{{b}}/{{z}}", json!({"n": null, "b": false, "z": 0}), "null/false/0")]
    #[case("{{{a}}}", json!({"a": "x"}), "{{{a}}}")]
    #[case("{{}}", json!({"": "empty"}), "{{}}")]
    fn test_render_with_data(#[case] raw: &str, #[case] values: Value, #[case] expected: &str) {
        assert_eq!(render(raw, "TestError", Some(&data(values))), expected);
    }

    #[test]
    fn test_render_without_data() {
        assert_eq!(render("Foo {{bar}}", "TestError", None), "Foo {{bar}}");
        assert_eq!(render("", "TestError", None), "TestError");
    }

    #[test]
    fn test_render_fallback_name_is_templated() {
        assert_eq!(render("", "{{x}}", Some(&data(json!({"x": "y"})))), "y");
    }

    #[test]
    fn test_restamp_first_occurrence_only() {
        assert_eq!(restamp("E: Foo\nFoo", "Foo", "Bar"), "E: Bar\nFoo");
        assert_eq!(restamp("E: Foo", "Missing", "Bar"), "E: Foo");
    }
}
