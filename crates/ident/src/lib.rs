//! Identifier validation for generated error types.
//!
//! Type names and property names end up as names in a declared type's
//! signature, so they have to look like identifiers: a letter, `_` or `$`
//! first, then letters, digits, `_` or `$`. Reserved keywords are rejected.
//!
//! Type names may be scope-qualified (`my.scope.ArgumentError`), in which case
//! every dot-separated segment is validated on its own.

pub mod error;
mod keywords;

use crate::error::{ErrorKind, Result};
use regex::Regex;
use std::sync::LazyLock;

static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}_$][\p{L}\p{Nd}_$]*$").unwrap());

/// Scope allowances for [`is_valid`] and [`validate`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Options {
    /// Accept `.`-separated scope qualification (`ns.Name`).
    pub allow_scope: bool,
}
impl Options {
    /// Options for a scope-qualified name (type names).
    pub const SCOPED: Self = Self { allow_scope: true };
    /// Options for a bare name (property names).
    pub const BARE: Self = Self { allow_scope: false };
}

/// Returns whether `candidate` is safe to use as an identifier.
///
/// # Examples
///
/// ```
/// use errgen_ident::{Options, is_valid};
/// assert!(is_valid("ArgumentError", Options::BARE));
/// assert!(is_valid("my.ArgumentError", Options::SCOPED));
/// // Invalid
/// assert!(!is_valid("my.ArgumentError", Options::BARE));
/// assert!(!is_valid("1st", Options::BARE));
/// assert!(!is_valid("while", Options::BARE));
/// assert!(!is_valid("", Options::SCOPED));
/// ```
pub fn is_valid(candidate: impl AsRef<str>, options: Options) -> bool {
    let candidate = candidate.as_ref();
    match options.allow_scope {
        true => candidate.split('.').all(is_valid_segment),
        false => is_valid_segment(candidate),
    }
}

/// Validates `candidate`, returning it unchanged or [`ErrorKind::Invalid`].
pub fn validate(candidate: &str, options: Options) -> Result<&str> {
    if !is_valid(candidate, options) {
        exn::bail!(ErrorKind::Invalid(candidate.to_string()));
    }
    Ok(candidate)
}

fn is_valid_segment(segment: &str) -> bool {
    IDENTIFIER_REGEX.is_match(segment) && !keywords::is_reserved(segment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("CustomError")]
    #[case("customError")]
    #[case("Error")]
    #[case("_private")]
    #[case("$dollar")]
    #[case("undefined")]
    #[case("Ünïcödé")]
    #[case("with123digits")]
    fn test_valid_bare(#[case] candidate: &str) {
        assert!(is_valid(candidate, Options::BARE));
        assert!(is_valid(candidate, Options::SCOPED));
    }

    #[rstest]
    #[case("")]
    #[case(" name")]
    #[case("name ")]
    #[case("-")]
    #[case("!")]
    #[case("123")]
    #[case("1abc")]
    #[case("while")]
    #[case("false")]
    #[case("while (true);")]
    #[case("console.log(false)")]
    #[case("if(true)process.exit()")]
    #[case("_")]
    fn test_invalid_bare(#[case] candidate: &str) {
        assert!(!is_valid(candidate, Options::BARE));
    }

    #[rstest]
    #[case("my.ArgumentError", true)]
    #[case("a.b.c.Error", true)]
    #[case("namespace.TestError", true)]
    #[case(".Error", false)]
    #[case("Error.", false)]
    #[case("a..b", false)]
    #[case("my.while", false)]
    #[case("my.1Error", false)]
    fn test_scoped(#[case] candidate: &str, #[case] expected: bool) {
        assert_eq!(is_valid(candidate, Options::SCOPED), expected);
        assert!(!is_valid(candidate, Options::BARE));
    }

    #[test]
    fn test_validate_returns_candidate() {
        assert_eq!(validate("Name", Options::BARE).unwrap(), "Name");
        let err = validate("9lives", Options::BARE).unwrap_err();
        assert_eq!(*err, ErrorKind::Invalid("9lives".to_string()));
    }
}
