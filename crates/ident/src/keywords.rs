//! Reserved words that can never be used as a bare identifier.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Strict, reserved and edition-dependent keywords, plus the lone underscore.
static KEYWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        // Strict
        "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for", "if", "impl",
        "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return", "self", "Self", "static",
        "struct", "super", "trait", "true", "type", "unsafe", "use", "where", "while",
        // 2018+
        "async", "await", "dyn",
        // Reserved for future use
        "abstract", "become", "box", "do", "final", "macro", "override", "priv", "typeof", "unsized", "virtual",
        "yield", "try", "gen",
        "_",
    ])
});

/// Returns `true` if `word` is reserved and cannot name a type or property.
pub(crate) fn is_reserved(word: &str) -> bool {
    KEYWORDS.contains(word)
}
