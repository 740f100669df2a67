//! Identifier normalization for compiled model components.
//!
//! Monomer, site and parameter names must match `^[A-Za-z_][A-Za-z0-9_]*$`.
//! User-supplied entity names are ASCII-folded, non-conforming characters are
//! replaced with `_`, and a leading digit is prefixed with `p`.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static NON_IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("valid regex"));

static VALID_IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Normalize a name into a valid component identifier.
pub fn sanitize(name: &str) -> String {
    let ascii: String = name.nfkd().filter(char::is_ascii).collect();
    let replaced = NON_IDENT_RE.replace_all(&ascii, "_").into_owned();
    let result = match replaced.chars().next() {
        None => "_".to_owned(),
        Some(c) if c.is_ascii_digit() => format!("p{replaced}"),
        Some(_) => replaced,
    };
    debug_assert!(is_valid(&result));
    result
}

/// Whether a name already is a valid component identifier.
pub fn is_valid(name: &str) -> bool {
    VALID_IDENT_RE.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_digit_gets_prefixed() {
        let name = sanitize("14-3-3");
        assert!(name.chars().next().unwrap().is_ascii_alphabetic());
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        assert_eq!(name, "p14_3_3");
    }

    #[test]
    fn punctuation_becomes_underscore() {
        assert_eq!(sanitize("NF-kB"), "NF_kB");
        assert_eq!(sanitize("PI3 kinase"), "PI3_kinase");
    }

    #[test]
    fn non_ascii_is_folded_or_dropped() {
        assert_eq!(sanitize("NFκB"), "NFB");
        assert_eq!(sanitize("café"), "cafe");
    }

    #[test]
    fn already_valid_names_pass_through() {
        assert_eq!(sanitize("BRAF"), "BRAF");
        assert!(is_valid("BRAF"));
        assert!(!is_valid("14_3_3"));
        assert!(!is_valid(""));
    }
}
