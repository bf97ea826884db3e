//! CSS identifier grammar checks and the reserved keyword list.

use crate::core::error::{InvalidNameError, InvalidNameReason};

/// Keywords that must never be emitted as class names.
///
/// Stored lowercase; matching is case-insensitive.
pub const CSS_RESERVED_KEYWORDS: &[&str] = &[
    // CSS-wide keywords
    "inherit",
    "initial",
    "unset",
    "revert",
    "revert-layer",
    "default",
    // common value keywords
    "auto",
    "none",
    "normal",
    "important",
    "transparent",
    "currentcolor",
    // at-rule and media-query vocabulary
    "and",
    "not",
    "only",
    "or",
    "all",
    "screen",
    "print",
    "media",
    "supports",
    "layer",
    "import",
    "keyframes",
    "from",
    "to",
    // selector functions
    "is",
    "where",
    "has",
    "nth-child",
];

/// True when `name` matches a CSS keyword regardless of case
pub fn is_css_keyword(name: &str) -> bool
{
    CSS_RESERVED_KEYWORDS
        .iter()
        .any(|k| k.eq_ignore_ascii_case(name))
}

/// Check `name` against the class-identifier grammar used for generated names.
///
/// Accepted names use only `[A-Za-z0-9_-]`, do not start with a digit or a
/// hyphen followed by a digit, and are not a lone hyphen.
pub fn validate_css_identifier(name: &str) -> Result<(), InvalidNameError>
{
    let fail = |reason| {
        Err(InvalidNameError {
            name: name.to_string(),
            reason,
        })
    };

    let mut chars = name.chars();
    let Some(first) = chars.next()
    else
    {
        return fail(InvalidNameReason::Empty);
    };

    if name
        .chars()
        .any(char::is_whitespace)
    {
        return fail(InvalidNameReason::Whitespace);
    }

    if let Some(c) = name
        .chars()
        .find(|&c| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
    {
        return fail(InvalidNameReason::IllegalCharacter(c));
    }

    if first.is_ascii_digit()
    {
        return fail(InvalidNameReason::LeadingDigit);
    }

    if first == '-'
    {
        match chars.next()
        {
            None => return fail(InvalidNameReason::LoneHyphen),
            Some(d) if d.is_ascii_digit() => return fail(InvalidNameReason::LeadingHyphenDigit),
            Some(_) =>
            {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn reason(name: &str) -> InvalidNameReason
    {
        validate_css_identifier(name)
            .unwrap_err()
            .reason
    }

    #[test]
    fn accepts_plain_identifiers()
    {
        for ok in ["a", "zz", "_x", "-a", "--token", "a1", "A-b_c"]
        {
            assert!(validate_css_identifier(ok).is_ok(), "{ok} should be valid");
        }
    }

    #[test]
    fn rejects_grammar_violations()
    {
        assert_eq!(reason(""), InvalidNameReason::Empty);
        assert_eq!(reason("1a"), InvalidNameReason::LeadingDigit);
        assert_eq!(reason("-1a"), InvalidNameReason::LeadingHyphenDigit);
        assert_eq!(reason("-"), InvalidNameReason::LoneHyphen);
        assert_eq!(reason("a b"), InvalidNameReason::Whitespace);
        assert_eq!(reason("a\tb"), InvalidNameReason::Whitespace);
        assert_eq!(reason("a:b"), InvalidNameReason::IllegalCharacter(':'));
        assert_eq!(reason("é"), InvalidNameReason::IllegalCharacter('é'));
    }

    #[test]
    fn keywords_match_case_insensitively()
    {
        assert!(is_css_keyword("auto"));
        assert!(is_css_keyword("AUTO"));
        assert!(is_css_keyword("Inherit"));
        assert!(!is_css_keyword("a"));
    }
}
