use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

static REGEX_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^/(.*)/([gimsuxy]*)$").expect("valid regex-literal regex"));

/// `/pattern/flags` text. `i`, `m`, `s` and `x` map onto the regex engine;
/// `g`, `u` and `y` are accepted and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexLiteral<'a> {
    pub pattern: &'a str,
    pub flags: &'a str,
}

impl<'a> RegexLiteral<'a> {
    pub fn parse(text: &'a str) -> Option<Self> {
        let captures = REGEX_LITERAL.captures(text)?;
        Some(Self {
            pattern: captures.get(1)?.as_str(),
            flags: captures.get(2)?.as_str(),
        })
    }

    pub fn compile(&self) -> Result<Regex, regex::Error> {
        RegexBuilder::new(self.pattern)
            .case_insensitive(self.flags.contains('i'))
            .multi_line(self.flags.contains('m'))
            .dot_matches_new_line(self.flags.contains('s'))
            .ignore_whitespace(self.flags.contains('x'))
            .build()
    }
}

pub fn is_regex_literal(text: &str) -> bool {
    REGEX_LITERAL.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pattern_and_flags() {
        let literal = RegexLiteral::parse("/^h.+d$/i").expect("literal");
        assert_eq!(literal.pattern, "^h.+d$");
        assert_eq!(literal.flags, "i");
        assert!(literal.compile().expect("compile").is_match("HELLO world"));
    }

    #[test]
    fn slashes_inside_the_pattern_are_kept() {
        let literal = RegexLiteral::parse("/^a/b$/").expect("literal");
        assert_eq!(literal.pattern, "^a/b$");
        assert_eq!(literal.flags, "");
    }

    #[test]
    fn rejects_plain_text_and_unknown_flags() {
        assert!(RegexLiteral::parse("hello").is_none());
        assert!(RegexLiteral::parse("/abc/q").is_none());
        assert!(!is_regex_literal("2017/01/01"));
    }

    #[test]
    fn reports_invalid_patterns() {
        assert!(RegexLiteral::parse("/(unclosed/").expect("literal").compile().is_err());
    }
}
