//! Ordered classifier: a raw string gets exactly one syntax tag, picked
//! from the rules that are switched on, before any coercion runs.

use super::options::{FormatOptions, NumberRule};
use crate::resolve::reference;
use crate::time;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

static CURRENCY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$-?\d+\.?\d{0,2}$").expect("valid currency regex"));
static FLOAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+\.?\d*$").expect("valid float regex"));
static EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("valid expression regex"));
static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"(.*)"$"#).expect("valid quoted regex"));

#[derive(Debug, Clone, PartialEq)]
pub enum Syntax<'a> {
    /// `$12.34`, amount already scaled as configured.
    Currency(f64),
    IntegerDate(DateTime<Utc>),
    Number(f64),
    /// ISO-8601 or `[Zone/Name] text`.
    Date,
    Boolean(bool),
    /// Contains `{{...}}`.
    Expression,
    /// Trimmed text wrapped in `{}` or `[]`.
    Json,
    EntityReference,
    /// `-` to drop from the result.
    ExcludedMinus,
    /// `+`, the existence marker.
    Plus,
    /// `-` as null.
    NullMinus,
    Quoted(&'a str),
    Plain,
}

/// What the surrounding call can support beyond the option switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities {
    pub has_context: bool,
    /// Key, containing object and context are all present.
    pub can_resolve_entities: bool,
}

pub fn classify<'a>(
    text: &'a str,
    key: Option<&str>,
    options: &FormatOptions,
    capabilities: Capabilities,
) -> Syntax<'a> {
    if options.active(options.parse_currency) && CURRENCY.is_match(text) {
        let amount = text.replacen('$', "", 1).parse::<f64>().unwrap_or(f64::NAN);
        let amount = if options.currency_to_cents {
            (amount * 100.0).round()
        } else {
            amount
        };
        return Syntax::Currency(amount);
    }

    if options.parse_integer_dates
        && let Some(date) = time::parse_integer_date(text)
    {
        return Syntax::IntegerDate(date);
    }

    match options.numbers() {
        NumberRule::Keys(keys) => {
            let listed = key.is_some_and(|key| keys.iter().any(|listed| listed == key));
            if listed && let Some(number) = js_parse_float(text) {
                return Syntax::Number(to_cents(number, options));
            }
        }
        NumberRule::Pattern if FLOAT.is_match(text) => {
            if let Ok(number) = text.parse::<f64>() {
                return Syntax::Number(to_cents(number, options));
            }
        }
        NumberRule::Pattern | NumberRule::Off => {}
    }

    if options.active(options.parse_dates)
        && (time::parse_iso_8601(text).is_some() || time::is_zoned_local(text))
    {
        return Syntax::Date;
    }

    if options.active(options.parse_booleans) {
        match text {
            "true" => return Syntax::Boolean(true),
            "false" => return Syntax::Boolean(false),
            _ => {}
        }
    }

    if capabilities.has_context && EXPRESSION.is_match(text) {
        return Syntax::Expression;
    }

    if options.active(options.parse_json) && looks_like_json(text) {
        return Syntax::Json;
    }

    if capabilities.can_resolve_entities && reference::looks_like_reference(text) {
        return Syntax::EntityReference;
    }

    if text == "-" && options.exclude_minuses {
        return Syntax::ExcludedMinus;
    }

    if text == "+" && options.active(options.plus_as_exists) {
        return Syntax::Plus;
    }

    if text == "-" && options.active(options.minus_as_null) {
        return Syntax::NullMinus;
    }

    if options.parse_all
        && let Some(inner) = QUOTED.captures(text).and_then(|captures| captures.get(1))
    {
        return Syntax::Quoted(inner.as_str());
    }

    Syntax::Plain
}

fn to_cents(number: f64, options: &FormatOptions) -> f64 {
    if options.numbers_to_cents {
        (number * 100.0).round()
    } else {
        number
    }
}

fn looks_like_json(text: &str) -> bool {
    let trimmed = text.trim();
    (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
}

/// `{{expr}}` spans inside `text`: (whole match range, inner source).
pub(crate) fn expression_spans(text: &str) -> Vec<(std::ops::Range<usize>, &str)> {
    EXPRESSION
        .captures_iter(text)
        .filter_map(|captures| {
            Some((captures.get(0)?.range(), captures.get(1)?.as_str()))
        })
        .collect()
}

/// JavaScript `parseFloat`: longest numeric prefix after leading whitespace.
pub fn js_parse_float(text: &str) -> Option<f64> {
    static PREFIX: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[+-]?(?:Infinity|\d+\.?\d*(?:[eE][+-]?\d+)?|\.\d+(?:[eE][+-]?\d+)?)")
            .expect("valid float-prefix regex")
    });

    let found = PREFIX.find(text.trim_start())?.as_str();
    match found.trim_start_matches(['+', '-']) {
        "Infinity" if found.starts_with('-') => Some(f64::NEG_INFINITY),
        "Infinity" => Some(f64::INFINITY),
        _ => found.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_default(text: &str) -> Syntax<'_> {
        classify(text, Some("field"), &FormatOptions::default(), Capabilities::default())
    }

    #[test]
    fn currency_wins_over_numbers() {
        assert_eq!(classify_default("$12.34"), Syntax::Currency(1234.0));
        let dollars = FormatOptions {
            currency_to_cents: false,
            ..FormatOptions::default()
        };
        assert_eq!(
            classify("$12.34", None, &dollars, Capabilities::default()),
            Syntax::Currency(12.34)
        );
    }

    #[test]
    fn integer_dates_precede_numbers_only_when_enabled() {
        assert_eq!(classify_default("20170101"), Syntax::Number(20_170_101.0));
        let options = FormatOptions {
            parse_integer_dates: true,
            ..FormatOptions::default()
        };
        assert!(matches!(
            classify("20170101", None, &options, Capabilities::default()),
            Syntax::IntegerDate(_)
        ));
    }

    #[test]
    fn number_allow_list_is_keyed() {
        let options = FormatOptions {
            parse_numbers: Some(super::super::options::NumberParsing::Keys(vec!["qty".to_owned()])),
            ..FormatOptions::default()
        };
        assert_eq!(
            classify("7 units", Some("qty"), &options, Capabilities::default()),
            Syntax::Number(7.0)
        );
        assert_eq!(
            classify("7", Some("name"), &options, Capabilities::default()),
            Syntax::Plain
        );
    }

    #[test]
    fn expression_and_entities_need_capabilities() {
        assert_eq!(classify_default("{{this.a}}"), Syntax::Json);
        let with_context = Capabilities {
            has_context: true,
            can_resolve_entities: true,
        };
        assert_eq!(
            classify("{{this.a}}", Some("f"), &FormatOptions::default(), with_context),
            Syntax::Expression
        );
        assert_eq!(
            classify("(blue)._id", Some("f"), &FormatOptions::default(), with_context),
            Syntax::EntityReference
        );
        assert_eq!(classify_default("(blue)._id"), Syntax::Plain);
    }

    #[test]
    fn sentinels_follow_their_switches() {
        assert_eq!(classify_default("-"), Syntax::NullMinus);
        assert_eq!(classify_default("+"), Syntax::Plus);
        assert_eq!(classify_default(r#""007""#), Syntax::Quoted("007"));
        assert_eq!(
            classify("-", None, &FormatOptions::none(), Capabilities::default()),
            Syntax::Plain
        );
        let exclude = FormatOptions {
            exclude_minuses: true,
            ..FormatOptions::default()
        };
        assert_eq!(
            classify("-", None, &exclude, Capabilities::default()),
            Syntax::ExcludedMinus
        );
    }

    #[test]
    fn parse_float_reads_prefixes() {
        assert_eq!(js_parse_float("12.5kg"), Some(12.5));
        assert_eq!(js_parse_float("  -3"), Some(-3.0));
        assert_eq!(js_parse_float("abc"), None);
    }
}
