use super::pattern::RegexLiteral;
use super::{MatchScore, match_score};
use crate::coerce::js_parse_float;
use crate::context::TestContext;
use crate::time::{self, DateKind};
use crate::value::{Value, get_path, stringify};

/// Matches anything that is present.
pub const WILDCARD: &str = "**";
/// Matches only null or absent.
pub const NULL_SENTINEL: &str = "-";

/// Outcome for one expected field in scoring mode.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldVerdict {
    Match,
    Mismatch(String),
    /// Score of a nested mapping, passed through as is.
    Nested(MatchScore),
}

pub fn is_wildcard(expected: &Value) -> bool {
    expected.as_str() == Some(WILDCARD)
}

pub fn is_null_sentinel(expected: &Value) -> bool {
    matches!(expected, Value::Null) || expected.as_str() == Some(NULL_SENTINEL)
}

/// `field "<key>". Expected <json> but found: <json>[ -- message]`
pub fn explain(
    key: &str,
    expected: &Value,
    actual: Option<&Value>,
    message: Option<&str>,
) -> String {
    let mut explanation = format!(
        "field \"{key}\". Expected {} but found: {}",
        expected.to_json_string(),
        stringify(actual)
    );
    if let Some(message) = message.filter(|message| !message.is_empty()) {
        explanation.push_str(" -- ");
        explanation.push_str(message);
    }
    explanation
}

/// Compare `expected` with the value at `key` (a path) in `source`.
pub fn value_matches(
    source: &Value,
    key: &str,
    expected: &Value,
    context: &TestContext,
    message: Option<&str>,
) -> FieldVerdict {
    let actual = get_path(source, key);

    if is_wildcard(expected) {
        return match actual {
            Some(_) => FieldVerdict::Match,
            None => FieldVerdict::Mismatch(format!(
                "{} (expected field to exist)",
                explain(key, expected, actual, message)
            )),
        };
    }

    if expected.is_structured() {
        return match actual {
            Some(actual) if actual.is_structured() => {
                FieldVerdict::Nested(match_score(actual, expected, context))
            }
            _ => FieldVerdict::Mismatch(explain(key, expected, actual, message)),
        };
    }

    match scalar_verdict(actual, expected, context, key, message) {
        Ok(()) => FieldVerdict::Match,
        Err(explanation) => FieldVerdict::Mismatch(explanation),
    }
}

/// Rules shared by every mode for a non-structured expected value.
/// `Err` carries the explanation.
pub fn scalar_verdict(
    actual: Option<&Value>,
    expected: &Value,
    context: &TestContext,
    key: &str,
    message: Option<&str>,
) -> Result<(), String> {
    let explanation = || explain(key, expected, actual, message);

    if is_wildcard(expected) {
        return Ok(());
    }

    if is_null_sentinel(expected) {
        return match actual {
            None | Some(Value::Null) => Ok(()),
            Some(_) => Err(explanation()),
        };
    }

    if let Value::Date(instant) = expected {
        return time::times_equal(context, *instant, actual, key, &explanation());
    }

    let Some(actual) = actual.filter(|actual| !actual.is_null()) else {
        return Err(explanation());
    };

    if let Some(text) = expected.as_str()
        && let Some(literal) = RegexLiteral::parse(text)
    {
        return match literal.compile() {
            Ok(regex) if regex.is_match(&actual.to_display_string()) => Ok(()),
            Ok(_) => Err(explanation()),
            Err(error) => Err(format!("{} (invalid regex: {error})", explanation())),
        };
    }

    if let Value::Date(actual_instant) = actual {
        return match time::classify_date(expected) {
            DateKind::Instant(instant) | DateKind::IsoText(instant)
                if instant == *actual_instant =>
            {
                Ok(())
            }
            _ => Err(explanation()),
        };
    }

    if let (DateKind::IsoText(actual_instant), Some(expected_instant)) =
        (time::classify_date(actual), time::classify_date(expected).instant())
    {
        return if actual_instant == expected_instant {
            Ok(())
        } else {
            Err(explanation())
        };
    }

    if actual.is_finite_number() {
        let expected_number = match expected {
            Value::Number(number) => *number,
            Value::String(text) => js_parse_float(text).unwrap_or(f64::NAN),
            _ => f64::NAN,
        };
        return if actual.as_f64() == Some(expected_number) {
            Ok(())
        } else {
            Err(explanation())
        };
    }

    if actual == expected {
        Ok(())
    } else {
        Err(explanation())
    }
}
