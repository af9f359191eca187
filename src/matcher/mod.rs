//! Field-by-field comparison of actual data against an expected shape.
//!
//! Two contracts share the same field rules: [`matches`] answers yes or no,
//! [`match_score`] counts matching fields and explains the rest so a
//! collection can be ranked for the closest match.

pub mod closest;
pub mod field;
pub mod pattern;
pub mod subset;

pub use closest::{ClosestMatch, closest_match_explanation, find_closest_match};
pub use field::{FieldVerdict, NULL_SENTINEL, WILDCARD, explain, value_matches};
pub use pattern::RegexLiteral;
pub use subset::{SubsetOptions, is_subset_of, prune_nulls};

use crate::context::TestContext;
use crate::value::{Value, get_path};
use serde::Serialize;

/// Number of expected fields that matched, plus one explanation per miss.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchScore {
    pub score: usize,
    pub diffs: Vec<String>,
}

impl MatchScore {
    pub fn is_perfect(&self) -> bool {
        self.diffs.is_empty()
    }

    fn absorb(&mut self, verdict: FieldVerdict) {
        match verdict {
            FieldVerdict::Match => self.score += 1,
            FieldVerdict::Mismatch(diff) => self.diffs.push(diff),
            FieldVerdict::Nested(nested) if nested.diffs.is_empty() => self.score += nested.score,
            FieldVerdict::Nested(nested) => self.diffs.extend(nested.diffs),
        }
    }
}

/// Options for the boolean contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Skip expected fields whose value is null.
    pub ignore_nulls: bool,
}

/// Score `actual` against every field of `expected`. Never fails; misses
/// come back as data.
pub fn match_score(actual: &Value, expected: &Value, context: &TestContext) -> MatchScore {
    let mut total = MatchScore::default();
    for (key, expected_value) in expected.entries() {
        total.absorb(value_matches(actual, &key, expected_value, context, None));
    }
    total
}

/// True when every expected field is satisfied. Extra actual fields are
/// ignored; a wildcard also accepts an absent field; an expected array is
/// satisfied when each of its elements matches some actual element.
pub fn matches(
    actual: &Value,
    expected: &Value,
    context: &TestContext,
    options: MatchOptions,
) -> bool {
    match expected {
        Value::Object(_) => expected.entries().into_iter().all(|(key, expected_value)| {
            if options.ignore_nulls && expected_value.is_null() {
                return true;
            }
            field_matches(get_path(actual, &key), expected_value, &key, context, options)
        }),
        Value::Array(expected_items) => match actual {
            Value::Array(actual_items) => expected_items.iter().all(|expected_item| {
                actual_items.iter().any(|actual_item| {
                    field_matches(Some(actual_item), expected_item, "", context, options)
                })
            }),
            _ => false,
        },
        scalar => field::scalar_verdict(Some(actual), scalar, context, "", None).is_ok(),
    }
}

fn field_matches(
    actual: Option<&Value>,
    expected: &Value,
    key: &str,
    context: &TestContext,
    options: MatchOptions,
) -> bool {
    if expected.is_structured() {
        return actual.is_some_and(|actual| {
            actual.is_structured() && matches(actual, expected, context, options)
        });
    }
    field::scalar_verdict(actual, expected, context, key, None).is_ok()
}
