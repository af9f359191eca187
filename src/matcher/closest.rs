use super::match_score;
use crate::context::TestContext;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ClosestMatch<'a> {
    pub index: usize,
    pub entry: &'a Value,
    pub score: usize,
    pub diffs: Vec<String>,
}

/// Highest-scoring entry of `collection`. Ties keep the first entry found.
/// `None` when the collection is empty or nothing scores above zero.
pub fn find_closest_match<'a>(
    collection: &'a [Value],
    expected: &Value,
    context: &TestContext,
) -> Option<ClosestMatch<'a>> {
    let mut best: Option<ClosestMatch<'a>> = None;

    for (index, entry) in collection.iter().enumerate() {
        let scored = match_score(entry, expected, context);
        let best_score = best.as_ref().map_or(0, |best| best.score);
        if scored.score > best_score {
            best = Some(ClosestMatch {
                index,
                entry,
                score: scored.score,
                diffs: scored.diffs,
            });
        }
    }

    if best.is_none() {
        tracing::debug!(
            candidates = collection.len(),
            expected = %expected,
            "no closest match found"
        );
    }
    best
}

/// Diagnostic suffix appended to "no entry matched" failures; empty when
/// there is no closest match.
pub fn closest_match_explanation(
    collection: &[Value],
    expected: &Value,
    context: &TestContext,
) -> String {
    match find_closest_match(collection, expected, context) {
        Some(closest) => format!(
            "\nDiff to closest match: {}\nClosest match (score={}): {}",
            closest.diffs.join("\n\t"),
            closest.score,
            closest.entry.to_json_pretty()
        ),
        None => String::new(),
    }
}
