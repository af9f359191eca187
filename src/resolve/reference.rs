use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::LazyLock;

static WHOLE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:\[([^\[\]]+)\])?(?:"([^"]+)"|\(([^()]+)\))\.(\w+(?:\.\w+)*)$"#)
        .expect("valid entity-reference regex")
});

static EMBEDDED_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[([^\[\]]+)\](?:"([^"]+)"|\(([^()]+)\))\.(\w+(?:\.\w+)*)"#)
        .expect("valid embedded entity-reference regex")
});

/// `"name".path`, `(name).path`, `[key](name).path` or `[key]"name".path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityReference {
    /// Explicit resolver key from the `[key]` prefix.
    pub resolver_key: Option<String>,
    pub entity: String,
    pub path: String,
}

impl EntityReference {
    /// Parse a string that is entirely one reference.
    pub fn parse(text: &str) -> Option<Self> {
        WHOLE_REFERENCE.captures(text).and_then(|captures| from_captures(&captures))
    }

    /// Explicitly keyed references embedded in longer text, with their byte ranges.
    pub fn find_embedded(text: &str) -> Vec<(Range<usize>, Self)> {
        EMBEDDED_REFERENCE
            .captures_iter(text)
            .filter_map(|captures| {
                let range = captures.get(0)?.range();
                Some((range, from_captures(&captures)?))
            })
            .collect()
    }
}

fn from_captures(captures: &Captures<'_>) -> Option<EntityReference> {
    let entity = captures.get(2).or_else(|| captures.get(3))?.as_str().to_owned();
    Some(EntityReference {
        resolver_key: captures.get(1).map(|found| found.as_str().to_owned()),
        entity,
        path: captures.get(4)?.as_str().to_owned(),
    })
}

/// Whole-string references, or text carrying at least one keyed reference.
pub fn looks_like_reference(text: &str) -> bool {
    WHOLE_REFERENCE.is_match(text) || EMBEDDED_REFERENCE.is_match(text)
}
