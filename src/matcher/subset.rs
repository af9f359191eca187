use crate::value::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubsetOptions {
    /// Drop null fields from the subset before comparing.
    pub ignore_nulls: bool,
}

/// Partial deep equality, independent of the matcher's sentinel rules:
/// objects may carry extra keys, every subset array element needs some equal
/// element in the full array, and a null in the subset must be present and
/// null in the full value.
pub fn is_subset_of(subset: &Value, full: &Value, options: SubsetOptions) -> bool {
    if options.ignore_nulls {
        let mut pruned = subset.clone();
        prune_nulls(&mut pruned);
        return is_partial_match(full, &pruned);
    }
    is_partial_match(full, subset)
}

fn is_partial_match(full: &Value, subset: &Value) -> bool {
    match (full, subset) {
        (Value::Object(full), Value::Object(subset)) => subset.iter().all(|(key, expected)| {
            full.get(key)
                .is_some_and(|actual| is_partial_match(actual, expected))
        }),
        (Value::Array(full), Value::Array(subset)) => subset
            .iter()
            .all(|expected| full.iter().any(|actual| is_partial_match(actual, expected))),
        (full, subset) => full == subset,
    }
}

/// Remove null-valued keys everywhere in `value`, nested objects and
/// objects inside arrays included.
pub fn prune_nulls(value: &mut Value) {
    match value {
        Value::Object(fields) => {
            fields.retain(|_, field| !field.is_null());
            fields.values_mut().for_each(prune_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(prune_nulls),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;

    #[test]
    fn ignore_nulls_skips_null_keys() {
        let subset = value!({"a": null, "b": 1});
        let full = value!({"b": 1, "c": 2});
        assert!(is_subset_of(&subset, &full, SubsetOptions { ignore_nulls: true }));
        assert!(!is_subset_of(&subset, &full, SubsetOptions::default()));
        assert!(is_subset_of(&subset, &value!({"a": null, "b": 1}), SubsetOptions::default()));
    }

    #[test]
    fn arrays_match_as_unordered_subsets() {
        let full = value!({"tags": ["x", "y", {"k": 1, "v": 2}]});
        assert!(is_subset_of(&value!({"tags": ["y", {"k": 1}]}), &full, SubsetOptions::default()));
        assert!(!is_subset_of(&value!({"tags": ["z"]}), &full, SubsetOptions::default()));
    }

    #[test]
    fn scalars_need_strict_equality() {
        assert!(!is_subset_of(&value!({"n": "1"}), &value!({"n": 1}), SubsetOptions::default()));
        assert!(!is_subset_of(&value!({"n": "**"}), &value!({"n": 1}), SubsetOptions::default()));
    }

    #[test]
    fn pruning_is_deep() {
        let mut expected = value!({
            "a": null,
            "b": {"c": null, "d": 1},
            "e": [{"f": null, "g": 2}]
        });
        prune_nulls(&mut expected);
        assert_eq!(expected, value!({"b": {"d": 1}, "e": [{"g": 2}]}));
    }
}
