//! Small table-data transforms used around formatting.

use crate::coerce::{FormatOptions, coerce_value};
use crate::failure::Result;
use crate::value::{Value, set_path};
use regex::Regex;
use std::sync::LazyLock;

static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+\.\d{2}$").expect("valid amount regex"));

/// Coerce every value and expand dotted keys into nested objects:
/// `{"some.key": 99}` becomes `{"some": {"key": 99}}`.
pub fn build_paths(object: &Value, options: &FormatOptions) -> Result<Value> {
    let mut built = Value::object();
    for (key, raw) in object.entries() {
        let Some(value) = coerce_value(raw, options)? else {
            continue;
        };
        if key.contains('.') {
            set_path(&mut built, &key, value);
        } else if let Some(fields) = built.as_object_mut() {
            fields.insert(key, value);
        }
    }
    Ok(built)
}

/// Parse top-level string fields that start with `{` or `[` as strict JSON.
/// Fields that fail to parse are logged and left as they are.
pub fn parse_json_properties(data: &mut Value) {
    let Some(fields) = data.as_object_mut() else {
        return;
    };

    for (key, field) in fields.iter_mut() {
        let Value::String(text) = &*field else {
            continue;
        };
        if !(text.starts_with('{') || text.starts_with('[')) {
            continue;
        }
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(parsed) => *field = Value::from(parsed),
            Err(error) => tracing::warn!(key = %key, "could not parse JSON property: {error}"),
        }
    }
}

/// Remove `_id` from every nested object (the top level keeps its own).
pub fn drop_internal_ids(data: &mut Value) {
    let children: Vec<&mut Value> = match data {
        Value::Object(fields) => fields.values_mut().collect(),
        Value::Array(items) => items.iter_mut().collect(),
        _ => return,
    };

    for child in children {
        if let Value::Object(fields) = &mut *child {
            fields.shift_remove("_id");
        }
        drop_internal_ids(child);
    }
}

/// Top-level values that look like `12.34` become integer cents.
pub fn map_amount_properties_to_cents(object: &Value) -> Value {
    let Some(fields) = object.as_object() else {
        return object.clone();
    };

    let mapped = fields
        .iter()
        .map(|(key, value)| {
            let cents = match value {
                Value::String(_) | Value::Number(_) => {
                    let text = value.to_display_string();
                    AMOUNT
                        .is_match(&text)
                        .then(|| text.parse::<f64>().ok())
                        .flatten()
                        .map(|amount| Value::Number((amount * 100.0).round()))
                }
                _ => None,
            };
            (key.clone(), cents.unwrap_or_else(|| value.clone()))
        })
        .collect();
    Value::Object(mapped)
}

/// Keys of `first` whose values differ from the same key in `second`.
pub fn diff_keys(first: &Value, second: &Value) -> Vec<String> {
    first
        .entries()
        .into_iter()
        .filter(|(key, value)| second.child(key) != Some(*value))
        .map(|(key, _)| key)
        .collect()
}
