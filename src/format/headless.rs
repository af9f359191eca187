use crate::failure::{Failure, Result};
use crate::value::{Map, Value};

/// Fold rows whose first column is blank into the row above them.
///
/// The header is the first key of the first row. A row is headless when its
/// header value is missing, null, `""` or `false`; zero still counts as a head.
pub fn merge_headless(rows: Value) -> Result<Value> {
    let Value::Array(rows) = rows else {
        return Err(Failure::NotASequence {
            found: rows.type_name().to_owned(),
        });
    };

    let header = rows
        .first()
        .and_then(Value::as_object)
        .and_then(|first| first.keys().next().cloned());

    let mut merged: Vec<Value> = Vec::with_capacity(rows.len());
    for row in rows {
        if has_head(&row, header.as_deref()) {
            merged.push(row);
            continue;
        }

        let Some(Value::Object(target)) = merged.last_mut() else {
            return Err(Failure::OrphanedHeadlessRow {
                row: row.to_json_string(),
            });
        };
        if let Value::Object(fields) = &row {
            merge_row(target, fields, header.as_deref());
        }
    }

    tracing::trace!(rows = merged.len(), "merged headless rows");
    Ok(Value::Array(merged))
}

fn has_head(row: &Value, header: Option<&str>) -> bool {
    let Some(header) = header else {
        return true;
    };
    match row.child(header) {
        Some(Value::Number(number)) if *number == 0.0 => true,
        Some(head) => head.is_truthy(),
        None => false,
    }
}

fn merge_row(target: &mut Map, row: &Map, header: Option<&str>) {
    for (key, value) in row {
        if Some(key.as_str()) == header || matches!(value, Value::String(text) if text.is_empty()) {
            continue;
        }

        match (target.get_mut(key), value) {
            (None, _) => {
                target.insert(key.clone(), value.clone());
            }
            (Some(Value::Object(nested)), Value::Object(fields)) => fill_absent(nested, fields),
            (Some(_), Value::Object(_)) => {}
            (Some(Value::Array(accumulated)), _) => accumulated.push(value.clone()),
            (Some(existing), _) => {
                let first = std::mem::take(existing);
                *existing = Value::Array(vec![first, value.clone()]);
            }
        }
    }
}

fn fill_absent(target: &mut Map, fields: &Map) {
    for (key, value) in fields {
        if matches!(value, Value::String(text) if text.is_empty()) {
            continue;
        }
        match (target.get_mut(key), value) {
            (None, _) => {
                target.insert(key.clone(), value.clone());
            }
            (Some(Value::Object(nested)), Value::Object(inner)) => fill_absent(nested, inner),
            (Some(_), _) => {}
        }
    }
}
