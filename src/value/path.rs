use super::{Map, Value};

/// One step of a lodash-style property path (`a.b[0]["c.d"]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment(pub String);

impl PathSegment {
    fn index(&self) -> Option<usize> {
        if self.0.is_empty() || !self.0.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }
        self.0.parse().ok()
    }
}

/// Split a path on `.` and `[...]`. Quoted bracket keys keep their dots.
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();

    while let Some(character) = chars.next() {
        match character {
            '.' => {
                if !current.is_empty() {
                    segments.push(PathSegment(std::mem::take(&mut current)));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(PathSegment(std::mem::take(&mut current)));
                }
                let quote = chars.peek().copied().filter(|next| *next == '"' || *next == '\'');
                if quote.is_some() {
                    chars.next();
                }
                let mut inner = String::new();
                while let Some(next) = chars.next() {
                    if Some(next) == quote && chars.peek() == Some(&']') {
                        chars.next();
                        break;
                    }
                    if quote.is_none() && next == ']' {
                        break;
                    }
                    inner.push(next);
                }
                segments.push(PathSegment(inner));
            }
            other => current.push(other),
        }
    }

    if !current.is_empty() {
        segments.push(PathSegment(current));
    }

    segments
}

/// `_.get`: a literal key wins over path interpretation.
pub fn get_path<'a>(source: &'a Value, path: &str) -> Option<&'a Value> {
    if let Some(direct) = source.child(path) {
        return Some(direct);
    }

    let segments = parse_path(path);
    if segments.is_empty() {
        return None;
    }

    segments
        .iter()
        .try_fold(source, |current, segment| current.child(&segment.0))
}

/// `_.has`.
pub fn has_path(source: &Value, path: &str) -> bool {
    get_path(source, path).is_some()
}

/// `_.set`: missing containers are created, as arrays when the next
/// segment is an index. Non-structured roots are left untouched.
pub fn set_path(root: &mut Value, path: &str, value: Value) {
    let segments = parse_path(path);
    if segments.is_empty() {
        return;
    }
    set_segments(root, &segments, value);
}

fn set_segments(current: &mut Value, segments: &[PathSegment], value: Value) {
    let (head, rest) = match segments.split_first() {
        Some(split) => split,
        None => return,
    };

    if rest.is_empty() {
        insert_child(current, head, value);
        return;
    }

    let needs_container = !matches!(child_mut(current, head), Some(child) if child.is_structured());
    if needs_container {
        let container = if rest[0].index().is_some() {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        };
        insert_child(current, head, container);
    }

    if let Some(child) = child_mut(current, head) {
        set_segments(child, rest, value);
    }
}

fn child_mut<'a>(current: &'a mut Value, segment: &PathSegment) -> Option<&'a mut Value> {
    match current {
        Value::Object(map) => map.get_mut(&segment.0),
        Value::Array(items) => segment.index().and_then(move |index| items.get_mut(index)),
        _ => None,
    }
}

fn insert_child(current: &mut Value, segment: &PathSegment, value: Value) {
    match current {
        Value::Object(map) => {
            map.insert(segment.0.clone(), value);
        }
        Value::Array(items) => match segment.index() {
            Some(index) => {
                if items.len() <= index {
                    items.resize(index + 1, Value::Null);
                }
                items[index] = value;
            }
            None => {
                // Arrays cannot carry named keys; promote to an object with index keys.
                let mut map: Map = items
                    .drain(..)
                    .enumerate()
                    .map(|(index, item)| (index.to_string(), item))
                    .collect();
                map.insert(segment.0.clone(), value);
                *current = Value::Object(map);
            }
        },
        _ => {}
    }
}

/// `_.unset`: removes an object key; array slots become null holes.
pub fn unset_path(root: &mut Value, path: &str) -> bool {
    if let Value::Object(map) = root
        && map.shift_remove(path).is_some()
    {
        return true;
    }

    let segments = parse_path(path);
    let Some((last, parents)) = segments.split_last() else {
        return false;
    };

    let mut current = root;
    for segment in parents {
        match child_mut(current, segment) {
            Some(child) => current = child,
            None => return false,
        }
    }

    match current {
        Value::Object(map) => map.shift_remove(&last.0).is_some(),
        Value::Array(items) => match last.index().and_then(|index| items.get_mut(index)) {
            Some(slot) => {
                *slot = Value::Null;
                true
            }
            None => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;

    #[test]
    fn parses_dots_and_brackets() {
        let segments: Vec<String> = parse_path(r#"a.b[0]["c.d"]"#)
            .into_iter()
            .map(|s| s.0)
            .collect();
        assert_eq!(segments, vec!["a", "b", "0", "c.d"]);
    }

    #[test]
    fn get_prefers_literal_key() {
        let source = value!({"a.b": 1, "a": {"b": 2}});
        assert_eq!(get_path(&source, "a.b"), Some(&Value::Number(1.0)));
        assert_eq!(get_path(&source, "a[b]"), Some(&Value::Number(2.0)));
        assert_eq!(get_path(&source, "a.c"), None);
    }

    #[test]
    fn set_builds_arrays_for_index_segments() {
        let mut target = Value::object();
        set_path(&mut target, "content.0.info", Value::from("B"));
        set_path(&mut target, "content.1.info", Value::from("sky"));
        assert_eq!(target, value!({"content": [{"info": "B"}, {"info": "sky"}]}));
    }

    #[test]
    fn unset_removes_nested_keys() {
        let mut target = value!({"a": {"b": 1, "c": 2}});
        assert!(unset_path(&mut target, "a.b"));
        assert!(!unset_path(&mut target, "a.missing"));
        assert_eq!(target, value!({"a": {"c": 2}}));
    }
}
