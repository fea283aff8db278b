//! Dotted-path access into component state
//!
//! `"props.count"` addresses `state["props"]["count"]`. Reads through a
//! missing or non-container intermediate yield `None`. Writes create
//! intermediate objects wherever the existing value is absent or is not a
//! container.

use serde_json::{Map, Value as Json};

/// Component state: top-level keys in insertion order
pub type State = Map<String, Json>;

/// Split a path into its segments
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.')
}

/// The top-level key a path starts with
pub fn root_key(path: &str) -> &str {
    path.split('.').next().unwrap_or(path)
}

/// Whether `path` addresses a nested value
pub fn is_nested(path: &str) -> bool {
    path.contains('.')
}

fn child<'a>(value: &'a Json, segment: &str) -> Option<&'a Json> {
    match value {
        Json::Object(map) => map.get(segment),
        Json::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Read the value at `path` inside `value`
pub fn get_in<'a>(value: &'a Json, path: &str) -> Option<&'a Json> {
    segments(path).try_fold(value, |current, segment| child(current, segment))
}

/// Read the value at `path` inside `state`
pub fn get_path<'a>(state: &'a State, path: &str) -> Option<&'a Json> {
    let mut parts = segments(path);
    let first = parts.next()?;
    parts.try_fold(state.get(first)?, |current, segment| child(current, segment))
}

/// Step into `segment`, turning `value` into a container first when needed
fn child_mut<'a>(value: &'a mut Json, segment: &str) -> &'a mut Json {
    let array_index = match &*value {
        Json::Array(items) => segment.parse::<usize>().ok().filter(|i| *i <= items.len()),
        _ => None,
    };
    if array_index.is_none() && !value.is_object() {
        *value = Json::Object(Map::new());
    }

    match value {
        Json::Array(items) => {
            let i = array_index.unwrap_or(items.len());
            if i == items.len() {
                items.push(Json::Null);
            }
            &mut items[i]
        }
        Json::Object(map) => map.entry(segment.to_string()).or_insert(Json::Null),
        other => other,
    }
}

/// Write `new_value` at `path` inside `value`, returning the previous value
pub fn set_in(value: &mut Json, path: &str, new_value: Json) -> Option<Json> {
    let parts: Vec<&str> = segments(path).collect();
    let (last, parents) = parts.split_last()?;

    let mut current = value;
    for segment in parents {
        current = child_mut(current, segment);
    }

    let existed = get_in(current, last).is_some();
    let slot = child_mut(current, last);
    let old = std::mem::replace(slot, new_value);
    existed.then_some(old)
}

/// Write `new_value` at `path` inside `state`, returning the previous value
pub fn set_path(state: &mut State, path: &str, new_value: Json) -> Option<Json> {
    match path.split_once('.') {
        None => state.insert(path.to_string(), new_value),
        Some((first, rest)) => {
            let existed = state.contains_key(first);
            let root = state.entry(first.to_string()).or_insert(Json::Null);
            if !existed || (!root.is_object() && !root.is_array()) {
                *root = Json::Object(Map::new());
            }
            set_in(root, rest, new_value)
        }
    }
}

/// Convert integral floats to integers so equal numbers compare equal
///
/// Form controls and expressions produce `f64`s; state loaded from JSON
/// holds integers. `5.0` and `5` must be the same value to the no-op check.
pub fn normalize(value: Json) -> Json {
    match value {
        Json::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 => {
                Json::from(f as i64)
            }
            _ => Json::Number(n),
        },
        Json::Array(items) => Json::Array(items.into_iter().map(normalize).collect()),
        Json::Object(map) => Json::Object(map.into_iter().map(|(k, v)| (k, normalize(v))).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(value: Json) -> State {
        match value {
            Json::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_reads_never_fail() {
        let s = state(json!({"a": {"b": 1}, "n": 3, "list": [10, 20]}));
        assert_eq!(get_path(&s, "a.b"), Some(&json!(1)));
        assert_eq!(get_path(&s, "a.c"), None);
        assert_eq!(get_path(&s, "n.x.y"), None);
        assert_eq!(get_path(&s, "x.y.z"), None);
        assert_eq!(get_path(&s, "list.1"), Some(&json!(20)));
        assert_eq!(get_path(&s, "list.9"), None);
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut s = state(json!({"n": 3}));
        assert_eq!(set_path(&mut s, "props.count", json!(1)), None);
        assert_eq!(get_path(&s, "props.count"), Some(&json!(1)));

        assert_eq!(set_path(&mut s, "n.deep.er", json!(true)), None);
        assert_eq!(Json::Object(s.clone()), json!({"n": {"deep": {"er": true}}, "props": {"count": 1}}));

        assert_eq!(set_path(&mut s, "props.count", json!(2)), Some(json!(1)));
    }

    #[test]
    fn test_set_into_arrays() {
        let mut s = state(json!({"list": [1, 2]}));
        set_path(&mut s, "list.1", json!(5));
        set_path(&mut s, "list.2", json!(6));
        assert_eq!(s["list"], json!([1, 5, 6]));

        set_path(&mut s, "list.name", json!("x"));
        assert_eq!(s["list"], json!({"name": "x"}));
    }

    #[test]
    fn test_normalize_integral_floats() {
        assert_eq!(normalize(json!(5.0)), json!(5));
        assert_eq!(normalize(json!(5.5)), json!(5.5));
        assert_eq!(normalize(json!({"a": [2.0]})), json!({"a": [2]}));
    }

    #[test]
    fn test_root_key() {
        assert_eq!(root_key("props.count"), "props");
        assert_eq!(root_key("count"), "count");
        assert!(is_nested("a.b"));
    }
}
