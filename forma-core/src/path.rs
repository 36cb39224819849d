//! Dotted-path access into `serde_json::Value` trees.
//!
//! Paths are split on `.`; a segment addressing an array must be a decimal index
//! (`users.0.name`).

use serde_json::{Map, Value};

use crate::error::{FormError, FormResult};

/// Writing past the end of an array pads it with `null`, at most this many slots.
pub const MAX_ARRAY_PADDING: usize = 1024;

/// Splits a dotted path. The empty path has no segments.
pub fn segments(path: &str) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('.').collect()
    }
}

/// Reads the value at `path`, or `None` as soon as an intermediate value is
/// missing or not a container.
pub fn get<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    get_segments(root, &segments(path))
}

pub fn get_segments<'a, S: AsRef<str>>(root: &'a Value, path: &[S]) -> Option<&'a Value> {
    path.iter().try_fold(root, |current, segment| {
        child(current, segment.as_ref())
    })
}

/// Looks up one segment below `value`.
pub fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    }
}

/// Writes `value` at `path`, replacing any non-container on the way with an
/// empty object. The empty path is a no-op.
pub fn set(root: &mut Value, path: &str, value: Value) -> FormResult<()> {
    set_segments(root, &segments(path), value)
}

pub fn set_segments<S: AsRef<str>>(root: &mut Value, path: &[S], value: Value) -> FormResult<()> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(());
    };

    if !is_container(root) {
        return Err(FormError::InvalidPath {
            path: join(path),
            reason: "root is not an object or array".to_string(),
        });
    }

    let mut current = root;
    for segment in parents {
        let segment = segment.as_ref();
        let slot = slot_mut(current, segment, path)?;
        if !is_container(slot) {
            *slot = Value::Object(Map::new());
        }
        current = slot;
    }

    *slot_mut(current, last.as_ref(), path)? = value;
    Ok(())
}

/// Assigns every top-level key of `new_props` onto `target`.
pub fn update_props(target: &mut Value, new_props: &Map<String, Value>) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }

    if let Value::Object(map) = target {
        for (key, value) in new_props {
            map.insert(key.clone(), value.clone());
        }
    }
}

/// Deep structural equality: object key order is ignored, array order is not,
/// numbers compare by their JSON representation (`1` != `1.0`).
pub fn equal(a: &Value, b: &Value) -> bool {
    a == b
}

/// JavaScript-style falsiness: `null`, `false`, `0`, `""`.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n == 0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

pub fn join<S: AsRef<str>>(path: &[S]) -> String {
    path.iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(".")
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn slot_mut<'a, S: AsRef<str>>(
    container: &'a mut Value,
    segment: &str,
    path: &[S],
) -> FormResult<&'a mut Value> {
    match container {
        Value::Object(map) => Ok(map.entry(segment.to_string()).or_insert(Value::Null)),
        Value::Array(items) => {
            let index = segment.parse::<usize>().map_err(|_| FormError::InvalidPath {
                path: join(path),
                reason: format!("segment '{segment}' does not index an array"),
            })?;
            if index >= items.len() {
                if index - items.len() > MAX_ARRAY_PADDING {
                    return Err(FormError::InvalidPath {
                        path: join(path),
                        reason: format!(
                            "index {index} is more than {MAX_ARRAY_PADDING} past the end of the array"
                        ),
                    });
                }
                items.resize(index + 1, Value::Null);
            }
            Ok(&mut items[index])
        }
        _ => Err(FormError::InvalidPath {
            path: join(path),
            reason: format!("cannot descend into '{segment}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_nested_and_indexed() {
        let data = json!({ "users": [{ "name": "Ann" }], "a": { "b": { "c": 1 } } });

        assert_eq!(get(&data, "users.0.name"), Some(&json!("Ann")));
        assert_eq!(get(&data, "a.b.c"), Some(&json!(1)));
        assert_eq!(get(&data, ""), Some(&data));
        assert_eq!(get_segments(&data, &["a", "b"]), Some(&json!({ "c": 1 })));
    }

    #[test]
    fn test_get_missing_path_returns_none() {
        let data = json!({ "x": 1, "n": null });

        assert_eq!(get(&data, "a.b.c"), None);
        assert_eq!(get(&data, "x.y"), None);
        assert_eq!(get(&data, "n.y"), None);
        assert_eq!(get(&data, "users.abc"), None);
    }

    #[test]
    fn test_set_creates_containers() {
        let mut data = json!({});
        set(&mut data, "a.b.c", json!(5)).unwrap();
        assert_eq!(data, json!({ "a": { "b": { "c": 5 } } }));
    }

    #[test]
    fn test_set_overwrites_scalar_on_the_way() {
        let mut data = json!({ "a": "text" });
        set(&mut data, "a.b", json!(true)).unwrap();
        assert_eq!(data, json!({ "a": { "b": true } }));
    }

    #[test]
    fn test_set_into_array() {
        let mut data = json!({ "tags": ["x"] });
        set(&mut data, "tags.0", json!("y")).unwrap();
        set(&mut data, "tags.2", json!("z")).unwrap();
        assert_eq!(data, json!({ "tags": ["y", null, "z"] }));

        let err = set(&mut data, "tags.first", json!(1)).unwrap_err();
        assert!(matches!(err, FormError::InvalidPath { .. }));
    }

    #[test]
    fn test_set_far_past_array_end_fails() {
        let mut data = json!({ "tags": ["x"] });

        for path in ["tags.18446744073709551615", "tags.1152921504606846975", "tags.1000000000"] {
            let err = set(&mut data, path, json!("y")).unwrap_err();
            assert!(matches!(err, FormError::InvalidPath { .. }), "{path}");
        }
        assert_eq!(data, json!({ "tags": ["x"] }));

        let last = 1 + MAX_ARRAY_PADDING;
        set(&mut data, &format!("tags.{last}"), json!("y")).unwrap();
        assert_eq!(data["tags"].as_array().unwrap().len(), last + 1);
        assert!(set(&mut data, &format!("tags.{}", 2 * last + 2), json!("z")).is_err());
    }

    #[test]
    fn test_set_empty_path_is_noop() {
        let mut data = json!({ "a": 1 });
        set(&mut data, "", json!(2)).unwrap();
        assert_eq!(data, json!({ "a": 1 }));
    }

    #[test]
    fn test_set_on_scalar_root_fails() {
        let mut data = json!(3);
        assert!(set(&mut data, "a", json!(1)).is_err());
    }

    #[test]
    fn test_equal_ignores_key_order() {
        let a = json!({ "a": 1, "b": [1, 2] });
        let b = json!({ "b": [1, 2], "a": 1 });
        let c = json!({ "a": 1, "b": [2, 1] });

        assert!(equal(&a, &b));
        assert!(!equal(&a, &c));
    }

    #[test]
    fn test_update_props() {
        let mut data = json!({ "a": 1, "b": 2 });
        let patch = json!({ "b": 3, "c": 4 });
        update_props(&mut data, patch.as_object().unwrap());
        assert_eq!(data, json!({ "a": 1, "b": 3, "c": 4 }));
    }

    #[test]
    fn test_is_falsy() {
        assert!(is_falsy(&json!(null)));
        assert!(is_falsy(&json!(0)));
        assert!(is_falsy(&json!("")));
        assert!(is_falsy(&json!(false)));
        assert!(!is_falsy(&json!({})));
        assert!(!is_falsy(&json!([])));
        assert!(!is_falsy(&json!("0")));
    }
}
