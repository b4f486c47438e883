//! Dot-path access into nested JSON objects.

use serde_json::{Map, Value};

use crate::error::ContextError;

/// Split a dot path into its non-empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
  path
    .split('.')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .collect()
}

/// Read the value at `path`. Missing segments yield `None`; numeric
/// segments index into arrays. An empty path returns the root.
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
  split_path(path)
    .into_iter()
    .try_fold(root, |current, segment| match current {
      Value::Object(map) => map.get(segment),
      Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
      _ => None,
    })
}

/// Write `value` at `path`, creating intermediate objects as needed.
///
/// Numeric segments index into arrays; an index past the end pads the
/// array with `null`. A non-numeric segment into an array is rejected.
/// Scalar intermediate values are replaced by empty objects.
pub fn set_path(root: &mut Value, path: &str, value: Value) -> Result<(), ContextError> {
  let segments = split_path(path);
  let Some((last, parents)) = segments.split_last() else {
    return Err(invalid(path));
  };

  let mut current = root;
  for segment in parents {
    current = child_mut(current, segment, path)?;
  }

  match current {
    Value::Array(items) => *array_slot(items, last, path)? = value,
    other => {
      ensure_object(other).insert((*last).to_string(), value);
    }
  }
  Ok(())
}

/// Merge `value` into the value at `path`.
///
/// When both the existing and new value are objects their keys are merged
/// (new keys win); otherwise the new value replaces the old one.
pub fn merge_path(root: &mut Value, path: &str, value: Value) -> Result<(), ContextError> {
  match (get_path(root, path), value) {
    (Some(Value::Object(existing)), Value::Object(update)) => {
      let mut merged = existing.clone();
      merged.extend(update);
      set_path(root, path, Value::Object(merged))
    }
    (_, value) => set_path(root, path, value),
  }
}

fn invalid(path: &str) -> ContextError {
  ContextError::InvalidPath {
    path: path.to_string(),
  }
}

fn array_slot<'a>(
  items: &'a mut Vec<Value>,
  segment: &str,
  path: &str,
) -> Result<&'a mut Value, ContextError> {
  let index = segment.parse::<usize>().map_err(|_| invalid(path))?;
  if index >= items.len() {
    items.resize(index + 1, Value::Null);
  }
  Ok(&mut items[index])
}

fn child_mut<'a>(
  current: &'a mut Value,
  segment: &str,
  path: &str,
) -> Result<&'a mut Value, ContextError> {
  let child = match current {
    Value::Array(items) => array_slot(items, segment, path)?,
    other => ensure_object(other)
      .entry(segment.to_string())
      .or_insert_with(|| Value::Object(Map::new())),
  };
  if !child.is_object() && !child.is_array() {
    *child = Value::Object(Map::new());
  }
  Ok(child)
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
  if !value.is_object() {
    *value = Value::Object(Map::new());
  }
  match value {
    Value::Object(map) => map,
    _ => unreachable!("value was just replaced by an object"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_round_trip_nested() {
    let mut root = json!({});
    let value = json!({ "amount": 100, "currency": "PLN" });
    set_path(&mut root, "fbCampaign.settings.budżet", value.clone()).unwrap();

    assert_eq!(get_path(&root, "fbCampaign.settings.budżet"), Some(&value));
    assert_eq!(
      root,
      json!({ "fbCampaign": { "settings": { "budżet": { "amount": 100, "currency": "PLN" } } } })
    );
  }

  #[test]
  fn test_missing_path_is_none() {
    let root = json!({ "a": { "b": 1 } });
    assert_eq!(get_path(&root, "a.c"), None);
    assert_eq!(get_path(&root, "a.b.c"), None);
    assert_eq!(get_path(&root, "x.y.z"), None);
  }

  #[test]
  fn test_array_segments() {
    let mut root = json!({ "items": [{ "name": "a" }, { "name": "b" }] });
    assert_eq!(get_path(&root, "items.1.name"), Some(&json!("b")));

    set_path(&mut root, "items.0.name", json!("z")).unwrap();
    assert_eq!(get_path(&root, "items.0.name"), Some(&json!("z")));
  }

  #[test]
  fn test_index_past_end_pads_array() {
    let mut root = json!({ "items": ["a", "b"] });
    set_path(&mut root, "items.4", json!("z")).unwrap();

    assert_eq!(root, json!({ "items": ["a", "b", null, null, "z"] }));
    assert_eq!(get_path(&root, "items.0"), Some(&json!("a")));

    set_path(&mut root, "items.6.name", json!("n")).unwrap();
    assert_eq!(get_path(&root, "items.6.name"), Some(&json!("n")));
    assert_eq!(get_path(&root, "items.1"), Some(&json!("b")));
  }

  #[test]
  fn test_named_segment_into_array_rejected() {
    let mut root = json!({ "items": ["a", "b"] });
    assert_eq!(
      set_path(&mut root, "items.name", json!("z")),
      Err(ContextError::InvalidPath {
        path: "items.name".to_string()
      })
    );
    assert_eq!(
      set_path(&mut root, "items.first.name", json!("z")),
      Err(ContextError::InvalidPath {
        path: "items.first.name".to_string()
      })
    );
    assert_eq!(root, json!({ "items": ["a", "b"] }));
  }

  #[test]
  fn test_scalar_intermediate_replaced() {
    let mut root = json!({ "a": "text" });
    set_path(&mut root, "a.b", json!(1)).unwrap();
    assert_eq!(root, json!({ "a": { "b": 1 } }));
  }

  #[test]
  fn test_empty_path_rejected() {
    let mut root = json!({});
    assert!(matches!(
      set_path(&mut root, " . ", json!(1)),
      Err(ContextError::InvalidPath { .. })
    ));
  }

  #[test]
  fn test_merge_objects() {
    let mut root = json!({ "step": { "a": 1, "b": 2 } });
    merge_path(&mut root, "step", json!({ "b": 3, "c": 4 })).unwrap();
    assert_eq!(root, json!({ "step": { "a": 1, "b": 3, "c": 4 } }));
  }

  #[test]
  fn test_merge_replaces_non_objects() {
    let mut root = json!({ "step": [1, 2] });
    merge_path(&mut root, "step", json!({ "a": 1 })).unwrap();
    assert_eq!(root, json!({ "step": { "a": 1 } }));
  }
}
