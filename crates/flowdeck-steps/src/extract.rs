//! Best-effort structuring of free-form LLM responses.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?s)```(?:json|JSON)?\s*\n?(.*?)```").expect("fenced block pattern is valid")
});

/// Pull a JSON value out of model text: fenced blocks first, then the first
/// balanced `{...}` object, then the whole text.
pub fn extract_json(text: &str) -> Option<Value> {
  for capture in FENCED_BLOCK.captures_iter(text) {
    if let Some(body) = capture.get(1)
      && let Ok(value) = serde_json::from_str::<Value>(body.as_str().trim())
    {
      return Some(value);
    }
  }

  if let Some(object) = first_balanced_object(text)
    && let Ok(value) = serde_json::from_str::<Value>(object)
  {
    return Some(value);
  }

  serde_json::from_str(text.trim()).ok()
}

/// First `{...}` span with balanced braces, ignoring braces in strings.
fn first_balanced_object(text: &str) -> Option<&str> {
  let start = text.find('{')?;
  let mut depth = 0usize;
  let mut in_string = false;
  let mut escaped = false;

  for (offset, ch) in text[start..].char_indices() {
    if in_string {
      match ch {
        _ if escaped => escaped = false,
        '\\' => escaped = true,
        '"' => in_string = false,
        _ => {}
      }
      continue;
    }
    match ch {
      '"' => in_string = true,
      '{' => depth += 1,
      '}' => {
        depth -= 1;
        if depth == 0 {
          return Some(&text[start..start + offset + 1]);
        }
      }
      _ => {}
    }
  }
  None
}

/// Whether `value` is an object carrying every key the schema requires.
pub fn satisfies_required(value: &Value, schema: &Value) -> bool {
  let Value::Object(object) = value else {
    return false;
  };
  schema
    .get("required")
    .and_then(Value::as_array)
    .map(|required| {
      required
        .iter()
        .filter_map(Value::as_str)
        .all(|key| object.contains_key(key))
    })
    .unwrap_or(true)
}

/// Empty value shaped like `schema`.
pub fn placeholder_from_schema(schema: &Value) -> Value {
  if let Some(default) = schema.get("default") {
    return default.clone();
  }

  match schema.get("type").and_then(Value::as_str) {
    Some("string") => Value::String(String::new()),
    Some("number") | Some("integer") => Value::from(0),
    Some("boolean") => Value::Bool(false),
    Some("array") => Value::Array(Vec::new()),
    Some("null") => Value::Null,
    Some("object") | None => {
      let mut object = Map::new();
      if let Some(Value::Object(properties)) = schema.get("properties") {
        for (key, property) in properties {
          object.insert(key.clone(), placeholder_from_schema(property));
        }
      }
      Value::Object(object)
    }
    Some(_) => Value::Null,
  }
}

/// Structured output for a model response.
///
/// With a schema, a matching extracted object wins; anything else falls back
/// to a placeholder with the raw text kept under `content`. Without a schema
/// an extracted object is used as-is, otherwise the text is wrapped.
pub fn structure_response(text: &str, schema: Option<&Value>) -> Value {
  let extracted = extract_json(text);

  match schema {
    Some(schema) => match extracted {
      Some(value) if satisfies_required(&value, schema) => value,
      _ => {
        let mut placeholder = placeholder_from_schema(schema);
        if let Value::Object(object) = &mut placeholder {
          object
            .entry("content")
            .or_insert_with(|| Value::String(text.to_string()));
        }
        placeholder
      }
    },
    None => match extracted {
      Some(value @ Value::Object(_)) => value,
      _ => serde_json::json!({ "content": text }),
    },
  }
}
