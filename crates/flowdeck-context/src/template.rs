//! `{{path}}` interpolation against a context snapshot.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::path::get_path;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("placeholder pattern is valid")
});

/// Replace every `{{path}}` in `template` with the value at `path` in
/// `context`.
///
/// Strings are inserted as-is, other values as JSON. Unresolved paths and
/// `null` render as the empty string. Strings without placeholders are
/// returned unchanged.
pub fn process_template(template: &str, context: &Value) -> String {
  if !template.contains("{{") {
    return template.to_string();
  }

  PLACEHOLDER
    .replace_all(template, |caps: &Captures<'_>| {
      let path = caps[1].trim();
      if path.is_empty() {
        return String::new();
      }
      get_path(context, path).map(stringify).unwrap_or_default()
    })
    .into_owned()
}

fn stringify(value: &Value) -> String {
  match value {
    Value::Null => String::new(),
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}
