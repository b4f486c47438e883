//! Typed views over a node's open `attrs` object.
//!
//! Authoring surfaces store `attrs` as a free-form JSON object. Each step
//! kind only reads a handful of fields from it; these structs name those
//! fields so they can be checked once when a scenario is loaded.

use serde::{Deserialize, Serialize};

/// Persistence action for collection-backed submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitAction {
  Create,
  Update,
}

/// The `attrs.onSubmit` block of a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnSubmitDef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub collection: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub nav_path: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub action: Option<SubmitAction>,
  #[serde(default)]
  pub save_to_context: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub context_key: Option<String>,
}

/// A single inline form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
  /// JSON schema type name ("string", "number", ...).
  #[serde(rename = "type", default = "default_field_type")]
  pub field_type: String,
  #[serde(default)]
  pub required: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default: Option<serde_json::Value>,
}

fn default_field_type() -> String {
  "string".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormAttrs {
  /// Context path of the JSON schema describing the form.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub schema_path: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmAttrs {
  /// Context path of the JSON schema the response should match.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub schema_path: Option<String>,
  #[serde(default)]
  pub include_system_message: bool,
  /// Template for the first user message, interpolated against the context.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub initial_user_message: Option<String>,
  /// Step runs without waiting for user input.
  #[serde(default)]
  pub auto_start: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttrs {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub question: Option<String>,
  #[serde(default)]
  pub options: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub correct_answer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetAttrs {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub widget_id: Option<String>,
  /// Props handed to the widget; string values are templates.
  #[serde(default)]
  pub props: serde_json::Map<String, serde_json::Value>,
}
