use serde::{Deserialize, Serialize};

/// A scenario node as persisted by the authoring surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDef {
  pub id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub scenario_id: Option<String>,
  #[serde(default)]
  pub label: String,
  /// Component id of the step implementation, e.g. "FormStep".
  #[serde(
    default,
    alias = "templateId",
    alias = "template",
    skip_serializing_if = "Option::is_none"
  )]
  pub tpl_file: Option<String>,
  /// Step kind, e.g. "form", "llm", "quiz", "widget".
  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub node_type: Option<String>,
  /// Position in the scenario. Ties keep the original list order.
  #[serde(default)]
  pub order: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub context_path: Option<String>,
  #[serde(default)]
  pub attrs: serde_json::Map<String, serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub assistant_message: Option<String>,
}

impl NodeDef {
  /// Create a bare node with the given id, kind and order.
  pub fn new(id: impl Into<String>, node_type: impl Into<String>, order: i64) -> Self {
    Self {
      id: id.into(),
      scenario_id: None,
      label: String::new(),
      tpl_file: None,
      node_type: Some(node_type.into()),
      order,
      context_path: None,
      attrs: serde_json::Map::new(),
      assistant_message: None,
    }
  }
}
