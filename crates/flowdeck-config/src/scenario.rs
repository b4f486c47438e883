use serde::{Deserialize, Serialize};

use crate::node::NodeDef;

/// An authored scenario: an ordered sequence of nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDef {
  pub id: String,
  pub name: String,
  /// System prompt prepended to LLM steps that opt in.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub system_message: Option<String>,
  /// Scenarios that must be completed before this one.
  #[serde(default)]
  pub depends_on: Vec<String>,
  #[serde(default)]
  pub nodes: Vec<NodeDef>,
}
