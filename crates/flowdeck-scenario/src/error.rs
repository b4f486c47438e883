use thiserror::Error;

/// Configuration problems found while loading a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
  #[error("duplicate node id: {node_id}")]
  DuplicateNodeId { node_id: String },

  /// Node declares neither a template file nor a type.
  #[error("node '{node_id}' does not name a component (set tplFile or type)")]
  MissingComponent { node_id: String },

  #[error("node '{node_id}' has invalid attrs: {message}")]
  InvalidAttrs { node_id: String, message: String },

  #[error("node '{node_id}' is missing required attr '{attr}'")]
  MissingAttr { node_id: String, attr: String },

  #[error("node '{node_id}' attr '{attr}' is invalid: {message}")]
  InvalidAttr {
    node_id: String,
    attr: String,
    message: String,
  },
}
