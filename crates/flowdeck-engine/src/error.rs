use flowdeck_component_registry::LoadError;
use flowdeck_context::ContextError;
use flowdeck_scenario::ScenarioError;
use flowdeck_steps::StepError;
use flowdeck_store::StoreError;
use thiserror::Error;

/// Errors raised while routing a step's output.
#[derive(Debug, Error)]
pub enum SubmitError {
  /// The node's `onSubmit` block cannot route the output anywhere.
  #[error("node '{node_id}' has an unusable onSubmit configuration: {message}")]
  Configuration { node_id: String, message: String },

  #[error("persistence failed: {0}")]
  Store(#[from] StoreError),

  #[error(transparent)]
  Context(#[from] ContextError),
}

/// Errors raised by the flow session and view.
#[derive(Debug, Error)]
pub enum FlowError {
  /// No workspace or scenario is open.
  #[error("no workspace is open")]
  WorkspaceMissing,

  /// The cursor does not point at a node.
  #[error("no node at position {index}")]
  NodeMissing { index: usize },

  #[error("node '{node_id}' is not part of scenario '{scenario_id}'")]
  UnknownNode { scenario_id: String, node_id: String },

  #[error("scenario '{scenario_id}' is already complete")]
  ScenarioComplete { scenario_id: String },

  #[error("step component for node '{node_id}' is not loaded")]
  ComponentNotReady { node_id: String },

  #[error(transparent)]
  Scenario(#[from] ScenarioError),

  #[error(transparent)]
  Load(#[from] LoadError),

  #[error(transparent)]
  Context(#[from] ContextError),

  #[error(transparent)]
  Step(#[from] StepError),

  #[error(transparent)]
  Submit(#[from] SubmitError),
}
