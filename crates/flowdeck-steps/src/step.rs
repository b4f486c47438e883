use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use flowdeck_context::ContextStore;
use flowdeck_scenario::Node;
use serde_json::{Map, Value};

use crate::error::StepError;

/// Everything a step sees when it runs.
#[derive(Clone)]
pub struct StepInput {
  pub node: Node,
  /// Shared context for interpolation and schema lookup.
  pub context: ContextStore,
  /// What the user entered or selected.
  pub user_input: Value,
  /// Existing record when editing in place.
  pub initial: Option<Value>,
  /// Widget component resolved for the node, if it declares one.
  pub widget: Option<Arc<dyn Widget>>,
  /// The scenario's system message.
  pub system_message: Option<String>,
}

impl StepInput {
  pub fn new(node: Node, context: ContextStore) -> Self {
    Self {
      node,
      context,
      user_input: Value::Null,
      initial: None,
      widget: None,
      system_message: None,
    }
  }

  pub fn with_user_input(mut self, user_input: Value) -> Self {
    self.user_input = user_input;
    self
  }

  pub fn with_initial(mut self, initial: Option<Value>) -> Self {
    self.initial = initial;
    self
  }

  pub fn with_widget(mut self, widget: Option<Arc<dyn Widget>>) -> Self {
    self.widget = widget;
    self
  }

  pub fn with_system_message(mut self, system_message: Option<String>) -> Self {
    self.system_message = system_message;
    self
  }
}

impl fmt::Debug for StepInput {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StepInput")
      .field("node", &self.node.id)
      .field("user_input", &self.user_input)
      .field("initial", &self.initial)
      .field("widget", &self.widget.as_ref().map(|w| w.id().to_string()))
      .finish_non_exhaustive()
  }
}

/// Output of a successful step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
  pub data: Value,
}

impl StepOutput {
  pub fn new(data: Value) -> Self {
    Self { data }
  }
}

/// A flow step component.
#[async_trait]
pub trait FlowStep: Send + Sync {
  /// Component id, e.g. `FormStep`.
  fn id(&self) -> &str;

  /// Whether the step may run without waiting for user input.
  fn auto_start(&self, _node: &Node) -> bool {
    false
  }

  async fn execute(&self, input: &StepInput) -> Result<StepOutput, StepError>;
}

/// A widget component embedded by a widget step.
pub trait Widget: Send + Sync {
  fn id(&self) -> &str;

  /// Render the widget with already-interpolated props.
  fn render(&self, props: &Map<String, Value>, user_input: &Value) -> Result<Value, StepError>;
}
