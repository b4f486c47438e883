use async_trait::async_trait;
use flowdeck_context::process_template;
use flowdeck_scenario::{StepConfig, WIDGET_STEP};
use serde_json::{Map, Value};

use crate::error::StepError;
use crate::step::{FlowStep, StepInput, StepOutput};

/// Built-in widget step: renders the node's widget with its props
/// interpolated against the context.
#[derive(Debug, Clone, Default)]
pub struct WidgetStep;

impl WidgetStep {
  pub fn new() -> Self {
    Self
  }
}

/// Interpolate every string inside `value`.
pub fn interpolate_value(value: &Value, context: &Value) -> Value {
  match value {
    Value::String(template) => Value::String(process_template(template, context)),
    Value::Array(items) => Value::Array(
      items
        .iter()
        .map(|item| interpolate_value(item, context))
        .collect(),
    ),
    Value::Object(object) => Value::Object(
      object
        .iter()
        .map(|(key, item)| (key.clone(), interpolate_value(item, context)))
        .collect(),
    ),
    other => other.clone(),
  }
}

#[async_trait]
impl FlowStep for WidgetStep {
  fn id(&self) -> &str {
    WIDGET_STEP
  }

  async fn execute(&self, input: &StepInput) -> Result<StepOutput, StepError> {
    let StepConfig::Widget(attrs) = &input.node.step else {
      return Err(StepError::Configuration {
        message: format!("node '{}' is not a widget step", input.node.id),
      });
    };
    let widget_id = attrs.widget_id.as_deref().unwrap_or_default();
    let widget = input
      .widget
      .as_ref()
      .ok_or_else(|| StepError::Configuration {
        message: format!("widget '{}' is not loaded", widget_id),
      })?;

    let context = input.context.snapshot();
    let props: Map<String, Value> = attrs
      .props
      .iter()
      .map(|(key, value)| (key.clone(), interpolate_value(value, &context)))
      .collect();

    let rendered = widget.render(&props, &input.user_input)?;
    Ok(StepOutput::new(rendered))
  }
}
