//! Components shipped in the default template directory.

use std::sync::Arc;

use flowdeck_component_registry::{StaticRegistry, TemplateResolver};
use flowdeck_config::{ComponentKind, TemplateDirectory};
use flowdeck_steps::{
  AuthProvider, FormStep, LlmClient, LlmQueryStep, QuizStep, StepError, Widget, WidgetStep,
};
use serde_json::{Map, Value};

use crate::component::{Component, FlowLayout};

/// Component id of the built-in summary widget.
pub const SUMMARY_WIDGET: &str = "Summary";

/// Displays its props back; the user's acknowledgement is recorded.
#[derive(Debug, Clone, Default)]
pub struct SummaryWidget;

impl Widget for SummaryWidget {
  fn id(&self) -> &str {
    SUMMARY_WIDGET
  }

  fn render(&self, props: &Map<String, Value>, user_input: &Value) -> Result<Value, StepError> {
    let mut rendered = props.clone();
    rendered.insert("widgetId".to_string(), Value::from(SUMMARY_WIDGET));
    let acknowledged = user_input
      .get("acknowledged")
      .and_then(Value::as_bool)
      .unwrap_or(false);
    rendered.insert("acknowledged".to_string(), Value::Bool(acknowledged));
    Ok(Value::Object(rendered))
  }
}

/// Register every built-in component under the default template directory.
pub fn register_builtins(
  registry: &mut StaticRegistry<Component>,
  llm_client: Arc<dyn LlmClient>,
  auth: Arc<dyn AuthProvider>,
) {
  let default = TemplateDirectory::default();
  let steps: [Arc<dyn flowdeck_steps::FlowStep>; 4] = [
    Arc::new(FormStep::new()),
    Arc::new(LlmQueryStep::new(llm_client, auth)),
    Arc::new(QuizStep::new()),
    Arc::new(WidgetStep::new()),
  ];
  for step in steps {
    let id = step.id().to_string();
    registry.register(&default, ComponentKind::FlowStep, &id, Component::Step(step));
  }

  registry
    .register(
      &default,
      ComponentKind::Layout,
      crate::component::FLOW_LAYOUT,
      Component::Layout(Arc::new(FlowLayout)),
    )
    .register(
      &default,
      ComponentKind::Widget,
      SUMMARY_WIDGET,
      Component::Widget(Arc::new(SummaryWidget)),
    );
}

/// Registry holding only the built-in components.
pub fn default_registry(
  resolver: TemplateResolver,
  llm_client: Arc<dyn LlmClient>,
  auth: Arc<dyn AuthProvider>,
) -> StaticRegistry<Component> {
  let mut registry = StaticRegistry::new(resolver);
  register_builtins(&mut registry, llm_client, auth);
  registry
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use flowdeck_component_registry::ModuleSource;
  use flowdeck_steps::{ChatRequest, StaticAuth};
  use serde_json::json;

  struct UnusedClient;

  #[async_trait]
  impl LlmClient for UnusedClient {
    async fn complete(&self, _request: &ChatRequest, _token: &str) -> Result<Value, StepError> {
      Ok(Value::Null)
    }
  }

  #[test]
  fn test_default_registry_paths() {
    let registry = default_registry(
      TemplateResolver::new(),
      Arc::new(UnusedClient),
      Arc::new(StaticAuth::default()),
    );
    let known: Vec<&str> = registry.known_paths().iter().map(String::as_str).collect();

    assert_eq!(
      known,
      vec![
        "/default/flowSteps/FormStep.tsx",
        "/default/flowSteps/LlmQueryStep.tsx",
        "/default/flowSteps/QuizStep.tsx",
        "/default/flowSteps/WidgetStep.tsx",
        "/default/layouts/FlowLayout.tsx",
        "/default/widgets/Summary.tsx",
      ]
    );
  }

  #[test]
  fn test_summary_widget() {
    let props = json!({ "title": "Done" }).as_object().unwrap().clone();
    let rendered = SummaryWidget
      .render(&props, &json!({ "acknowledged": true }))
      .unwrap();
    assert_eq!(
      rendered,
      json!({ "title": "Done", "widgetId": "Summary", "acknowledged": true })
    );
  }
}
