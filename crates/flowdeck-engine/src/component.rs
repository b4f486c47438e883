use std::fmt;
use std::sync::Arc;

use flowdeck_config::ComponentKind;
use flowdeck_steps::{FlowStep, Widget};
use serde::Serialize;
use serde_json::{Value, json};

/// A component held by the registry.
#[derive(Clone)]
pub enum Component {
  Step(Arc<dyn FlowStep>),
  Layout(Arc<dyn Layout>),
  Widget(Arc<dyn Widget>),
}

impl Component {
  pub fn kind(&self) -> ComponentKind {
    match self {
      Component::Step(_) => ComponentKind::FlowStep,
      Component::Layout(_) => ComponentKind::Layout,
      Component::Widget(_) => ComponentKind::Widget,
    }
  }

  pub fn id(&self) -> &str {
    match self {
      Component::Step(step) => step.id(),
      Component::Layout(layout) => layout.id(),
      Component::Widget(widget) => widget.id(),
    }
  }

  pub fn as_step(&self) -> Option<&Arc<dyn FlowStep>> {
    match self {
      Component::Step(step) => Some(step),
      _ => None,
    }
  }

  pub fn as_layout(&self) -> Option<&Arc<dyn Layout>> {
    match self {
      Component::Layout(layout) => Some(layout),
      _ => None,
    }
  }

  pub fn as_widget(&self) -> Option<&Arc<dyn Widget>> {
    match self {
      Component::Widget(widget) => Some(widget),
      _ => None,
    }
  }
}

impl fmt::Debug for Component {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Component::{}({})", self.kind(), self.id())
  }
}

/// What a layout is given to frame the current step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutFrame {
  pub scenario_id: String,
  pub node_id: String,
  pub label: String,
  pub component_id: String,
  pub position: usize,
  pub total: usize,
  pub is_first: bool,
  pub is_last: bool,
  /// Context values visible to the step.
  pub context: Value,
}

/// A layout component wraps the mounted step.
pub trait Layout: Send + Sync {
  fn id(&self) -> &str;

  fn compose(&self, frame: &LayoutFrame) -> Value;
}

/// Built-in layout: a progress header plus back/next navigation.
#[derive(Debug, Clone, Default)]
pub struct FlowLayout;

pub const FLOW_LAYOUT: &str = "FlowLayout";

impl Layout for FlowLayout {
  fn id(&self) -> &str {
    FLOW_LAYOUT
  }

  fn compose(&self, frame: &LayoutFrame) -> Value {
    let submit_label = if frame.is_last { "Finish" } else { "Next" };
    json!({
      "layout": FLOW_LAYOUT,
      "title": frame.label,
      "progress": { "position": frame.position + 1, "total": frame.total },
      "step": { "nodeId": frame.node_id, "componentId": frame.component_id },
      "navigation": {
        "canGoBack": !frame.is_first,
        "submitLabel": submit_label,
      },
      "context": frame.context,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn frame(position: usize, total: usize) -> LayoutFrame {
    LayoutFrame {
      scenario_id: "s1".into(),
      node_id: "n1".into(),
      label: "Profile".into(),
      component_id: "FormStep".into(),
      position,
      total,
      is_first: position == 0,
      is_last: position + 1 == total,
      context: json!({}),
    }
  }

  #[test]
  fn test_flow_layout_navigation() {
    let first = FlowLayout.compose(&frame(0, 2));
    assert_eq!(first["navigation"]["canGoBack"], json!(false));
    assert_eq!(first["navigation"]["submitLabel"], json!("Next"));
    assert_eq!(first["progress"], json!({ "position": 1, "total": 2 }));

    let last = FlowLayout.compose(&frame(1, 2));
    assert_eq!(last["navigation"]["canGoBack"], json!(true));
    assert_eq!(last["navigation"]["submitLabel"], json!("Finish"));
  }

  #[test]
  fn test_component_kinds() {
    let layout = Component::Layout(Arc::new(FlowLayout));
    assert_eq!(layout.kind(), ComponentKind::Layout);
    assert_eq!(layout.id(), FLOW_LAYOUT);
    assert!(layout.as_step().is_none());
    assert!(layout.as_layout().is_some());
  }
}
