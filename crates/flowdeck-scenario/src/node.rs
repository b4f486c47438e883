use flowdeck_config::{FormAttrs, LlmAttrs, NodeDef, OnSubmitDef, QuizAttrs, WidgetAttrs};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ScenarioError;

/// Component id of the built-in form step.
pub const FORM_STEP: &str = "FormStep";
/// Component id of the built-in LLM query step.
pub const LLM_QUERY_STEP: &str = "LlmQueryStep";
/// Component id of the built-in quiz step.
pub const QUIZ_STEP: &str = "QuizStep";
/// Component id of the built-in widget step.
pub const WIDGET_STEP: &str = "WidgetStep";

/// Per-kind step configuration, checked when the scenario is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepConfig {
  Form(FormAttrs),
  LlmQuery(LlmAttrs),
  Quiz(QuizAttrs),
  Widget(WidgetAttrs),
  /// Tenant-specific step; reads its configuration from the raw attrs.
  Custom { kind: String },
}

impl StepConfig {
  pub fn kind(&self) -> &str {
    match self {
      StepConfig::Form(_) => "form",
      StepConfig::LlmQuery(_) => "llm",
      StepConfig::Quiz(_) => "quiz",
      StepConfig::Widget(_) => "widget",
      StepConfig::Custom { kind } => kind,
    }
  }

  /// Schema path declared by the step, if any.
  pub fn schema_path(&self) -> Option<&str> {
    match self {
      StepConfig::Form(attrs) => attrs.schema_path.as_deref(),
      StepConfig::LlmQuery(attrs) => attrs.schema_path.as_deref(),
      _ => None,
    }
  }
}

/// Component id used for a built-in step kind.
pub fn builtin_component_id(kind: &str) -> Option<&'static str> {
  match kind {
    "form" => Some(FORM_STEP),
    "llm" | "llm_query" | "llmQuery" => Some(LLM_QUERY_STEP),
    "quiz" => Some(QUIZ_STEP),
    "widget" => Some(WIDGET_STEP),
    _ => None,
  }
}

fn builtin_kind(component_id: &str) -> Option<&'static str> {
  match component_id {
    FORM_STEP => Some("form"),
    LLM_QUERY_STEP => Some("llm"),
    QUIZ_STEP => Some("quiz"),
    WIDGET_STEP => Some("widget"),
    _ => None,
  }
}

/// A loaded scenario node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub id: String,
  pub label: String,
  /// Component id resolved through the template directories.
  pub component_id: String,
  pub order: i64,
  pub context_path: Option<String>,
  pub step: StepConfig,
  pub on_submit: Option<OnSubmitDef>,
  pub assistant_message: Option<String>,
  /// The untouched attrs object, for tenant components.
  pub attrs: serde_json::Map<String, serde_json::Value>,
}

impl Node {
  /// Check a node definition and build its typed form.
  pub fn from_def(def: NodeDef) -> Result<Self, ScenarioError> {
    let kind = match (&def.node_type, &def.tpl_file) {
      (Some(kind), _) => kind.clone(),
      (None, Some(tpl)) => builtin_kind(tpl).unwrap_or(tpl.as_str()).to_string(),
      (None, None) => {
        return Err(ScenarioError::MissingComponent { node_id: def.id });
      }
    };

    let component_id = match &def.tpl_file {
      Some(tpl) => tpl.clone(),
      None => builtin_component_id(&kind)
        .map(String::from)
        .unwrap_or_else(|| kind.clone()),
    };

    let step = match kind.as_str() {
      "form" => StepConfig::Form(parse_attrs(&def)?),
      "llm" | "llm_query" | "llmQuery" => StepConfig::LlmQuery(parse_attrs(&def)?),
      "quiz" => StepConfig::Quiz(parse_attrs(&def)?),
      "widget" => StepConfig::Widget(parse_attrs(&def)?),
      _ => StepConfig::Custom { kind },
    };
    validate_step(&def.id, &step)?;

    let on_submit = match def.attrs.get("onSubmit") {
      Some(value) => Some(
        serde_json::from_value::<OnSubmitDef>(value.clone()).map_err(|e| {
          ScenarioError::InvalidAttr {
            node_id: def.id.clone(),
            attr: "onSubmit".to_string(),
            message: e.to_string(),
          }
        })?,
      ),
      None => None,
    };

    if let Some(submit) = &on_submit
      && submit.save_to_context
      && submit.collection.is_some()
    {
      warn!(
        node_id = %def.id,
        "onSubmit sets both saveToContext and collection; saveToContext takes precedence"
      );
    }

    Ok(Self {
      id: def.id,
      label: def.label,
      component_id,
      order: def.order,
      context_path: def.context_path.filter(|p| !p.is_empty()),
      step,
      on_submit,
      assistant_message: def.assistant_message,
      attrs: def.attrs,
    })
  }

  /// Schema path of the node, from its typed config or the raw attrs.
  pub fn schema_path(&self) -> Option<&str> {
    self
      .step
      .schema_path()
      .or_else(|| self.attrs.get("schemaPath").and_then(|v| v.as_str()))
  }

  /// Where the node's output lands in the context store.
  ///
  /// `contextPath`, then `onSubmit.contextKey`, then `schemaPath`.
  pub fn context_key(&self) -> Option<&str> {
    self
      .context_path
      .as_deref()
      .or_else(|| {
        self
          .on_submit
          .as_ref()
          .and_then(|s| s.context_key.as_deref())
      })
      .or_else(|| self.schema_path())
      .filter(|k| !k.is_empty())
  }
}

fn parse_attrs<T: DeserializeOwned>(def: &NodeDef) -> Result<T, ScenarioError> {
  serde_json::from_value(serde_json::Value::Object(def.attrs.clone())).map_err(|e| {
    ScenarioError::InvalidAttrs {
      node_id: def.id.clone(),
      message: e.to_string(),
    }
  })
}

fn validate_step(node_id: &str, step: &StepConfig) -> Result<(), ScenarioError> {
  let missing = |attr: &str| ScenarioError::MissingAttr {
    node_id: node_id.to_string(),
    attr: attr.to_string(),
  };

  match step {
    StepConfig::Form(attrs) => {
      if attrs.schema_path.is_none() && attrs.fields.is_empty() {
        return Err(missing("schemaPath"));
      }
    }
    StepConfig::Quiz(attrs) => {
      if attrs.options.is_empty() {
        return Err(missing("options"));
      }
      let correct = attrs
        .correct_answer
        .as_ref()
        .ok_or_else(|| missing("correctAnswer"))?;
      if !attrs.options.contains(correct) {
        return Err(ScenarioError::InvalidAttr {
          node_id: node_id.to_string(),
          attr: "correctAnswer".to_string(),
          message: format!("'{}' is not one of the options", correct),
        });
      }
    }
    StepConfig::Widget(attrs) => {
      if attrs.widget_id.as_deref().is_none_or(str::is_empty) {
        return Err(missing("widgetId"));
      }
    }
    StepConfig::LlmQuery(_) | StepConfig::Custom { .. } => {}
  }

  Ok(())
}
