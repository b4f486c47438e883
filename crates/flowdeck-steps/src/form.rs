use async_trait::async_trait;
use flowdeck_config::FieldDef;
use flowdeck_scenario::{FORM_STEP, StepConfig};
use serde_json::{Map, Value};

use crate::error::StepError;
use crate::step::{FlowStep, StepInput, StepOutput};

/// Built-in form step.
///
/// Values are layered as field defaults, then the record being edited, then
/// the submitted input, and checked against the field definitions.
#[derive(Debug, Clone, Default)]
pub struct FormStep;

impl FormStep {
  pub fn new() -> Self {
    Self
  }

  fn fields(input: &StepInput) -> Result<Vec<FieldDef>, StepError> {
    let attrs = match &input.node.step {
      StepConfig::Form(attrs) => attrs,
      other => {
        return Err(StepError::Configuration {
          message: format!("node '{}' is a {} step", input.node.id, other.kind()),
        });
      }
    };
    if !attrs.fields.is_empty() {
      return Ok(attrs.fields.clone());
    }

    let path = attrs
      .schema_path
      .as_deref()
      .ok_or_else(|| StepError::Configuration {
        message: format!("form '{}' declares neither fields nor schemaPath", input.node.id),
      })?;
    let schema = input
      .context
      .get_schema_at_path(path)
      .ok_or_else(|| StepError::MissingSchema {
        path: path.to_string(),
      })?;
    Ok(fields_from_schema(&schema))
  }
}

/// Field definitions for an object schema's `properties`.
pub fn fields_from_schema(schema: &Value) -> Vec<FieldDef> {
  let required: Vec<&str> = schema
    .get("required")
    .and_then(Value::as_array)
    .map(|keys| keys.iter().filter_map(Value::as_str).collect())
    .unwrap_or_default();

  let Some(Value::Object(properties)) = schema.get("properties") else {
    return Vec::new();
  };

  properties
    .iter()
    .map(|(name, property)| FieldDef {
      name: name.clone(),
      label: property.get("title").and_then(Value::as_str).map(String::from),
      field_type: property
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("string")
        .to_string(),
      required: required.contains(&name.as_str()),
      default: property.get("default").cloned(),
    })
    .collect()
}

fn check_field(field: &FieldDef, value: Option<&Value>) -> Result<(), StepError> {
  let invalid = |message: &str| StepError::Validation {
    field: field.name.clone(),
    message: message.to_string(),
  };

  let value = match value {
    None | Some(Value::Null) => None,
    Some(Value::String(s)) if s.is_empty() => None,
    Some(value) => Some(value),
  };
  let Some(value) = value else {
    return if field.required {
      Err(invalid("is required"))
    } else {
      Ok(())
    };
  };

  let type_ok = match field.field_type.as_str() {
    "string" => value.is_string(),
    "number" => value.is_number(),
    "integer" => value.is_i64() || value.is_u64(),
    "boolean" => value.is_boolean(),
    "array" => value.is_array(),
    "object" => value.is_object(),
    _ => true,
  };
  if !type_ok {
    return Err(invalid(&format!("expected {}", field.field_type)));
  }
  Ok(())
}

#[async_trait]
impl FlowStep for FormStep {
  fn id(&self) -> &str {
    FORM_STEP
  }

  async fn execute(&self, input: &StepInput) -> Result<StepOutput, StepError> {
    let fields = Self::fields(input)?;

    let mut values = Map::new();
    for field in &fields {
      if let Some(default) = &field.default {
        values.insert(field.name.clone(), default.clone());
      }
    }
    if let Some(Value::Object(initial)) = &input.initial {
      values.extend(initial.clone());
    }
    match &input.user_input {
      Value::Object(submitted) => values.extend(submitted.clone()),
      Value::Null => {}
      _ => {
        return Err(StepError::Validation {
          field: "input".to_string(),
          message: "expected an object of field values".to_string(),
        });
      }
    }

    for field in &fields {
      check_field(field, values.get(&field.name))?;
    }

    Ok(StepOutput::new(Value::Object(values)))
  }
}
