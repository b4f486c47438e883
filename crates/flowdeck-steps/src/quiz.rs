use async_trait::async_trait;
use flowdeck_scenario::{QUIZ_STEP, StepConfig};
use serde_json::{Value, json};

use crate::error::StepError;
use crate::step::{FlowStep, StepInput, StepOutput};

/// Built-in quiz step. A wrong answer is still a completed step; the output
/// records whether it was correct.
#[derive(Debug, Clone, Default)]
pub struct QuizStep;

impl QuizStep {
  pub fn new() -> Self {
    Self
  }
}

#[async_trait]
impl FlowStep for QuizStep {
  fn id(&self) -> &str {
    QUIZ_STEP
  }

  async fn execute(&self, input: &StepInput) -> Result<StepOutput, StepError> {
    let StepConfig::Quiz(attrs) = &input.node.step else {
      return Err(StepError::Configuration {
        message: format!("node '{}' is not a quiz", input.node.id),
      });
    };

    let answer = match &input.user_input {
      Value::String(answer) => Some(answer.as_str()),
      Value::Object(object) => object.get("answer").and_then(Value::as_str),
      _ => None,
    }
    .ok_or_else(|| StepError::Validation {
      field: "answer".to_string(),
      message: "an answer must be selected".to_string(),
    })?;

    if !attrs.options.iter().any(|option| option == answer) {
      return Err(StepError::Validation {
        field: "answer".to_string(),
        message: format!("'{}' is not one of the options", answer),
      });
    }

    let correct_answer = attrs.correct_answer.as_deref().unwrap_or_default();
    Ok(StepOutput::new(json!({
      "answer": answer,
      "correct": answer == correct_answer,
      "correctAnswer": correct_answer,
    })))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use flowdeck_config::NodeDef;
  use flowdeck_context::ContextStore;
  use flowdeck_scenario::Node;

  fn quiz_input(user_input: Value) -> StepInput {
    let def: NodeDef = serde_json::from_value(json!({
      "id": "q1",
      "tplFile": "QuizStep",
      "attrs": { "question": "2 + 2?", "options": ["3", "4"], "correctAnswer": "4" }
    }))
    .unwrap();
    StepInput::new(Node::from_def(def).unwrap(), ContextStore::for_workspace("ws1"))
      .with_user_input(user_input)
  }

  #[tokio::test]
  async fn test_correct_answer() {
    let output = QuizStep::new().execute(&quiz_input(json!("4"))).await.unwrap();
    assert_eq!(
      output.data,
      json!({ "answer": "4", "correct": true, "correctAnswer": "4" })
    );
  }

  #[tokio::test]
  async fn test_wrong_answer_still_completes() {
    let output = QuizStep::new()
      .execute(&quiz_input(json!({ "answer": "3" })))
      .await
      .unwrap();
    assert_eq!(output.data["correct"], json!(false));
  }

  #[tokio::test]
  async fn test_answer_outside_options() {
    let err = QuizStep::new().execute(&quiz_input(json!("5"))).await.unwrap_err();
    assert!(matches!(err, StepError::Validation { .. }));
  }

  #[tokio::test]
  async fn test_no_answer() {
    let err = QuizStep::new().execute(&quiz_input(Value::Null)).await.unwrap_err();
    assert!(matches!(err, StepError::Validation { .. }));
  }
}
