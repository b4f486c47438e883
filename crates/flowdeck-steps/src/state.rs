use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StepError;

/// Execution state of a single flow step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepExecutionState {
  #[default]
  Pending,
  InProgress,
  Completed,
  Failed,
}

impl StepExecutionState {
  pub fn as_str(&self) -> &'static str {
    match self {
      StepExecutionState::Pending => "pending",
      StepExecutionState::InProgress => "in_progress",
      StepExecutionState::Completed => "completed",
      StepExecutionState::Failed => "failed",
    }
  }
}

impl fmt::Display for StepExecutionState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Run record of one step instance.
///
/// The same record is used whatever component renders the step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepRun {
  pub state: StepExecutionState,
  pub attempts: u32,
  pub output: Option<serde_json::Value>,
  pub error: Option<String>,
  pub started_at: Option<DateTime<Utc>>,
  pub completed_at: Option<DateTime<Utc>>,
}

impl StepRun {
  pub fn new() -> Self {
    Self::default()
  }

  /// Pending and failed steps may run.
  pub fn is_executable(&self) -> bool {
    matches!(
      self.state,
      StepExecutionState::Pending | StepExecutionState::Failed
    )
  }

  /// Completed steps stay disabled until reset.
  pub fn is_disabled(&self) -> bool {
    !self.is_executable()
  }

  /// `pending | failed -> in_progress`.
  pub fn begin(&mut self) -> Result<(), StepError> {
    if !self.is_executable() {
      return Err(StepError::NotExecutable { state: self.state });
    }
    self.state = StepExecutionState::InProgress;
    self.attempts += 1;
    self.error = None;
    self.started_at = Some(Utc::now());
    self.completed_at = None;
    Ok(())
  }

  /// `in_progress -> completed`.
  pub fn complete(&mut self, output: serde_json::Value) {
    self.state = StepExecutionState::Completed;
    self.output = Some(output);
    self.error = None;
    self.completed_at = Some(Utc::now());
  }

  /// `in_progress -> failed`.
  pub fn fail(&mut self, message: impl Into<String>) {
    self.state = StepExecutionState::Failed;
    self.error = Some(message.into());
    self.completed_at = Some(Utc::now());
  }

  /// Back to `pending`, keeping the attempt count.
  pub fn reset(&mut self) {
    self.state = StepExecutionState::Pending;
    self.output = None;
    self.error = None;
    self.started_at = None;
    self.completed_at = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_happy_path() {
    let mut run = StepRun::new();
    assert_eq!(run.state, StepExecutionState::Pending);
    assert!(run.is_executable());

    run.begin().unwrap();
    assert_eq!(run.state, StepExecutionState::InProgress);
    assert!(run.is_disabled());

    run.complete(json!({ "ok": true }));
    assert_eq!(run.state, StepExecutionState::Completed);
    assert_eq!(run.output, Some(json!({ "ok": true })));
    assert_eq!(run.attempts, 1);
  }

  #[test]
  fn test_failed_is_retriable() {
    let mut run = StepRun::new();
    run.begin().unwrap();
    run.fail("network error: timeout");
    assert_eq!(run.state, StepExecutionState::Failed);
    assert!(run.is_executable());

    run.begin().unwrap();
    assert_eq!(run.error, None);
    assert_eq!(run.attempts, 2);
  }

  #[test]
  fn test_completed_rejects_rerun_until_reset() {
    let mut run = StepRun::new();
    run.begin().unwrap();
    run.complete(json!(1));

    assert_eq!(
      run.begin(),
      Err(StepError::NotExecutable {
        state: StepExecutionState::Completed
      })
    );

    run.reset();
    assert!(run.begin().is_ok());
  }

  #[test]
  fn test_in_progress_rejects_rerun() {
    let mut run = StepRun::new();
    run.begin().unwrap();
    assert!(run.begin().is_err());
  }

  #[test]
  fn test_state_names() {
    assert_eq!(StepExecutionState::InProgress.to_string(), "in_progress");
    assert_eq!(
      serde_json::to_value(StepExecutionState::Completed).unwrap(),
      json!("completed")
    );
  }
}
