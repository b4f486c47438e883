use thiserror::Error;

use crate::state::StepExecutionState;

/// Errors raised while executing a flow step.
///
/// Every variant is step-local: the runner records it on the step's run and
/// the flow stays where it is so the step can be retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
  /// The step is not in a state that allows execution.
  #[error("step cannot run while {state}")]
  NotExecutable { state: StepExecutionState },

  /// User input failed a field check.
  #[error("invalid value for '{field}': {message}")]
  Validation { field: String, message: String },

  /// The node configuration is unusable for this step.
  #[error("step misconfigured: {message}")]
  Configuration { message: String },

  /// No schema is registered at the configured path.
  #[error("no schema found at '{path}'")]
  MissingSchema { path: String },

  /// Credentials for a network-backed step are unavailable.
  #[error("authentication unavailable: {message}")]
  Auth { message: String },

  #[error("network error: {message}")]
  Network { message: String },

  #[error("invalid response: {message}")]
  InvalidResponse { message: String },

  #[error("step was cancelled")]
  Cancelled,

  /// The step panicked; the panic is contained to this step.
  #[error("step panicked: {message}")]
  Panicked { message: String },
}

impl From<reqwest::Error> for StepError {
  fn from(err: reqwest::Error) -> Self {
    StepError::Network {
      message: err.to_string(),
    }
  }
}
