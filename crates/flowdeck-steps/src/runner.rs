use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::error::StepError;
use crate::state::StepRun;
use crate::step::{FlowStep, StepInput};

/// Drives a step through its run record.
///
/// Errors, cancellation and panics all land the run in `failed`, leaving
/// the step retriable.
#[derive(Debug, Clone, Default)]
pub struct StepRunner;

impl StepRunner {
  pub fn new() -> Self {
    Self
  }

  #[instrument(
    name = "step_execute",
    skip(self, step, run, input, cancel),
    fields(node_id = %input.node.id, component_id = %step.id())
  )]
  pub async fn run(
    &self,
    step: &dyn FlowStep,
    run: &mut StepRun,
    input: &StepInput,
    cancel: &CancellationToken,
  ) -> Result<Value, StepError> {
    run.begin()?;
    info!(attempt = run.attempts, "step started");

    let result = self.execute_inner(step, input, cancel).await;

    match result {
      Ok(output) => {
        info!(output = %output, "step completed");
        run.complete(output.clone());
        Ok(output)
      }
      Err(e) => {
        error!(error = %e, "step failed");
        run.fail(e.to_string());
        Err(e)
      }
    }
  }

  async fn execute_inner(
    &self,
    step: &dyn FlowStep,
    input: &StepInput,
    cancel: &CancellationToken,
  ) -> Result<Value, StepError> {
    if cancel.is_cancelled() {
      return Err(StepError::Cancelled);
    }

    let execution = AssertUnwindSafe(step.execute(input)).catch_unwind();
    let outcome = tokio::select! {
      _ = cancel.cancelled() => return Err(StepError::Cancelled),
      outcome = execution => outcome,
    };

    match outcome {
      Ok(result) => result.map(|output| output.data),
      Err(payload) => Err(StepError::Panicked {
        message: panic_message(payload.as_ref()),
      }),
    }
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    message.to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "unknown panic".to_string()
  }
}
