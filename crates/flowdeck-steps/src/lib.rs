//! Flowdeck Steps
//!
//! Flow steps are the units a scenario walks through. This crate holds the
//! per-step execution state machine ([`StepRun`]), the [`FlowStep`] and
//! [`Widget`] component traits, the [`StepRunner`] that drives a step
//! through its run record, and the built-in steps:
//!
//! - [`FormStep`]: field defaults, required and type checks
//! - [`LlmQueryStep`]: chat-completion call with structured post-processing
//! - [`QuizStep`]: answer check against the configured options
//! - [`WidgetStep`]: renders an embedded widget with interpolated props

mod error;
pub mod extract;
mod form;
mod llm;
mod quiz;
mod runner;
mod state;
mod step;
mod widget;

pub use error::StepError;
pub use form::{FormStep, fields_from_schema};
pub use llm::{
  AuthProvider, ChatMessage, ChatRequest, ChatRole, HttpLlmClient, LlmClient, LlmConfig,
  LlmQueryStep, StaticAuth, response_text,
};
pub use quiz::QuizStep;
pub use runner::StepRunner;
pub use state::{StepExecutionState, StepRun};
pub use step::{FlowStep, StepInput, StepOutput, Widget};
pub use widget::{WidgetStep, interpolate_value};
