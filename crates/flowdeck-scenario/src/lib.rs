//! Flowdeck Scenario
//!
//! This crate provides the "loaded" scenario representation for flowdeck.
//! A loaded scenario is a validated form of a [`ScenarioDef`] that is ready
//! to be traversed by the flow engine.
//!
//! Key differences from `flowdeck-config`:
//! - Nodes are sorted once by `order` (stable, ties keep list position)
//! - Each node's open `attrs` object is checked into a typed [`StepConfig`]
//! - The component id used for template resolution is settled per node
//! - Traversal state is an immutable [`FlowCursor`]
//!
//! [`ScenarioDef`]: flowdeck_config::ScenarioDef

mod cursor;
mod error;
mod node;
mod scenario;

pub use cursor::{CursorMove, FlowCursor};
pub use error::ScenarioError;
pub use node::{
  FORM_STEP, LLM_QUERY_STEP, Node, QUIZ_STEP, StepConfig, WIDGET_STEP, builtin_component_id,
};
pub use scenario::Scenario;
