//! Flow events and notifiers for observability.
//!
//! Events are emitted as a scenario is walked so consumers can persist
//! progress, stream it to a UI, or log it.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted while a scenario runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlowEvent {
  /// A scenario was opened in a workspace.
  ScenarioStarted {
    scenario_id: String,
    workspace_id: String,
  },

  /// A step began running. `attempt` counts from 1 and grows on retries.
  StepStarted {
    scenario_id: String,
    node_id: String,
    attempt: u32,
  },

  /// A step produced output. The output is not routed yet.
  StepCompleted {
    scenario_id: String,
    node_id: String,
    data: serde_json::Value,
  },

  /// A step or its submission failed. The step can run again.
  StepFailed {
    scenario_id: String,
    node_id: String,
    error: String,
  },

  /// A step's output was routed. `target` is `context:<key>`,
  /// `<collection>/<id>`, or `none` when the node has no `onSubmit` block.
  StepSubmitted {
    scenario_id: String,
    node_id: String,
    target: String,
  },

  /// The last node was submitted.
  ScenarioCompleted { scenario_id: String },

  /// A layout, step or widget component could not be resolved.
  ComponentLoadFailed {
    component_id: String,
    kind: String,
    error: String,
  },
}

/// Receives flow events.
///
/// The engine calls `notify` for each event; implementations decide what to
/// do with them (persist, stream to a UI, log, ignore).
pub trait FlowNotifier: Send + Sync {
  /// Called once per event, in emission order.
  fn notify(&self, event: FlowEvent);
}

/// Discards all events.
///
/// The default notifier of a `FlowView`; useful in tests.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl FlowNotifier for NoopNotifier {
  fn notify(&self, _event: FlowEvent) {}
}

/// Sends events to an unbounded channel.
///
/// Use this to consume events asynchronously, e.g. to persist progress.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // unbounded: event volume is a handful per step
  sender: mpsc::UnboundedSender<FlowEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<FlowEvent>) -> Self {
    Self { sender }
  }
}

impl FlowNotifier for ChannelNotifier {
  fn notify(&self, event: FlowEvent) {
    // receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
