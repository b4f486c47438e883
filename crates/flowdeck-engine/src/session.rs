use std::collections::HashMap;
use std::sync::Arc;

use flowdeck_context::ContextStore;
use flowdeck_scenario::{CursorMove, FlowCursor, Node, Scenario};
use flowdeck_steps::StepRun;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::FlowError;
use crate::events::{FlowEvent, FlowNotifier, NoopNotifier};

/// Result of advancing past the current node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
  /// Moved to the node at `index`.
  Moved { index: usize },
  /// The last node completed; the scenario is done.
  Finished,
}

/// Walks one scenario: tracks the cursor, per-node run records and the
/// context writes that connect steps.
pub struct FlowSession {
  scenario: Scenario,
  cursor: FlowCursor,
  context: ContextStore,
  runs: HashMap<String, StepRun>,
  notifier: Arc<dyn FlowNotifier>,
  completed: bool,
}

impl FlowSession {
  pub fn new(scenario: Scenario, context: ContextStore) -> Self {
    let cursor = scenario.start();
    Self {
      scenario,
      cursor,
      context,
      runs: HashMap::new(),
      notifier: Arc::new(NoopNotifier),
      completed: false,
    }
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn FlowNotifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn scenario(&self) -> &Scenario {
    &self.scenario
  }

  pub fn context(&self) -> &ContextStore {
    &self.context
  }

  pub fn cursor(&self) -> FlowCursor {
    self.cursor
  }

  pub fn is_complete(&self) -> bool {
    self.completed
  }

  /// Node under the cursor; `None` for an empty scenario.
  pub fn current_node(&self) -> Option<&Node> {
    self.scenario.node_at(self.cursor)
  }

  pub fn is_first_node(&self) -> bool {
    self.cursor.is_first()
  }

  pub fn is_last_node(&self) -> bool {
    self.cursor.is_last()
  }

  /// Run record of a node, if it has been touched.
  pub fn run(&self, node_id: &str) -> Option<&StepRun> {
    self.runs.get(node_id)
  }

  /// Run record of a node, created on first use.
  pub fn run_mut(&mut self, node_id: &str) -> &mut StepRun {
    self.runs.entry(node_id.to_string()).or_default()
  }

  /// Reset a node's run so its step can execute again.
  pub fn reset_step(&mut self, node_id: &str) {
    if let Some(run) = self.runs.get_mut(node_id) {
      run.reset();
    }
  }

  /// Complete the current node with `output`.
  ///
  /// The output is merged into the context at the node's context key before
  /// the cursor moves, so the next node always sees it. On the last node the
  /// cursor stays put and the scenario is marked complete.
  pub fn advance(&mut self, output: Value) -> Result<Advance, FlowError> {
    if self.completed {
      return Err(FlowError::ScenarioComplete {
        scenario_id: self.scenario.id.clone(),
      });
    }
    let node = self
      .current_node()
      .ok_or(FlowError::NodeMissing {
        index: self.cursor.index(),
      })?
      .clone();

    match node.context_key() {
      Some(key) => self.context.merge(key, output.clone())?,
      None => debug!(node_id = %node.id, "node has no context key; output not stored"),
    }

    self.run_mut(&node.id).complete(output);

    match self.cursor.next() {
      CursorMove::Moved(cursor) => {
        self.cursor = cursor;
        debug!(node_id = %node.id, index = cursor.index(), "advanced");
        Ok(Advance::Moved {
          index: cursor.index(),
        })
      }
      CursorMove::Finished => {
        self.completed = true;
        info!(scenario_id = %self.scenario.id, "scenario completed");
        self.notifier.notify(FlowEvent::ScenarioCompleted {
          scenario_id: self.scenario.id.clone(),
        });
        Ok(Advance::Finished)
      }
    }
  }

  /// Step back one node. Returns `false` at the first node.
  pub fn go_back(&mut self) -> bool {
    match self.cursor.previous() {
      Some(cursor) => {
        self.cursor = cursor;
        self.completed = false;
        true
      }
      None => false,
    }
  }

  /// Move to a traversal position.
  pub fn jump_to_index(&mut self, index: usize) -> Result<(), FlowError> {
    let cursor = self
      .cursor
      .jump(index)
      .ok_or(FlowError::NodeMissing { index })?;
    self.cursor = cursor;
    self.completed = false;
    Ok(())
  }

  /// Move to the node with `node_id`.
  pub fn jump_to(&mut self, node_id: &str) -> Result<(), FlowError> {
    let index = self
      .scenario
      .position_of(node_id)
      .ok_or_else(|| FlowError::UnknownNode {
        scenario_id: self.scenario.id.clone(),
        node_id: node_id.to_string(),
      })?;
    self.jump_to_index(index)
  }
}
