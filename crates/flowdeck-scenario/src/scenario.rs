use std::collections::HashSet;

use flowdeck_config::ScenarioDef;
use serde::{Deserialize, Serialize};

use crate::cursor::FlowCursor;
use crate::error::ScenarioError;
use crate::node::Node;

/// A loaded scenario whose nodes are in traversal order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
  pub id: String,
  pub name: String,
  pub system_message: Option<String>,
  pub depends_on: Vec<String>,
  nodes: Vec<Node>,
}

impl Scenario {
  /// Validate a scenario definition and sort its nodes.
  ///
  /// Nodes are sorted once here by ascending `order`. The sort is stable, so
  /// nodes sharing an order keep their original list position.
  pub fn load(def: ScenarioDef) -> Result<Self, ScenarioError> {
    let mut seen = HashSet::new();
    for node in &def.nodes {
      if !seen.insert(node.id.as_str()) {
        return Err(ScenarioError::DuplicateNodeId {
          node_id: node.id.clone(),
        });
      }
    }

    let mut nodes = def
      .nodes
      .into_iter()
      .map(Node::from_def)
      .collect::<Result<Vec<_>, _>>()?;
    nodes.sort_by_key(|n| n.order);

    Ok(Self {
      id: def.id,
      name: def.name,
      system_message: def.system_message.filter(|m| !m.is_empty()),
      depends_on: def.depends_on,
      nodes,
    })
  }

  pub fn nodes(&self) -> &[Node] {
    &self.nodes
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Node at a traversal position.
  pub fn node(&self, index: usize) -> Option<&Node> {
    self.nodes.get(index)
  }

  /// Node under a cursor, if the cursor is in bounds.
  pub fn node_at(&self, cursor: FlowCursor) -> Option<&Node> {
    self.nodes.get(cursor.index())
  }

  /// Traversal position of a node id.
  pub fn position_of(&self, node_id: &str) -> Option<usize> {
    self.nodes.iter().position(|n| n.id == node_id)
  }

  /// Cursor at the first node.
  pub fn start(&self) -> FlowCursor {
    FlowCursor::new(self.nodes.len())
  }

  /// Prerequisite scenarios not present in `completed`.
  pub fn unmet_dependencies<'a>(&'a self, completed: &HashSet<String>) -> Vec<&'a str> {
    self
      .depends_on
      .iter()
      .filter(|id| !completed.contains(*id))
      .map(String::as_str)
      .collect()
  }
}
