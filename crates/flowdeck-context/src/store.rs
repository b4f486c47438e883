use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ContextError;
use crate::path::{get_path, merge_path, set_path};
use crate::template::process_template;

#[derive(Debug, Default)]
struct WorkspaceContext {
  values: Value,
  schemas: Value,
}

impl WorkspaceContext {
  fn new() -> Self {
    Self {
      values: Value::Object(Map::new()),
      schemas: Value::Object(Map::new()),
    }
  }
}

#[derive(Debug, Default)]
struct Inner {
  active: Option<String>,
  workspaces: HashMap<String, WorkspaceContext>,
}

/// Shared, per-workspace keyed context values.
///
/// Reads and writes always target the workspace that is active at the time
/// of the call, so a write issued by a slow async operation lands in the
/// current workspace rather than one captured earlier.
#[derive(Debug, Clone, Default)]
pub struct ContextStore {
  inner: Arc<RwLock<Inner>>,
}

impl ContextStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Store with `workspace_id` already active.
  pub fn for_workspace(workspace_id: impl Into<String>) -> Self {
    let store = Self::new();
    store.set_active_workspace(workspace_id);
    store
  }

  fn read(&self) -> RwLockReadGuard<'_, Inner> {
    self.inner.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn write(&self) -> RwLockWriteGuard<'_, Inner> {
    self.inner.write().unwrap_or_else(PoisonError::into_inner)
  }

  /// Switch the active workspace. Existing values of other workspaces are
  /// kept until cleared.
  pub fn set_active_workspace(&self, workspace_id: impl Into<String>) {
    let workspace_id = workspace_id.into();
    let mut inner = self.write();
    inner
      .workspaces
      .entry(workspace_id.clone())
      .or_insert_with(WorkspaceContext::new);
    debug!(workspace_id = %workspace_id, "context workspace activated");
    inner.active = Some(workspace_id);
  }

  pub fn active_workspace(&self) -> Option<String> {
    self.read().active.clone()
  }

  /// Drop every value and schema stored for a workspace.
  pub fn clear_workspace(&self, workspace_id: &str) {
    let mut inner = self.write();
    if let Some(ctx) = inner.workspaces.get_mut(workspace_id) {
      *ctx = WorkspaceContext::new();
    }
  }

  /// Value at `path` in the active workspace.
  pub fn get(&self, path: &str) -> Option<Value> {
    let inner = self.read();
    let ctx = inner.active.as_ref().and_then(|id| inner.workspaces.get(id))?;
    get_path(&ctx.values, path).cloned()
  }

  /// Write `value` at `path` in the active workspace.
  pub fn set(&self, path: &str, value: Value) -> Result<(), ContextError> {
    self.with_active(|ctx| set_path(&mut ctx.values, path, value))
  }

  /// Merge `value` into the value at `path` (shallow, objects only).
  pub fn merge(&self, path: &str, value: Value) -> Result<(), ContextError> {
    self.with_active(|ctx| merge_path(&mut ctx.values, path, value))
  }

  /// Copy of the active workspace's values.
  pub fn snapshot(&self) -> Value {
    let inner = self.read();
    inner
      .active
      .as_ref()
      .and_then(|id| inner.workspaces.get(id))
      .map(|ctx| ctx.values.clone())
      .unwrap_or_else(|| Value::Object(Map::new()))
  }

  /// Interpolate `template` against the active workspace's values.
  pub fn render(&self, template: &str) -> String {
    process_template(template, &self.snapshot())
  }

  /// Register a JSON schema at `path` in the active workspace.
  pub fn set_schema(&self, path: &str, schema: Value) -> Result<(), ContextError> {
    self.with_active(|ctx| set_path(&mut ctx.schemas, path, schema))
  }

  /// Schema registered at `path`, if any.
  pub fn get_schema_at_path(&self, path: &str) -> Option<Value> {
    let inner = self.read();
    let ctx = inner.active.as_ref().and_then(|id| inner.workspaces.get(id))?;
    get_path(&ctx.schemas, path).cloned()
  }

  fn with_active<T>(
    &self,
    f: impl FnOnce(&mut WorkspaceContext) -> Result<T, ContextError>,
  ) -> Result<T, ContextError> {
    let mut guard = self.write();
    let inner = &mut *guard;
    let id = inner.active.as_ref().ok_or(ContextError::NoActiveWorkspace)?;
    let ctx = inner
      .workspaces
      .entry(id.clone())
      .or_insert_with(WorkspaceContext::new);
    f(ctx)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_set_get_round_trip() {
    let store = ContextStore::for_workspace("ws1");
    let value = json!({ "name": "Jan", "tags": ["a"] });
    store.set("step0", value.clone()).unwrap();
    assert_eq!(store.get("step0"), Some(value));
    assert_eq!(store.get("step0.name"), Some(json!("Jan")));
    assert_eq!(store.get("step1"), None);
  }

  #[test]
  fn test_write_without_workspace() {
    let store = ContextStore::new();
    assert_eq!(store.set("a", json!(1)), Err(ContextError::NoActiveWorkspace));
    assert_eq!(store.get("a"), None);
  }

  #[test]
  fn test_workspaces_are_isolated() {
    let store = ContextStore::for_workspace("ws1");
    store.set("a", json!(1)).unwrap();

    store.set_active_workspace("ws2");
    assert_eq!(store.get("a"), None);
    store.set("a", json!(2)).unwrap();

    store.set_active_workspace("ws1");
    assert_eq!(store.get("a"), Some(json!(1)));
  }

  #[test]
  fn test_clones_share_state_and_follow_active_workspace() {
    let store = ContextStore::for_workspace("ws1");
    let captured = store.clone();

    store.set_active_workspace("ws2");
    // a write through an older handle lands in the current workspace
    captured.set("late", json!(true)).unwrap();

    assert_eq!(store.get("late"), Some(json!(true)));
    store.set_active_workspace("ws1");
    assert_eq!(store.get("late"), None);
  }

  #[test]
  fn test_clear_workspace() {
    let store = ContextStore::for_workspace("ws1");
    store.set("a", json!(1)).unwrap();
    store.set_schema("schemas.a", json!({ "type": "object" })).unwrap();

    store.clear_workspace("ws1");
    assert_eq!(store.get("a"), None);
    assert_eq!(store.get_schema_at_path("schemas.a"), None);
  }

  #[test]
  fn test_schema_lookup() {
    let store = ContextStore::for_workspace("ws1");
    let schema = json!({ "type": "object", "properties": { "name": { "type": "string" } } });
    store.set_schema("campaign.settings", schema.clone()).unwrap();

    assert_eq!(store.get_schema_at_path("campaign.settings"), Some(schema));
    assert_eq!(store.get_schema_at_path("campaign.missing"), None);
    // schemas do not leak into values
    assert_eq!(store.get("campaign"), None);
  }

  #[test]
  fn test_render() {
    let store = ContextStore::for_workspace("ws1");
    store.set("user.name", json!("Jan")).unwrap();
    assert_eq!(store.render("Hello {{user.name}}!"), "Hello Jan!");
  }

  #[test]
  fn test_merge() {
    let store = ContextStore::for_workspace("ws1");
    store.set("step", json!({ "a": 1 })).unwrap();
    store.merge("step", json!({ "b": 2 })).unwrap();
    assert_eq!(store.get("step"), Some(json!({ "a": 1, "b": 2 })));
  }
}
