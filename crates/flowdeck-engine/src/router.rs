use std::sync::Arc;

use flowdeck_config::SubmitAction;
use flowdeck_context::ContextStore;
use flowdeck_scenario::Node;
use flowdeck_store::{CollectionStore, Record};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::error::SubmitError;

/// Where a submission went.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
  /// Written to the context store only.
  Context { key: String, data: Value },
  Created { collection: String, record: Record },
  Updated { collection: String, record: Record },
  /// The node has no `onSubmit` block; nothing was routed.
  Skipped,
}

impl Submission {
  /// Short description of the target, for events and logs.
  pub fn target(&self) -> String {
    match self {
      Submission::Context { key, .. } => format!("context:{}", key),
      Submission::Created { collection, record } | Submission::Updated { collection, record } => {
        format!("{}/{}", collection, record.id)
      }
      Submission::Skipped => "none".to_string(),
    }
  }
}

/// Routes step output to the context store or a collection, per the node's
/// `onSubmit` block.
///
/// `saveToContext` is checked first and never touches the collection store.
/// Otherwise a configured collection is written, updating when an existing
/// record id is known and creating otherwise.
#[derive(Clone)]
pub struct SubmissionRouter {
  store: Arc<dyn CollectionStore>,
  context: ContextStore,
}

impl SubmissionRouter {
  pub fn new(store: Arc<dyn CollectionStore>, context: ContextStore) -> Self {
    Self { store, context }
  }

  pub fn context(&self) -> &ContextStore {
    &self.context
  }

  #[instrument(name = "submit", skip(self, node, output), fields(node_id = %node.id))]
  pub async fn submit(
    &self,
    node: &Node,
    output: Value,
    edit_id: Option<&str>,
  ) -> Result<Submission, SubmitError> {
    let Some(on_submit) = &node.on_submit else {
      return Ok(Submission::Skipped);
    };

    if on_submit.save_to_context {
      let key = on_submit
        .context_key
        .as_deref()
        .or_else(|| node.schema_path())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| configuration(node, "saveToContext needs a contextKey or schemaPath"))?;

      let data = self.with_stable_id(key, output, edit_id);
      self.context.set(key, data.clone())?;
      info!(key = %key, "saved to context");
      return Ok(Submission::Context {
        key: key.to_string(),
        data,
      });
    }

    let Some(collection) = on_submit.collection.as_deref().filter(|c| !c.is_empty()) else {
      return Err(configuration(
        node,
        "onSubmit sets neither saveToContext nor collection",
      ));
    };

    let data = match output {
      Value::Object(map) => map,
      other => {
        let mut map = Map::new();
        map.insert("value".to_string(), other);
        map
      }
    };
    let action = on_submit.action.unwrap_or(if edit_id.is_some() {
      SubmitAction::Update
    } else {
      SubmitAction::Create
    });
    let existing_id = edit_id
      .map(str::to_string)
      .or_else(|| data.get("id").and_then(Value::as_str).map(str::to_string));

    match (action, existing_id) {
      (SubmitAction::Update, Some(id)) => {
        let record = self.store.update(collection, &id, data).await?;
        info!(collection = %collection, id = %record.id, "record updated");
        Ok(Submission::Updated {
          collection: collection.to_string(),
          record,
        })
      }
      _ => {
        let record = self.store.create(collection, data).await?;
        info!(collection = %collection, id = %record.id, "record created");
        Ok(Submission::Created {
          collection: collection.to_string(),
          record,
        })
      }
    }
  }

  /// Existing record for edit-in-place, for collection-backed nodes.
  pub async fn load_existing(
    &self,
    node: &Node,
    edit_id: &str,
  ) -> Result<Option<Record>, SubmitError> {
    match &node.on_submit {
      Some(on_submit) if !on_submit.save_to_context => match on_submit.collection.as_deref() {
        Some(collection) if !collection.is_empty() => {
          Ok(self.store.get(collection, edit_id).await?)
        }
        _ => Ok(None),
      },
      _ => Ok(None),
    }
  }

  /// Output with an `id` that survives resubmission: the output's own id,
  /// then the edit id, then the id already stored at `key`, else a new one.
  fn with_stable_id(&self, key: &str, output: Value, edit_id: Option<&str>) -> Value {
    let mut data = match output {
      Value::Object(map) => map,
      other => {
        let mut map = Map::new();
        map.insert("value".to_string(), other);
        map
      }
    };
    if !data.get("id").is_some_and(Value::is_string) {
      let id = edit_id
        .map(str::to_string)
        .or_else(|| {
          self
            .context
            .get(&format!("{}.id", key))
            .and_then(|v| v.as_str().map(str::to_string))
        })
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
      data.insert("id".to_string(), Value::String(id));
    }
    Value::Object(data)
  }
}

fn configuration(node: &Node, message: &str) -> SubmitError {
  SubmitError::Configuration {
    node_id: node.id.clone(),
    message: message.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use flowdeck_config::NodeDef;
  use flowdeck_store::{InMemoryStore, ListOptions, StoreError};
  use serde_json::json;
  use std::sync::atomic::{AtomicUsize, Ordering};

  /// Counts writes and delegates to an in-memory store.
  #[derive(Default)]
  struct CountingStore {
    inner: InMemoryStore,
    creates: AtomicUsize,
    updates: AtomicUsize,
  }

  #[async_trait]
  impl CollectionStore for CountingStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, StoreError> {
      self.inner.get(collection, id).await
    }

    async fn list(
      &self,
      collection: &str,
      options: &ListOptions,
    ) -> Result<Vec<Record>, StoreError> {
      self.inner.list(collection, options).await
    }

    async fn create(
      &self,
      collection: &str,
      data: Map<String, Value>,
    ) -> Result<Record, StoreError> {
      self.creates.fetch_add(1, Ordering::SeqCst);
      self.inner.create(collection, data).await
    }

    async fn update(
      &self,
      collection: &str,
      id: &str,
      data: Map<String, Value>,
    ) -> Result<Record, StoreError> {
      self.updates.fetch_add(1, Ordering::SeqCst);
      self.inner.update(collection, id, data).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
      self.inner.delete(collection, id).await
    }
  }

  fn node(on_submit: Option<Value>) -> Node {
    let mut attrs = json!({ "schemaPath": "schemas.profile" });
    if let Some(on_submit) = on_submit {
      attrs["onSubmit"] = on_submit;
    }
    let def: NodeDef = serde_json::from_value(json!({
      "id": "profile", "type": "custom", "attrs": attrs
    }))
    .unwrap();
    Node::from_def(def).unwrap()
  }

  fn router() -> (SubmissionRouter, Arc<CountingStore>) {
    let store = Arc::new(CountingStore::default());
    let router = SubmissionRouter::new(store.clone(), ContextStore::for_workspace("ws1"));
    (router, store)
  }

  #[tokio::test]
  async fn test_save_to_context_skips_store() {
    let (router, store) = router();
    let node = node(Some(json!({ "saveToContext": true, "contextKey": "k" })));

    let submission = router
      .submit(&node, json!({ "name": "Jan" }), None)
      .await
      .unwrap();

    assert!(matches!(submission, Submission::Context { ref key, .. } if key == "k"));
    assert_eq!(store.creates.load(Ordering::SeqCst), 0);
    assert_eq!(store.updates.load(Ordering::SeqCst), 0);
    let stored = router.context().get("k").unwrap();
    assert_eq!(stored["name"], json!("Jan"));
    assert!(stored["id"].is_string());
  }

  #[tokio::test]
  async fn test_save_to_context_wins_over_collection() {
    let (router, store) = router();
    let node = node(Some(json!({
      "saveToContext": true, "collection": "profiles"
    })));

    router.submit(&node, json!({ "a": 1 }), None).await.unwrap();

    assert_eq!(store.creates.load(Ordering::SeqCst), 0);
    // falls back to the schema path as key
    assert_eq!(router.context().get("schemas.profile.a"), Some(json!(1)));
  }

  #[tokio::test]
  async fn test_context_id_is_stable_across_resubmits() {
    let (router, _) = router();
    let node = node(Some(json!({ "saveToContext": true, "contextKey": "k" })));

    router.submit(&node, json!({ "v": 1 }), None).await.unwrap();
    let first = router.context().get("k.id").unwrap();
    router.submit(&node, json!({ "v": 2 }), None).await.unwrap();

    assert_eq!(router.context().get("k.id"), Some(first));
    assert_eq!(router.context().get("k.v"), Some(json!(2)));
  }

  #[tokio::test]
  async fn test_collection_create_then_update() {
    let (router, store) = router();
    let node = node(Some(json!({ "collection": "profiles" })));

    let created = router
      .submit(&node, json!({ "name": "Jan" }), None)
      .await
      .unwrap();
    let Submission::Created { record, .. } = created else {
      panic!("expected create, got {created:?}");
    };

    let updated = router
      .submit(&node, json!({ "name": "Janek" }), Some(&record.id))
      .await
      .unwrap();
    let Submission::Updated { record: updated, .. } = updated else {
      panic!("expected update, got {updated:?}");
    };

    assert_eq!(updated.id, record.id);
    assert_eq!(updated.field("name"), Some(json!("Janek")));
    assert_eq!(store.creates.load(Ordering::SeqCst), 1);
    assert_eq!(store.updates.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_explicit_create_while_editing() {
    let (router, store) = router();
    let node = node(Some(json!({ "collection": "profiles", "action": "create" })));

    let submission = router
      .submit(&node, json!({ "name": "Copy" }), Some("p1"))
      .await
      .unwrap();

    assert!(matches!(submission, Submission::Created { .. }));
    assert_eq!(store.updates.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_update_without_id_creates() {
    let (router, store) = router();
    let node = node(Some(json!({ "collection": "profiles", "action": "update" })));

    router.submit(&node, json!({ "name": "Jan" }), None).await.unwrap();
    assert_eq!(store.creates.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_neither_target_is_configuration_error() {
    let (router, store) = router();
    let node = node(Some(json!({ "navPath": "/done" })));

    let err = router.submit(&node, json!({}), None).await.unwrap_err();
    assert!(matches!(err, SubmitError::Configuration { ref node_id, .. } if node_id == "profile"));
    assert_eq!(store.creates.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_no_on_submit_is_skipped() {
    let (router, _) = router();
    let submission = router.submit(&node(None), json!({}), None).await.unwrap();
    assert_eq!(submission, Submission::Skipped);
  }

  #[tokio::test]
  async fn test_load_existing() {
    let (router, store) = router();
    let profile = node(Some(json!({ "collection": "profiles" })));
    store
      .inner
      .create("profiles", json!({ "id": "p1", "name": "Jan" }).as_object().unwrap().clone())
      .await
      .unwrap();

    let record = router.load_existing(&profile, "p1").await.unwrap().unwrap();
    assert_eq!(record.field("name"), Some(json!("Jan")));
    assert_eq!(router.load_existing(&profile, "p2").await.unwrap(), None);

    let context_node = node(Some(json!({ "saveToContext": true, "contextKey": "k" })));
    assert_eq!(router.load_existing(&context_node, "p1").await.unwrap(), None);
  }
}
