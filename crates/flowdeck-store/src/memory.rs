use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::query::{check_collection, populate, select};
use crate::types::{ListOptions, Record};
use crate::{CollectionStore, StoreError};

/// Process-local store. Records keep their insertion order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
  collections: RwLock<HashMap<String, Vec<Record>>>,
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of records in `collection`.
  pub fn count(&self, collection: &str) -> usize {
    self
      .collections
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(collection)
      .map_or(0, Vec::len)
  }

  fn find(&self, collection: &str, id: &str) -> Option<Record> {
    self
      .collections
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(collection)?
      .iter()
      .find(|record| record.id == id)
      .cloned()
  }
}

#[async_trait]
impl CollectionStore for InMemoryStore {
  async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, StoreError> {
    check_collection(collection)?;
    Ok(self.find(collection, id))
  }

  async fn list(&self, collection: &str, options: &ListOptions) -> Result<Vec<Record>, StoreError> {
    check_collection(collection)?;
    let records = self
      .collections
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(collection)
      .cloned()
      .unwrap_or_default();

    let mut selected = select(records, options);
    if !options.populate.is_empty() {
      populate(&mut selected, &options.populate, |collection, id| {
        self.find(collection, id)
      });
    }
    Ok(selected)
  }

  async fn create(&self, collection: &str, data: Map<String, Value>) -> Result<Record, StoreError> {
    check_collection(collection)?;
    let record = Record::new(data);
    let mut collections = self
      .collections
      .write()
      .unwrap_or_else(PoisonError::into_inner);
    let records = collections.entry(collection.to_string()).or_default();
    // a supplied id replaces any record already holding it
    records.retain(|existing| existing.id != record.id);
    records.push(record.clone());
    debug!(collection = %collection, id = %record.id, "record created");
    Ok(record)
  }

  async fn update(
    &self,
    collection: &str,
    id: &str,
    data: Map<String, Value>,
  ) -> Result<Record, StoreError> {
    check_collection(collection)?;
    let mut collections = self
      .collections
      .write()
      .unwrap_or_else(PoisonError::into_inner);
    let records = collections.entry(collection.to_string()).or_default();

    if let Some(existing) = records.iter_mut().find(|record| record.id == id) {
      existing.merge(data);
      debug!(collection = %collection, id = %id, "record updated");
      return Ok(existing.clone());
    }

    let record = Record::with_id(id, data);
    records.push(record.clone());
    debug!(collection = %collection, id = %id, "record upserted");
    Ok(record)
  }

  async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
    check_collection(collection)?;
    let mut collections = self
      .collections
      .write()
      .unwrap_or_else(PoisonError::into_inner);
    if let Some(records) = collections.get_mut(collection) {
      records.retain(|record| record.id != id);
    }
    Ok(())
  }
}
