use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::query::{check_collection, populate, select};
use crate::types::{ListOptions, Record};
use crate::{CollectionStore, StoreError};

/// Local document store: one JSON file per collection under a directory.
///
/// Each file holds an array of records. Writes are serialized through a
/// single lock and land via a temp file plus rename.
#[derive(Debug)]
pub struct FsStore {
  root: PathBuf,
  lock: Mutex<()>,
}

impl FsStore {
  /// Open a store rooted at `root`, creating the directory if needed.
  pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
    let root = root.into();
    tokio::fs::create_dir_all(&root).await?;
    Ok(Self {
      root,
      lock: Mutex::new(()),
    })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn collection_path(&self, collection: &str) -> PathBuf {
    self.root.join(format!("{collection}.json"))
  }

  async fn read_collection(&self, collection: &str) -> Result<Vec<Record>, StoreError> {
    let path = self.collection_path(collection);
    let raw = match tokio::fs::read(&path).await {
      Ok(raw) => raw,
      Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
      Err(err) => return Err(err.into()),
    };
    serde_json::from_slice(&raw).map_err(|err| StoreError::InvalidRecord {
      collection: collection.to_string(),
      message: err.to_string(),
    })
  }

  async fn write_collection(&self, collection: &str, records: &[Record]) -> Result<(), StoreError> {
    let path = self.collection_path(collection);
    let tmp = self.root.join(format!(".{collection}.json.tmp"));
    let raw = serde_json::to_vec_pretty(records)?;
    tokio::fs::write(&tmp, raw).await?;
    tokio::fs::rename(&tmp, &path).await?;
    Ok(())
  }
}

#[async_trait]
impl CollectionStore for FsStore {
  async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, StoreError> {
    check_collection(collection)?;
    let records = self.read_collection(collection).await?;
    Ok(records.into_iter().find(|record| record.id == id))
  }

  #[instrument(name = "fs_store_list", skip(self, options), fields(collection = %collection))]
  async fn list(&self, collection: &str, options: &ListOptions) -> Result<Vec<Record>, StoreError> {
    check_collection(collection)?;
    let records = self.read_collection(collection).await?;
    let mut selected = select(records, options);

    if !options.populate.is_empty() {
      let mut referenced: Vec<(String, Vec<Record>)> = Vec::new();
      for spec in &options.populate {
        check_collection(&spec.collection)?;
        if !referenced.iter().any(|(name, _)| name == &spec.collection) {
          let records = self.read_collection(&spec.collection).await?;
          referenced.push((spec.collection.clone(), records));
        }
      }
      populate(&mut selected, &options.populate, |collection, id| {
        referenced
          .iter()
          .find(|(name, _)| name == collection)
          .and_then(|(_, records)| records.iter().find(|record| record.id == id))
          .cloned()
      });
    }

    Ok(selected)
  }

  #[instrument(name = "fs_store_create", skip(self, data), fields(collection = %collection))]
  async fn create(&self, collection: &str, data: Map<String, Value>) -> Result<Record, StoreError> {
    check_collection(collection)?;
    let _guard = self.lock.lock().await;
    let mut records = self.read_collection(collection).await?;
    let record = Record::new(data);
    records.retain(|existing| existing.id != record.id);
    records.push(record.clone());
    self.write_collection(collection, &records).await?;
    debug!(id = %record.id, "record created");
    Ok(record)
  }

  #[instrument(name = "fs_store_update", skip(self, data), fields(collection = %collection, id = %id))]
  async fn update(
    &self,
    collection: &str,
    id: &str,
    data: Map<String, Value>,
  ) -> Result<Record, StoreError> {
    check_collection(collection)?;
    let _guard = self.lock.lock().await;
    let mut records = self.read_collection(collection).await?;

    let record = match records.iter_mut().find(|record| record.id == id) {
      Some(existing) => {
        existing.merge(data);
        existing.clone()
      }
      None => {
        let record = Record::with_id(id, data);
        records.push(record.clone());
        record
      }
    };

    self.write_collection(collection, &records).await?;
    debug!("record written");
    Ok(record)
  }

  async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
    check_collection(collection)?;
    let _guard = self.lock.lock().await;
    let mut records = self.read_collection(collection).await?;
    let before = records.len();
    records.retain(|record| record.id != id);
    if records.len() != before {
      self.write_collection(collection, &records).await?;
    }
    Ok(())
  }
}
