//! Flowdeck Store
//!
//! Storage collaborator for step submissions. Records live in named
//! collections and carry an `id` plus `createdAt`/`updatedAt` timestamps.
//!
//! The [`CollectionStore`] trait defines operations for:
//! - Fetching a single record by id
//! - Listing records with `where` filters, ordering, limits and population
//! - Creating records and upserting partial updates
//! - Deleting records

mod error;
mod fs;
mod memory;
mod query;
mod types;

pub use error::StoreError;
pub use fs::FsStore;
pub use memory::InMemoryStore;
pub use types::{Filter, FilterOp, ListOptions, OrderBy, Populate, Record, SortDirection};

use async_trait::async_trait;
use serde_json::{Map, Value};

/// Storage trait for collection-backed records.
#[async_trait]
pub trait CollectionStore: Send + Sync {
  /// Get a record by id. Missing records are `Ok(None)`.
  async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, StoreError>;

  /// List records matching `options`.
  async fn list(&self, collection: &str, options: &ListOptions) -> Result<Vec<Record>, StoreError>;

  /// Create a record. An `id` in `data` is kept, otherwise one is assigned.
  async fn create(&self, collection: &str, data: Map<String, Value>) -> Result<Record, StoreError>;

  /// Merge `data` into the record with `id`, creating it if absent.
  async fn update(
    &self,
    collection: &str,
    id: &str,
    data: Map<String, Value>,
  ) -> Result<Record, StoreError>;

  /// Delete a record. Deleting a missing record is not an error.
  async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}
