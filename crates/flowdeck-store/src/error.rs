use thiserror::Error;

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
  /// Collection names must be non-empty and free of path separators.
  #[error("invalid collection name: '{name}'")]
  InvalidCollection { name: String },

  #[error("invalid record in '{collection}': {message}")]
  InvalidRecord { collection: String, message: String },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// Failure reported by an external backend.
  #[error("storage backend error: {0}")]
  Backend(String),
}
