use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
  /// A write was attempted before any workspace was selected.
  #[error("no active workspace")]
  NoActiveWorkspace,

  #[error("invalid context path: '{path}'")]
  InvalidPath { path: String },
}
