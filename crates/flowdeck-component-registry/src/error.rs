use flowdeck_config::ComponentKind;
use thiserror::Error;

/// Errors raised by a module source while importing a single path.
#[derive(Debug, Clone, Error)]
pub enum ModuleError {
  #[error("module not found: {path}")]
  NotFound { path: String },

  #[error("failed to load module {path}: {message}")]
  Failed { path: String, message: String },
}

/// Why a component could not be loaded from any candidate path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
  /// No candidate path is registered.
  #[error("component '{component_id}' ({kind}) not found; tried: {}", tried.join(", "))]
  NotFound {
    component_id: String,
    kind: ComponentKind,
    tried: Vec<String>,
  },

  /// A registered module failed to load.
  #[error("component '{component_id}' ({kind}) failed to load from {path}: {message}; tried: {}", tried.join(", "))]
  LoadFailed {
    component_id: String,
    kind: ComponentKind,
    path: String,
    message: String,
    tried: Vec<String>,
  },

  /// A registered module loaded but exports no component.
  #[error("component '{component_id}' ({kind}) at {path} has no default export; tried: {}", tried.join(", "))]
  NoDefaultExport {
    component_id: String,
    kind: ComponentKind,
    path: String,
    tried: Vec<String>,
  },
}

impl LoadError {
  pub fn component_id(&self) -> &str {
    match self {
      LoadError::NotFound { component_id, .. }
      | LoadError::LoadFailed { component_id, .. }
      | LoadError::NoDefaultExport { component_id, .. } => component_id,
    }
  }

  /// Candidate paths that were considered, in order.
  pub fn tried(&self) -> &[String] {
    match self {
      LoadError::NotFound { tried, .. }
      | LoadError::LoadFailed { tried, .. }
      | LoadError::NoDefaultExport { tried, .. } => tried,
    }
  }
}
