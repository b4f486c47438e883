use std::collections::BTreeSet;

use flowdeck_config::{ComponentKind, DEFAULT_TEMPLATE_DIRECTORY, TemplateDirectory};

/// File extension used for module paths unless configured otherwise.
pub const DEFAULT_EXTENSION: &str = "tsx";

/// Candidate module paths for one component request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentPath {
  /// Path inside the requested template directory.
  pub main_path: String,
  /// Path inside the default template directory.
  pub default_path: String,
}

/// Builds module paths of the form `/<template>/<kindSubdir>/<id>.<ext>`.
///
/// Pure string work; the same inputs always produce the same paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateResolver {
  extension: String,
}

impl TemplateResolver {
  pub fn new() -> Self {
    Self::with_extension(DEFAULT_EXTENSION)
  }

  pub fn with_extension(extension: impl Into<String>) -> Self {
    Self {
      extension: extension.into(),
    }
  }

  pub fn extension(&self) -> &str {
    &self.extension
  }

  /// Path of a component inside a single template directory.
  pub fn module_path(&self, template: &str, kind: &ComponentKind, component_id: &str) -> String {
    format!(
      "/{}/{}/{}.{}",
      template,
      kind.subdir(),
      component_id,
      self.extension
    )
  }

  /// Tenant path plus the default-directory fallback path.
  pub fn resolve_paths(
    &self,
    template: &TemplateDirectory,
    kind: &ComponentKind,
    component_id: &str,
  ) -> ComponentPath {
    ComponentPath {
      main_path: self.module_path(template.as_str(), kind, component_id),
      default_path: self.module_path(DEFAULT_TEMPLATE_DIRECTORY, kind, component_id),
    }
  }

  /// Whether `candidate` is among the known module paths.
  pub fn exists(known: &BTreeSet<String>, candidate: &str) -> bool {
    known.contains(candidate)
  }
}

impl Default for TemplateResolver {
  fn default() -> Self {
    Self::new()
  }
}
