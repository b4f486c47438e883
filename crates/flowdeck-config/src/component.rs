use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the template directory every lookup can fall back to.
pub const DEFAULT_TEMPLATE_DIRECTORY: &str = "default";

/// The kind of component being resolved. Selects the subdirectory of a
/// template directory that holds implementations of that kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentKind {
  FlowStep,
  Layout,
  Widget,
  /// Any other kind; its subdirectory is the kind name with an `s` suffix.
  Other(String),
}

impl ComponentKind {
  pub fn as_str(&self) -> &str {
    match self {
      ComponentKind::FlowStep => "flowStep",
      ComponentKind::Layout => "layout",
      ComponentKind::Widget => "widget",
      ComponentKind::Other(kind) => kind,
    }
  }

  /// Subdirectory name used when building a module path.
  pub fn subdir(&self) -> Cow<'_, str> {
    match self {
      ComponentKind::FlowStep => Cow::Borrowed("flowSteps"),
      ComponentKind::Layout => Cow::Borrowed("layouts"),
      ComponentKind::Widget => Cow::Borrowed("widgets"),
      ComponentKind::Other(kind) => Cow::Owned(format!("{}s", kind)),
    }
  }
}

impl From<String> for ComponentKind {
  fn from(value: String) -> Self {
    match value.as_str() {
      "flowStep" => ComponentKind::FlowStep,
      "layout" => ComponentKind::Layout,
      "widget" => ComponentKind::Widget,
      _ => ComponentKind::Other(value),
    }
  }
}

impl From<&str> for ComponentKind {
  fn from(value: &str) -> Self {
    ComponentKind::from(value.to_string())
  }
}

impl From<ComponentKind> for String {
  fn from(kind: ComponentKind) -> Self {
    kind.as_str().to_string()
  }
}

impl fmt::Display for ComponentKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Identifier of a tenant's template directory (theme namespace).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateDirectory(String);

impl TemplateDirectory {
  pub fn new(name: impl Into<String>) -> Self {
    Self(name.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Whether this is the literal default directory.
  pub fn is_default(&self) -> bool {
    self.0 == DEFAULT_TEMPLATE_DIRECTORY
  }
}

impl Default for TemplateDirectory {
  fn default() -> Self {
    Self(DEFAULT_TEMPLATE_DIRECTORY.to_string())
  }
}

impl From<&str> for TemplateDirectory {
  fn from(value: &str) -> Self {
    Self::new(value)
  }
}

impl From<String> for TemplateDirectory {
  fn from(value: String) -> Self {
    Self(value)
  }
}

impl fmt::Display for TemplateDirectory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_kind_subdirs() {
    assert_eq!(ComponentKind::FlowStep.subdir(), "flowSteps");
    assert_eq!(ComponentKind::Layout.subdir(), "layouts");
    assert_eq!(ComponentKind::Widget.subdir(), "widgets");
    assert_eq!(ComponentKind::from("chart").subdir(), "charts");
  }

  #[test]
  fn test_kind_serde() {
    let kind: ComponentKind = serde_json::from_str("\"flowStep\"").unwrap();
    assert_eq!(kind, ComponentKind::FlowStep);
    assert_eq!(serde_json::to_string(&ComponentKind::Widget).unwrap(), "\"widget\"");
  }

  #[test]
  fn test_default_directory() {
    assert!(TemplateDirectory::default().is_default());
    assert!(!TemplateDirectory::from("acme").is_default());
  }
}
