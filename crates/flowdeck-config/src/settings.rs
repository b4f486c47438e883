use serde::{Deserialize, Serialize};

use crate::component::TemplateDirectory;

/// Workspace-level settings relevant to template resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSettings {
  pub id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub application_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub template_directory: Option<String>,
}

/// Settings of the application owning a workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSettings {
  pub id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub template_directory: Option<String>,
}

/// Pick the template directory for a workspace.
///
/// Workspace setting first, then the owning application's, then the literal
/// default directory. Blank values count as unset.
pub fn resolve_template_directory(
  workspace: Option<&WorkspaceSettings>,
  application: Option<&ApplicationSettings>,
) -> TemplateDirectory {
  let configured = |value: Option<&String>| {
    value
      .map(|v| v.trim())
      .filter(|v| !v.is_empty())
      .map(TemplateDirectory::from)
  };

  configured(workspace.and_then(|w| w.template_directory.as_ref()))
    .or_else(|| configured(application.and_then(|a| a.template_directory.as_ref())))
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn workspace(dir: Option<&str>) -> WorkspaceSettings {
    WorkspaceSettings {
      id: "ws".to_string(),
      application_id: Some("app".to_string()),
      template_directory: dir.map(String::from),
    }
  }

  fn application(dir: Option<&str>) -> ApplicationSettings {
    ApplicationSettings {
      id: "app".to_string(),
      template_directory: dir.map(String::from),
    }
  }

  #[test]
  fn test_workspace_wins() {
    let dir = resolve_template_directory(Some(&workspace(Some("acme"))), Some(&application(Some("corp"))));
    assert_eq!(dir.as_str(), "acme");
  }

  #[test]
  fn test_falls_back_to_application() {
    let dir = resolve_template_directory(Some(&workspace(None)), Some(&application(Some("corp"))));
    assert_eq!(dir.as_str(), "corp");
  }

  #[test]
  fn test_blank_counts_as_unset() {
    let dir = resolve_template_directory(Some(&workspace(Some("  "))), Some(&application(None)));
    assert!(dir.is_default());
  }

  #[test]
  fn test_nothing_configured() {
    assert!(resolve_template_directory(None, None).is_default());
  }
}
