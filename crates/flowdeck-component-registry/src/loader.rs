use std::sync::Arc;

use flowdeck_config::{ComponentKind, TemplateDirectory};
use tracing::{debug, instrument, warn};

use crate::error::{LoadError, ModuleError};
use crate::registry::ModuleSource;
use crate::resolver::TemplateResolver;

/// Inputs of a component load. A slot reloads whenever these change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadRequest {
  pub kind: ComponentKind,
  pub component_id: String,
  pub template: TemplateDirectory,
  pub fallback_to_default: bool,
}

impl LoadRequest {
  pub fn new(kind: ComponentKind, component_id: impl Into<String>, template: TemplateDirectory) -> Self {
    Self {
      kind,
      component_id: component_id.into(),
      template,
      fallback_to_default: true,
    }
  }

  pub fn without_fallback(mut self) -> Self {
    self.fallback_to_default = false;
    self
  }
}

/// Outcome of a load. `error` is the only failure signal.
#[derive(Debug, Clone)]
pub struct LoadResult<C> {
  pub component: Option<C>,
  /// Module path the component came from.
  pub resolved_path: Option<String>,
  pub error: Option<LoadError>,
  pub is_loading: bool,
}

impl<C> LoadResult<C> {
  pub fn loading() -> Self {
    Self {
      component: None,
      resolved_path: None,
      error: None,
      is_loading: true,
    }
  }

  /// Nothing requested yet.
  pub fn idle() -> Self {
    Self {
      is_loading: false,
      ..Self::loading()
    }
  }

  fn loaded(component: C, path: String) -> Self {
    Self {
      component: Some(component),
      resolved_path: Some(path),
      error: None,
      is_loading: false,
    }
  }

  fn failed(error: LoadError) -> Self {
    Self {
      component: None,
      resolved_path: None,
      error: Some(error),
      is_loading: false,
    }
  }
}

/// Why a single candidate path did not yield a component.
enum Attempt {
  NotFound,
  Failed(String),
  NoDefaultExport,
}

/// Loads components from a module source, tenant directory first.
pub struct ComponentLoader<C> {
  source: Arc<dyn ModuleSource<C>>,
  resolver: TemplateResolver,
}

impl<C> Clone for ComponentLoader<C> {
  fn clone(&self) -> Self {
    Self {
      source: self.source.clone(),
      resolver: self.resolver.clone(),
    }
  }
}

impl<C: Clone + Send + Sync + 'static> ComponentLoader<C> {
  pub fn new(source: Arc<dyn ModuleSource<C>>, resolver: TemplateResolver) -> Self {
    Self { source, resolver }
  }

  pub fn resolver(&self) -> &TemplateResolver {
    &self.resolver
  }

  pub fn source(&self) -> &Arc<dyn ModuleSource<C>> {
    &self.source
  }

  /// Load a component.
  ///
  /// 1. Try the tenant path if it is registered.
  /// 2. If that produced nothing, fallback is enabled and the template is not
  ///    the default directory, try the default path.
  /// 3. Otherwise report which paths were tried.
  ///
  /// Never returns a Rust error; failures are reported in [`LoadResult::error`].
  #[instrument(
    name = "component_load",
    skip(self, template),
    fields(template = %template)
  )]
  pub async fn load(
    &self,
    kind: &ComponentKind,
    component_id: &str,
    template: &TemplateDirectory,
    fallback_to_default: bool,
  ) -> LoadResult<C> {
    let paths = self.resolver.resolve_paths(template, kind, component_id);
    let mut tried = vec![paths.main_path.clone()];
    let mut failures = Vec::new();

    match self.try_path(&paths.main_path).await {
      Ok(component) => return LoadResult::loaded(component, paths.main_path),
      Err(attempt) => failures.push((paths.main_path.clone(), attempt)),
    }

    if fallback_to_default && !template.is_default() {
      tried.push(paths.default_path.clone());
      match self.try_path(&paths.default_path).await {
        Ok(component) => {
          debug!(path = %paths.default_path, "resolved component from default template");
          return LoadResult::loaded(component, paths.default_path);
        }
        Err(attempt) => failures.push((paths.default_path.clone(), attempt)),
      }
    }

    let error = classify(kind, component_id, tried, failures);
    warn!(error = %error, "component could not be loaded");
    LoadResult::failed(error)
  }

  /// Convenience wrapper taking a [`LoadRequest`].
  pub async fn load_request(&self, request: &LoadRequest) -> LoadResult<C> {
    self
      .load(
        &request.kind,
        &request.component_id,
        &request.template,
        request.fallback_to_default,
      )
      .await
  }

  async fn try_path(&self, path: &str) -> Result<C, Attempt> {
    if !TemplateResolver::exists(self.source.known_paths(), path) {
      return Err(Attempt::NotFound);
    }

    match self.source.import(path).await {
      Ok(module) => match module.default {
        Some(component) => Ok(component),
        None => {
          warn!(path = %path, "module has no default export");
          Err(Attempt::NoDefaultExport)
        }
      },
      Err(ModuleError::NotFound { .. }) => Err(Attempt::NotFound),
      Err(ModuleError::Failed { message, .. }) => {
        warn!(path = %path, error = %message, "module failed to load");
        Err(Attempt::Failed(message))
      }
    }
  }
}

/// Pick the most informative failure: a load error, then a missing default
/// export, then plain not-found.
fn classify(
  kind: &ComponentKind,
  component_id: &str,
  tried: Vec<String>,
  failures: Vec<(String, Attempt)>,
) -> LoadError {
  let mut no_default = None;
  for (path, attempt) in &failures {
    match attempt {
      Attempt::Failed(message) => {
        return LoadError::LoadFailed {
          component_id: component_id.to_string(),
          kind: kind.clone(),
          path: path.clone(),
          message: message.clone(),
          tried,
        };
      }
      Attempt::NoDefaultExport if no_default.is_none() => no_default = Some(path.clone()),
      _ => {}
    }
  }

  match no_default {
    Some(path) => LoadError::NoDefaultExport {
      component_id: component_id.to_string(),
      kind: kind.clone(),
      path,
      tried,
    },
    None => LoadError::NotFound {
      component_id: component_id.to_string(),
      kind: kind.clone(),
      tried,
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::registry::{LoadFuture, Module, StaticRegistry};

  fn loader(paths: &[(&str, Module<&'static str>)]) -> ComponentLoader<&'static str> {
    let mut registry = StaticRegistry::new(TemplateResolver::new());
    for (path, module) in paths {
      registry.register_module(*path, module.clone());
    }
    ComponentLoader::new(Arc::new(registry), TemplateResolver::new())
  }

  #[tokio::test]
  async fn test_tenant_component_wins() {
    let loader = loader(&[
      ("/acme/flowSteps/FooStep.tsx", Module::with_default("acme")),
      ("/default/flowSteps/FooStep.tsx", Module::with_default("default")),
    ]);

    let result = loader
      .load(&ComponentKind::FlowStep, "FooStep", &"acme".into(), true)
      .await;

    assert_eq!(result.component, Some("acme"));
    assert_eq!(result.resolved_path.as_deref(), Some("/acme/flowSteps/FooStep.tsx"));
    assert!(result.error.is_none());
  }

  #[tokio::test]
  async fn test_falls_back_to_default() {
    let loader = loader(&[("/default/flowSteps/FooStep.tsx", Module::with_default("default"))]);

    let result = loader
      .load(&ComponentKind::FlowStep, "FooStep", &"acme".into(), true)
      .await;

    assert_eq!(result.component, Some("default"));
    assert!(result.error.is_none());
    assert!(!result.is_loading);
  }

  #[tokio::test]
  async fn test_fallback_disabled() {
    let loader = loader(&[("/default/flowSteps/FooStep.tsx", Module::with_default("default"))]);

    let result = loader
      .load(&ComponentKind::FlowStep, "FooStep", &"acme".into(), false)
      .await;

    assert!(result.component.is_none());
    let error = result.error.unwrap();
    assert_eq!(error.tried(), &["/acme/flowSteps/FooStep.tsx".to_string()]);
  }

  #[tokio::test]
  async fn test_not_found_names_component_and_paths() {
    let loader = loader(&[]);

    let result = loader
      .load(&ComponentKind::FlowStep, "FooStep", &"acme".into(), true)
      .await;

    assert!(result.component.is_none());
    let error = result.error.unwrap();
    assert!(matches!(error, LoadError::NotFound { .. }));
    assert_eq!(error.component_id(), "FooStep");
    assert!(error.to_string().contains("FooStep"));
    assert_eq!(
      error.tried(),
      &[
        "/acme/flowSteps/FooStep.tsx".to_string(),
        "/default/flowSteps/FooStep.tsx".to_string()
      ]
    );
  }

  #[tokio::test]
  async fn test_default_template_tries_once() {
    let loader = loader(&[]);

    let result = loader
      .load(&ComponentKind::Layout, "FlowLayout", &TemplateDirectory::default(), true)
      .await;

    assert_eq!(result.error.unwrap().tried().len(), 1);
  }

  #[tokio::test]
  async fn test_missing_default_export_falls_back() {
    let loader = loader(&[
      ("/acme/widgets/Chart.tsx", Module::empty()),
      ("/default/widgets/Chart.tsx", Module::with_default("chart")),
    ]);

    let result = loader
      .load(&ComponentKind::Widget, "Chart", &"acme".into(), true)
      .await;

    assert_eq!(result.component, Some("chart"));
  }

  #[tokio::test]
  async fn test_missing_default_export_reported() {
    let loader = loader(&[("/acme/widgets/Chart.tsx", Module::empty())]);

    let result = loader
      .load(&ComponentKind::Widget, "Chart", &"acme".into(), true)
      .await;

    assert!(matches!(
      result.error,
      Some(LoadError::NoDefaultExport { ref path, .. }) if path == "/acme/widgets/Chart.tsx"
    ));
  }

  #[tokio::test]
  async fn test_load_failure_reported() {
    let mut registry: StaticRegistry<&'static str> = StaticRegistry::new(TemplateResolver::new());
    registry.register_factory(
      "/acme/layouts/FlowLayout.tsx",
      Arc::new(|| -> LoadFuture<&'static str> {
        Box::pin(async {
          Err(ModuleError::Failed {
            path: "/acme/layouts/FlowLayout.tsx".to_string(),
            message: "syntax error".to_string(),
          })
        })
      }),
    );
    let loader = ComponentLoader::new(Arc::new(registry), TemplateResolver::new());

    let result = loader
      .load(&ComponentKind::Layout, "FlowLayout", &"acme".into(), true)
      .await;

    assert!(matches!(
      result.error,
      Some(LoadError::LoadFailed { ref message, .. }) if message == "syntax error"
    ));
  }
}
