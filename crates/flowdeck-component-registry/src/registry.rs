use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use flowdeck_config::{ComponentKind, TemplateDirectory};

use crate::error::ModuleError;
use crate::resolver::TemplateResolver;

/// A loaded module. Only its default export is used as a component.
#[derive(Debug, Clone)]
pub struct Module<C> {
  pub default: Option<C>,
}

impl<C> Module<C> {
  pub fn with_default(component: C) -> Self {
    Self {
      default: Some(component),
    }
  }

  /// A module that loads but exports nothing usable.
  pub fn empty() -> Self {
    Self { default: None }
  }
}

/// Future returned by a module factory.
pub type LoadFuture<C> = Pin<Box<dyn Future<Output = Result<Module<C>, ModuleError>> + Send>>;

/// Produces a module on demand.
pub type ModuleFactory<C> = Arc<dyn Fn() -> LoadFuture<C> + Send + Sync>;

/// Source of loadable modules keyed by path.
#[async_trait]
pub trait ModuleSource<C>: Send + Sync {
  /// Every path this source can load.
  fn known_paths(&self) -> &BTreeSet<String>;

  /// Load the module registered at `path`.
  async fn import(&self, path: &str) -> Result<Module<C>, ModuleError>;
}

/// Registration table built at startup.
///
/// ```text
/// /default/flowSteps/FormStep.tsx   -> FormStep
/// /default/layouts/FlowLayout.tsx   -> FlowLayout
/// /acme/flowSteps/FormStep.tsx      -> AcmeFormStep
/// ```
pub struct StaticRegistry<C> {
  resolver: TemplateResolver,
  factories: BTreeMap<String, ModuleFactory<C>>,
  known: BTreeSet<String>,
}

impl<C: Clone + Send + Sync + 'static> StaticRegistry<C> {
  pub fn new(resolver: TemplateResolver) -> Self {
    Self {
      resolver,
      factories: BTreeMap::new(),
      known: BTreeSet::new(),
    }
  }

  pub fn resolver(&self) -> &TemplateResolver {
    &self.resolver
  }

  /// Register a factory under an explicit path. Replaces any previous entry.
  pub fn register_factory(&mut self, path: impl Into<String>, factory: ModuleFactory<C>) {
    let path = path.into();
    self.known.insert(path.clone());
    self.factories.insert(path, factory);
  }

  /// Register an already-built module under an explicit path.
  pub fn register_module(&mut self, path: impl Into<String>, module: Module<C>) {
    let factory: ModuleFactory<C> = Arc::new(move || -> LoadFuture<C> {
      let module = module.clone();
      Box::pin(async move { Ok(module) })
    });
    self.register_factory(path, factory);
  }

  /// Register a component as the default export of its resolved path.
  pub fn register(
    &mut self,
    template: &TemplateDirectory,
    kind: ComponentKind,
    component_id: &str,
    component: C,
  ) -> &mut Self {
    let path = self
      .resolver
      .module_path(template.as_str(), &kind, component_id);
    self.register_module(path, Module::with_default(component));
    self
  }

  pub fn len(&self) -> usize {
    self.factories.len()
  }

  pub fn is_empty(&self) -> bool {
    self.factories.is_empty()
  }
}

#[async_trait]
impl<C: Clone + Send + Sync + 'static> ModuleSource<C> for StaticRegistry<C> {
  fn known_paths(&self) -> &BTreeSet<String> {
    &self.known
  }

  async fn import(&self, path: &str) -> Result<Module<C>, ModuleError> {
    let factory = self
      .factories
      .get(path)
      .cloned()
      .ok_or_else(|| ModuleError::NotFound {
        path: path.to_string(),
      })?;
    factory().await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_register_and_import() {
    let mut registry = StaticRegistry::new(TemplateResolver::new());
    registry.register(
      &TemplateDirectory::default(),
      ComponentKind::FlowStep,
      "FormStep",
      "form",
    );

    assert!(
      registry
        .known_paths()
        .contains("/default/flowSteps/FormStep.tsx")
    );

    let module = registry
      .import("/default/flowSteps/FormStep.tsx")
      .await
      .unwrap();
    assert_eq!(module.default, Some("form"));
  }

  #[tokio::test]
  async fn test_import_unknown_path() {
    let registry: StaticRegistry<&str> = StaticRegistry::new(TemplateResolver::new());
    let result = registry.import("/default/flowSteps/Nope.tsx").await;
    assert!(matches!(result, Err(ModuleError::NotFound { .. })));
  }

  #[tokio::test]
  async fn test_failing_factory() {
    let mut registry: StaticRegistry<&str> = StaticRegistry::new(TemplateResolver::new());
    registry.register_factory(
      "/acme/widgets/Chart.tsx",
      Arc::new(|| -> LoadFuture<&'static str> {
        Box::pin(async {
          Err(ModuleError::Failed {
            path: "/acme/widgets/Chart.tsx".to_string(),
            message: "boom".to_string(),
          })
        })
      }),
    );

    let result = registry.import("/acme/widgets/Chart.tsx").await;
    assert!(matches!(result, Err(ModuleError::Failed { .. })));
  }
}
