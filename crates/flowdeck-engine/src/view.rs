use std::sync::Arc;

use flowdeck_component_registry::{
  ComponentLoader, ComponentSlot, LoadError, LoadRequest, TemplateResolver,
};
use flowdeck_config::{
  ApplicationSettings, ComponentKind, TemplateDirectory, WorkspaceSettings,
  resolve_template_directory,
};
use flowdeck_scenario::{Scenario, StepConfig};
use flowdeck_steps::{StepError, StepExecutionState, StepInput, StepRunner};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::component::{Component, FLOW_LAYOUT, LayoutFrame};
use crate::error::FlowError;
use crate::events::{FlowEvent, FlowNotifier, NoopNotifier};
use crate::router::SubmissionRouter;
use crate::session::{Advance, FlowSession};

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowViewConfig {
  #[serde(default = "default_layout_id")]
  pub layout_id: String,
  /// Module extension override for path resolution.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub extension: Option<String>,
}

fn default_layout_id() -> String {
  FLOW_LAYOUT.to_string()
}

impl Default for FlowViewConfig {
  fn default() -> Self {
    Self {
      layout_id: default_layout_id(),
      extension: None,
    }
  }
}

impl FlowViewConfig {
  pub fn resolver(&self) -> TemplateResolver {
    match &self.extension {
      Some(extension) => TemplateResolver::with_extension(extension.clone()),
      None => TemplateResolver::new(),
    }
  }
}

/// The mounted step, framed by its layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyView {
  pub node_id: String,
  pub component_id: String,
  pub is_first: bool,
  pub is_last: bool,
  /// The step can run without user input.
  pub auto_start: bool,
  pub step_state: StepExecutionState,
  /// Step-local error from the last attempt.
  pub step_error: Option<String>,
  /// Layout output.
  pub frame: Value,
}

/// What the view shows. Variants are checked in declaration order; each
/// failure mode stays distinguishable.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowViewState {
  WorkspaceMissing,
  Completed {
    scenario_id: String,
  },
  NodeMissing {
    index: usize,
  },
  LayoutMissing {
    template: TemplateDirectory,
    layout_id: String,
    error: Option<LoadError>,
  },
  ComponentMissing {
    component_id: String,
    node_id: String,
    error: Option<LoadError>,
  },
  /// An internal failure while running the step.
  Failed {
    node_id: String,
    message: String,
  },
  Ready(ReadyView),
}

/// Composes layout, step and widget for the current node of an open
/// scenario, and routes execution, submission and navigation.
pub struct FlowView {
  loader: ComponentLoader<Component>,
  router: SubmissionRouter,
  runner: StepRunner,
  config: FlowViewConfig,
  notifier: Arc<dyn FlowNotifier>,
  template: TemplateDirectory,
  session: Option<FlowSession>,
  edit_id: Option<String>,
  layout: ComponentSlot<Component>,
  step: ComponentSlot<Component>,
  widget: ComponentSlot<Component>,
  failure: Option<(String, String)>,
}

impl FlowView {
  pub fn new(
    loader: ComponentLoader<Component>,
    router: SubmissionRouter,
    config: FlowViewConfig,
  ) -> Self {
    Self {
      loader,
      router,
      runner: StepRunner::new(),
      config,
      notifier: Arc::new(NoopNotifier),
      template: TemplateDirectory::default(),
      session: None,
      edit_id: None,
      layout: ComponentSlot::new(),
      step: ComponentSlot::new(),
      widget: ComponentSlot::new(),
      failure: None,
    }
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn FlowNotifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn session(&self) -> Option<&FlowSession> {
    self.session.as_ref()
  }

  pub fn template(&self) -> &TemplateDirectory {
    &self.template
  }

  /// Record being edited in place, if any.
  pub fn set_edit_id(&mut self, edit_id: Option<String>) {
    self.edit_id = edit_id;
  }

  /// Open `scenario` in a workspace and load its first node.
  #[instrument(name = "flow_open", skip_all, fields(workspace_id = %workspace.id, scenario_id = %scenario.id))]
  pub async fn open(
    &mut self,
    workspace: &WorkspaceSettings,
    application: Option<&ApplicationSettings>,
    scenario: Scenario,
  ) -> FlowViewState {
    let context = self.router.context().clone();
    context.set_active_workspace(workspace.id.clone());
    self.template = resolve_template_directory(Some(workspace), application);
    info!(template = %self.template, nodes = scenario.len(), "scenario opened");

    self.notifier.notify(FlowEvent::ScenarioStarted {
      scenario_id: scenario.id.clone(),
      workspace_id: workspace.id.clone(),
    });
    self.session = Some(FlowSession::new(scenario, context).with_notifier(self.notifier.clone()));
    self.failure = None;
    self.refresh().await
  }

  /// Close the open scenario.
  pub fn close(&mut self) {
    self.session = None;
    self.failure = None;
    self.layout.clear();
    self.step.clear();
    self.widget.clear();
  }

  /// Bring the component slots in line with the current node and return
  /// the resulting state.
  pub async fn refresh(&self) -> FlowViewState {
    let Some(session) = &self.session else {
      self.layout.clear();
      self.step.clear();
      self.widget.clear();
      return self.state();
    };

    let layout = LoadRequest::new(
      ComponentKind::Layout,
      self.config.layout_id.clone(),
      self.template.clone(),
    );
    let node = session.current_node().cloned();
    self.load_slot(&self.layout, layout).await;

    match node {
      Some(node) => {
        let step = LoadRequest::new(
          ComponentKind::FlowStep,
          node.component_id.clone(),
          self.template.clone(),
        );
        self.load_slot(&self.step, step).await;

        match &node.step {
          StepConfig::Widget(attrs) => {
            let widget_id = attrs.widget_id.clone().unwrap_or_default();
            let widget = LoadRequest::new(ComponentKind::Widget, widget_id, self.template.clone());
            self.load_slot(&self.widget, widget).await;
          }
          _ => self.widget.clear(),
        }
      }
      None => {
        self.step.clear();
        self.widget.clear();
      }
    }

    self.state()
  }

  async fn load_slot(&self, slot: &ComponentSlot<Component>, request: LoadRequest) {
    if slot.request().as_ref() == Some(&request) {
      return;
    }
    slot.load(&self.loader, request.clone()).await;
    if let Some(error) = slot.snapshot().error {
      self.notifier.notify(FlowEvent::ComponentLoadFailed {
        component_id: request.component_id,
        kind: request.kind.to_string(),
        error: error.to_string(),
      });
    }
  }

  /// Current state, from the slots as they are.
  pub fn state(&self) -> FlowViewState {
    let Some(session) = &self.session else {
      return FlowViewState::WorkspaceMissing;
    };
    if session.is_complete() {
      return FlowViewState::Completed {
        scenario_id: session.scenario().id.clone(),
      };
    }
    let Some(node) = session.current_node() else {
      return FlowViewState::NodeMissing {
        index: session.cursor().index(),
      };
    };

    let layout = self.layout.snapshot();
    let Some(layout_component) = layout.component.as_ref().and_then(Component::as_layout) else {
      return FlowViewState::LayoutMissing {
        template: self.template.clone(),
        layout_id: self.config.layout_id.clone(),
        error: layout.error,
      };
    };

    let step = self.step.snapshot();
    let Some(step_component) = step.component.as_ref().and_then(Component::as_step) else {
      return missing(&node.component_id, &node.id, step.error);
    };

    if let StepConfig::Widget(attrs) = &node.step {
      let widget = self.widget.snapshot();
      if widget.component.as_ref().and_then(Component::as_widget).is_none() {
        return missing(
          attrs.widget_id.as_deref().unwrap_or_default(),
          &node.id,
          widget.error,
        );
      }
    }

    if let Some((node_id, message)) = &self.failure
      && node_id == &node.id
    {
      return FlowViewState::Failed {
        node_id: node_id.clone(),
        message: message.clone(),
      };
    }

    let cursor = session.cursor();
    let frame = LayoutFrame {
      scenario_id: session.scenario().id.clone(),
      node_id: node.id.clone(),
      label: node.label.clone(),
      component_id: node.component_id.clone(),
      position: cursor.index(),
      total: cursor.len(),
      is_first: session.is_first_node(),
      is_last: session.is_last_node(),
      context: session.context().snapshot(),
    };
    let run = session.run(&node.id);

    FlowViewState::Ready(ReadyView {
      node_id: node.id.clone(),
      component_id: node.component_id.clone(),
      is_first: frame.is_first,
      is_last: frame.is_last,
      auto_start: step_component.auto_start(node),
      step_state: run.map(|r| r.state).unwrap_or_default(),
      step_error: run.and_then(|r| r.error.clone()),
      frame: layout_component.compose(&frame),
    })
  }

  /// Run the current node's step with `user_input`. The output is returned
  /// but not submitted.
  #[instrument(name = "flow_execute", skip_all)]
  pub async fn execute(
    &mut self,
    user_input: Value,
    cancel: &CancellationToken,
  ) -> Result<Value, FlowError> {
    let session = self.session.as_mut().ok_or(FlowError::WorkspaceMissing)?;
    let node = session
      .current_node()
      .cloned()
      .ok_or(FlowError::NodeMissing {
        index: session.cursor().index(),
      })?;
    let scenario_id = session.scenario().id.clone();

    let step = self
      .step
      .snapshot()
      .component
      .and_then(|c| c.as_step().cloned())
      .ok_or_else(|| FlowError::ComponentNotReady {
        node_id: node.id.clone(),
      })?;
    let widget = self
      .widget
      .snapshot()
      .component
      .and_then(|c| c.as_widget().cloned());

    let initial = match &self.edit_id {
      Some(edit_id) => self
        .router
        .load_existing(&node, edit_id)
        .await?
        .map(|record| record.to_value()),
      None => None,
    };

    let input = StepInput::new(node.clone(), session.context().clone())
      .with_user_input(user_input)
      .with_initial(initial)
      .with_widget(widget)
      .with_system_message(session.scenario().system_message.clone());

    let run = session.run_mut(&node.id);
    self.notifier.notify(FlowEvent::StepStarted {
      scenario_id: scenario_id.clone(),
      node_id: node.id.clone(),
      attempt: run.attempts + 1,
    });

    match self.runner.run(step.as_ref(), run, &input, cancel).await {
      Ok(output) => {
        self.failure = None;
        self.notifier.notify(FlowEvent::StepCompleted {
          scenario_id,
          node_id: node.id,
          data: output.clone(),
        });
        Ok(output)
      }
      Err(e) => {
        if let StepError::Panicked { .. } = &e {
          error!(node_id = %node.id, error = %e, "step crashed");
          self.failure = Some((node.id.clone(), e.to_string()));
        }
        self.notifier.notify(FlowEvent::StepFailed {
          scenario_id,
          node_id: node.id,
          error: e.to_string(),
        });
        Err(e.into())
      }
    }
  }

  /// Route `output` for the current node and advance.
  ///
  /// A failed submission leaves the flow where it is and marks the step
  /// failed, so the user can run it again.
  #[instrument(name = "flow_submit", skip_all)]
  pub async fn submit(&mut self, output: Value) -> Result<Advance, FlowError> {
    let session = self.session.as_mut().ok_or(FlowError::WorkspaceMissing)?;
    let node = session
      .current_node()
      .cloned()
      .ok_or(FlowError::NodeMissing {
        index: session.cursor().index(),
      })?;

    let submission = match self
      .router
      .submit(&node, output.clone(), self.edit_id.as_deref())
      .await
    {
      Ok(submission) => submission,
      Err(e) => {
        warn!(node_id = %node.id, error = %e, "submission failed");
        session.run_mut(&node.id).fail(e.to_string());
        self.notifier.notify(FlowEvent::StepFailed {
          scenario_id: session.scenario().id.clone(),
          node_id: node.id,
          error: e.to_string(),
        });
        return Err(e.into());
      }
    };
    self.notifier.notify(FlowEvent::StepSubmitted {
      scenario_id: session.scenario().id.clone(),
      node_id: node.id.clone(),
      target: submission.target(),
    });

    let advance = session.advance(output)?;
    self.refresh().await;
    Ok(advance)
  }

  /// Execute the current step, then submit its output.
  pub async fn run_step(
    &mut self,
    user_input: Value,
    cancel: &CancellationToken,
  ) -> Result<Advance, FlowError> {
    let output = self.execute(user_input, cancel).await?;
    self.submit(output).await
  }

  /// Go back one node. At the first node nothing changes.
  pub async fn previous(&mut self) -> FlowViewState {
    if let Some(session) = self.session.as_mut() {
      session.go_back();
    }
    self.refresh().await
  }

  pub async fn jump_to(&mut self, node_id: &str) -> Result<FlowViewState, FlowError> {
    let session = self.session.as_mut().ok_or(FlowError::WorkspaceMissing)?;
    session.jump_to(node_id)?;
    Ok(self.refresh().await)
  }

  /// Allow the current step to run again.
  pub fn reset_current_step(&mut self) {
    if let Some(session) = self.session.as_mut()
      && let Some(node_id) = session.current_node().map(|n| n.id.clone())
    {
      session.reset_step(&node_id);
      if self
        .failure
        .as_ref()
        .is_some_and(|(failed, _)| failed == &node_id)
      {
        self.failure = None;
      }
    }
  }
}

fn missing(component_id: &str, node_id: &str, error: Option<LoadError>) -> FlowViewState {
  FlowViewState::ComponentMissing {
    component_id: component_id.to_string(),
    node_id: node_id.to_string(),
    error,
  }
}
