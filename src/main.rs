use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use flowdeck_component_registry::{ComponentLoader, ModuleSource};
use flowdeck_config::{ApplicationSettings, ComponentKind, ScenarioDef, TemplateDirectory, WorkspaceSettings};
use flowdeck_context::ContextStore;
use flowdeck_engine::{
  Advance, FlowView, FlowViewConfig, FlowViewState, SubmissionRouter, default_registry,
};
use flowdeck_scenario::Scenario;
use flowdeck_steps::{HttpLlmClient, LlmConfig, StaticAuth};
use flowdeck_store::FsStore;

/// Flowdeck - step-by-step scenario flows with tenant-overridable components
#[derive(Parser)]
#[command(name = "flowdeck")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.flowdeck)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Module extension used when resolving component paths
  #[arg(long, global = true)]
  extension: Option<String>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a scenario to completion
  Run {
    /// Path to the scenario file (JSON)
    scenario_file: PathBuf,

    /// JSON object of step inputs keyed by node id (default: stdin)
    #[arg(long)]
    inputs: Option<PathBuf>,

    /// Workspace the run belongs to
    #[arg(long, default_value = "local")]
    workspace_id: String,

    /// Template directory configured on the workspace
    #[arg(long)]
    template: Option<String>,

    /// Template directory configured on the owning application
    #[arg(long)]
    application_template: Option<String>,

    /// Record id to edit in place instead of creating new records
    #[arg(long)]
    edit_id: Option<String>,

    /// Chat completion endpoint used by LLM query steps
    #[arg(long, env = "FLOWDECK_LLM_ENDPOINT", default_value = "http://localhost:8080/v1/chat")]
    llm_endpoint: String,

    /// Model sent with chat requests
    #[arg(long, env = "FLOWDECK_LLM_MODEL")]
    llm_model: Option<String>,

    /// Bearer token for the chat endpoint
    #[arg(long, env = "FLOWDECK_LLM_TOKEN", hide_env_values = true)]
    llm_token: Option<String>,
  },

  /// Show the module paths tried for a component
  Resolve {
    /// Template directory to resolve against
    template: String,

    /// Component kind (flowStep, layout, widget, ...)
    kind: String,

    /// Component id, e.g. FormStep
    component_id: String,
  },

  /// List every built-in module path
  Components,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();
  let config = FlowViewConfig {
    extension: cli.extension,
    ..FlowViewConfig::default()
  };

  match cli.command {
    Some(Commands::Run {
      scenario_file,
      inputs,
      workspace_id,
      template,
      application_template,
      edit_id,
      llm_endpoint,
      llm_model,
      llm_token,
    }) => {
      let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::home_dir()
          .context("could not determine home directory")?
          .join(".flowdeck"),
      };
      let run = RunArgs {
        scenario_file,
        inputs,
        data_dir,
        workspace: WorkspaceSettings {
          id: workspace_id,
          application_id: None,
          template_directory: template,
        },
        application: application_template.map(|dir| ApplicationSettings {
          id: "cli".to_string(),
          template_directory: Some(dir),
        }),
        edit_id,
        llm: LlmConfig {
          endpoint: llm_endpoint,
          model: llm_model,
        },
        llm_token,
      };
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(async { run_scenario(run, config).await })?;
    }
    Some(Commands::Resolve {
      template,
      kind,
      component_id,
    }) => {
      let template = TemplateDirectory::from(template);
      let paths = config
        .resolver()
        .resolve_paths(&template, &ComponentKind::from(kind), &component_id);
      println!("{}", paths.main_path);
      if !template.is_default() {
        println!("{}", paths.default_path);
      }
    }
    Some(Commands::Components) => {
      let registry = default_registry(
        config.resolver(),
        Arc::new(HttpLlmClient::new(LlmConfig {
          endpoint: String::new(),
          model: None,
        })),
        Arc::new(StaticAuth::new(None, None)),
      );
      for path in registry.known_paths() {
        println!("{}", path);
      }
    }
    None => {
      println!("flowdeck - use --help to see available commands");
    }
  }

  Ok(())
}

struct RunArgs {
  scenario_file: PathBuf,
  inputs: Option<PathBuf>,
  data_dir: PathBuf,
  workspace: WorkspaceSettings,
  application: Option<ApplicationSettings>,
  edit_id: Option<String>,
  llm: LlmConfig,
  llm_token: Option<String>,
}

async fn run_scenario(args: RunArgs, config: FlowViewConfig) -> Result<()> {
  let content = tokio::fs::read_to_string(&args.scenario_file)
    .await
    .with_context(|| format!("failed to read scenario file: {}", args.scenario_file.display()))?;

  let def: ScenarioDef = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse scenario file: {}", args.scenario_file.display()))?;
  let scenario = Scenario::load(def).context("invalid scenario")?;
  info!(scenario_id = %scenario.id, nodes = scenario.len(), "loaded scenario");

  let inputs = match &args.inputs {
    Some(path) => {
      let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read inputs file: {}", path.display()))?;
      parse_inputs(&content)?
    }
    None => read_inputs_from_stdin()?,
  };

  let store = FsStore::open(args.data_dir.join("collections"))
    .await
    .context("failed to open collection store")?;
  let registry = default_registry(
    config.resolver(),
    Arc::new(HttpLlmClient::new(args.llm)),
    Arc::new(StaticAuth::new(args.llm_token, Some(args.workspace.id.clone()))),
  );
  let loader = ComponentLoader::new(Arc::new(registry), config.resolver());
  let context = ContextStore::new();
  let router = SubmissionRouter::new(Arc::new(store), context.clone());

  let mut view = FlowView::new(loader, router, config);
  view.set_edit_id(args.edit_id);

  let cancel = CancellationToken::new();
  let ctrl_c = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("interrupted, cancelling running step");
      ctrl_c.cancel();
    }
  });

  let mut state = view
    .open(&args.workspace, args.application.as_ref(), scenario)
    .await;

  loop {
    let ready = match state {
      FlowViewState::Completed { scenario_id } => {
        info!(scenario_id = %scenario_id, "scenario completed");
        break;
      }
      FlowViewState::Ready(ready) => ready,
      other => bail!("flow cannot continue: {:?}", other),
    };

    let input = inputs
      .get(&ready.node_id)
      .cloned()
      .unwrap_or_else(|| Value::Object(Map::new()));
    debug!(node_id = %ready.node_id, auto_start = ready.auto_start, "running node");

    let advance = view
      .run_step(input, &cancel)
      .await
      .with_context(|| format!("node '{}' failed", ready.node_id))?;
    if let Advance::Moved { index } = advance {
      debug!(index, "advanced");
    }
    state = view.state();
  }

  println!("{}", serde_json::to_string_pretty(&context.snapshot())?);

  Ok(())
}

fn read_inputs_from_stdin() -> Result<Map<String, Value>> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    return Ok(Map::new());
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read inputs from stdin")?;
  parse_inputs(&input)
}

fn parse_inputs(input: &str) -> Result<Map<String, Value>> {
  if input.trim().is_empty() {
    return Ok(Map::new());
  }
  match serde_json::from_str::<Value>(input).context("failed to parse inputs JSON")? {
    Value::Object(inputs) => Ok(inputs),
    _ => bail!("inputs must be a JSON object keyed by node id"),
  }
}
