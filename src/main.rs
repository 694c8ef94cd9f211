use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use petriflow_config::WorkflowDef;
use petriflow_engine::{Engine, EngineConfig, resolve};
use petriflow_net::{Workflow, WorkflowId};
use petriflow_store::SqliteStore;
use petriflow_verifier::{Violations, verify};

/// Petriflow - soundness checks and cloning for Petri-net workflows
#[derive(Parser)]
#[command(name = "petriflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.petriflow)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Only create instances of verified workflows
  #[arg(long, global = true)]
  strict: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Verify a workflow file without storing it
  Check {
    /// Path to the workflow definition (JSON)
    workflow_file: PathBuf,
  },

  /// Store a workflow file and verify it
  Import {
    /// Path to the workflow definition (JSON)
    workflow_file: PathBuf,
  },

  /// List stored workflows
  List,

  /// Show a stored workflow and its verification status
  Status { workflow_id: WorkflowId },

  /// Re-verify a stored workflow and record the outcome
  Verify { workflow_id: WorkflowId },

  /// Mark a stored workflow as unverified
  Reset { workflow_id: WorkflowId },

  /// Clone a stored workflow into a new one
  Fork {
    workflow_id: WorkflowId,

    /// Name for the copy (default: the source's name)
    #[arg(long)]
    name: Option<String>,
  },

  /// Create an instance of a stored workflow; attributes are read as a JSON
  /// object from stdin
  Instance { workflow_id: WorkflowId },

  /// Delete a stored workflow with its instances
  Delete { workflow_id: WorkflowId },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  let Some(command) = cli.command else {
    println!("petriflow - use --help to see available commands");
    return Ok(());
  };

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".petriflow"),
  };
  let config = EngineConfig {
    strict_mode: cli.strict,
  };

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run(command, data_dir, config).await })
}

async fn run(command: Commands, data_dir: PathBuf, config: EngineConfig) -> Result<()> {
  match command {
    Commands::Check { workflow_file } => {
      let workflow = read_workflow(&workflow_file).await?;
      let mut violations = Violations::new();
      let sound = verify(&workflow, &mut violations);
      report(&workflow, sound, &violations);
      print_json(json!({ "sound": sound, "violations": violations }))
    }
    Commands::Import { workflow_file } => {
      let engine = open_engine(&data_dir, config).await?;
      let mut workflow = read_workflow(&workflow_file).await?;
      engine
        .import(&workflow)
        .await
        .context("failed to store workflow")?;

      let mut violations = Violations::new();
      let sound = engine
        .verify_and_persist(&mut workflow, &mut violations)
        .await
        .context("failed to record verification")?;
      report(&workflow, sound, &violations);
      print_json(json!({
        "workflow_id": workflow.id,
        "sound": sound,
        "violations": violations,
      }))
    }
    Commands::List => {
      let engine = open_engine(&data_dir, config).await?;
      let records = engine.list().await.context("failed to list workflows")?;
      for record in &records {
        eprintln!("{}  {}  {}", record.workflow_id, record.status(), record.name);
      }
      print_json(json!(records))
    }
    Commands::Status { workflow_id } => {
      let engine = open_engine(&data_dir, config).await?;
      let workflow = load(&engine, workflow_id).await?;
      print_json(json!({
        "workflow_id": workflow.id,
        "name": workflow.name,
        "pipeline_id": workflow.pipeline_id,
        "status": workflow.status().as_str(),
        "verified_at": workflow.verified_at,
        "places": workflow.places().len(),
        "transitions": workflow.transitions().len(),
        "arcs": workflow.arcs().len(),
      }))
    }
    Commands::Verify { workflow_id } => {
      let engine = open_engine(&data_dir, config).await?;
      let mut workflow = load(&engine, workflow_id).await?;
      let mut violations = Violations::new();
      let sound = engine
        .verify_and_persist(&mut workflow, &mut violations)
        .await
        .context("failed to record verification")?;
      report(&workflow, sound, &violations);
      print_json(json!({
        "workflow_id": workflow.id,
        "sound": sound,
        "violations": violations,
      }))
    }
    Commands::Reset { workflow_id } => {
      let engine = open_engine(&data_dir, config).await?;
      let mut workflow = load(&engine, workflow_id).await?;
      engine
        .reset_verification(&mut workflow)
        .await
        .context("failed to reset verification")?;
      eprintln!("Workflow {} is {}", workflow.id, workflow.status());
      print_json(json!({
        "workflow_id": workflow.id,
        "status": workflow.status().as_str(),
      }))
    }
    Commands::Fork { workflow_id, name } => {
      let engine = open_engine(&data_dir, config).await?;
      let source = load(&engine, workflow_id).await?;
      let forked = engine
        .fork_with(&source, |copy| {
          if let Some(name) = name {
            copy.name = name;
          }
        })
        .await
        .context("failed to fork workflow")?;

      eprintln!("Forked {} into {}", source.id, forked.workflow.id);
      report(&forked.workflow, forked.workflow.verified, &forked.violations);
      print_json(json!({
        "source_id": source.id,
        "workflow_id": forked.workflow.id,
        "sound": forked.workflow.verified,
        "violations": forked.violations,
      }))
    }
    Commands::Instance { workflow_id } => {
      let engine = open_engine(&data_dir, config).await?;
      let workflow = load(&engine, workflow_id).await?;
      let attributes = read_attributes_from_stdin()?;
      let instance = engine
        .build_instance(&workflow, attributes)
        .context("failed to build instance")?;
      engine
        .create_instance(&instance)
        .await
        .context("failed to save instance")?;

      eprintln!("Created instance {}", instance.id);
      print_json(json!(instance))
    }
    Commands::Delete { workflow_id } => {
      let engine = open_engine(&data_dir, config).await?;
      engine
        .delete(workflow_id)
        .await
        .with_context(|| format!("failed to delete workflow {}", workflow_id))?;
      eprintln!("Deleted workflow {}", workflow_id);
      Ok(())
    }
  }
}

async fn open_engine(data_dir: &Path, config: EngineConfig) -> Result<Engine<SqliteStore>> {
  tokio::fs::create_dir_all(data_dir)
    .await
    .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

  let db_path = data_dir.join("petriflow.db");
  let url = format!("sqlite://{}", db_path.display());
  let store = SqliteStore::connect(&url)
    .await
    .with_context(|| format!("failed to open database: {}", db_path.display()))?;
  store
    .migrate()
    .await
    .context("failed to migrate database")?;

  Ok(Engine::new(store, config))
}

async fn load(engine: &Engine<SqliteStore>, workflow_id: WorkflowId) -> Result<Workflow> {
  engine
    .load(workflow_id)
    .await
    .with_context(|| format!("failed to load workflow {}", workflow_id))
}

async fn read_workflow(workflow_file: &Path) -> Result<Workflow> {
  let content = tokio::fs::read_to_string(workflow_file)
    .await
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;

  let def: WorkflowDef = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))?;

  eprintln!("Loaded workflow: {}", def.name);

  resolve(&def).with_context(|| format!("failed to resolve workflow: {}", def.name))
}

fn report(workflow: &Workflow, sound: bool, violations: &Violations) {
  if sound {
    eprintln!("Workflow {} is sound", workflow.name);
  } else {
    eprintln!(
      "Workflow {} has {} violation(s):\n{}",
      workflow.name,
      violations.len(),
      violations
    );
  }
}

fn print_json(value: serde_json::Value) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(&value)?);
  Ok(())
}

fn read_attributes_from_stdin() -> Result<serde_json::Map<String, serde_json::Value>> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    // No stdin pipe, no attributes
    return Ok(serde_json::Map::new());
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read attributes from stdin")?;

  if input.trim().is_empty() {
    return Ok(serde_json::Map::new());
  }

  match serde_json::from_str(&input).context("failed to parse attributes JSON from stdin")? {
    serde_json::Value::Object(map) => Ok(map),
    other => bail!("attributes must be a JSON object, got: {}", other),
  }
}
