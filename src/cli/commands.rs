use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::error::IngestError;
use crate::exec::{CommandConnection, ScriptConnection};
use crate::ingest::{discover, plan_dataset, IngestSummary, IngestionPlan, Ingestor, ProgressSink, TableSource};
use crate::options::IngestOptions;

/// Database shell used by `load` when none is configured.
pub const DEFAULT_SHELL: &str = "kuzu";

/// Configuration for writing a plan out as a script.
#[derive(Debug, Clone)]
pub struct ScriptConfig {
    /// Dataset root.
    pub dataset: PathBuf,
    /// Script file to create.
    pub out: PathBuf,
    /// Discovery and naming options.
    pub options: IngestOptions,
}

/// Configuration for loading a dataset through a database shell.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Dataset root.
    pub dataset: PathBuf,
    /// Database path handed to the shell.
    pub database: PathBuf,
    /// Shell program.
    pub shell: PathBuf,
    /// Arguments placed before the database path.
    pub shell_args: Vec<String>,
    /// Discovery, naming and retry options.
    pub options: IngestOptions,
}

/// Result of `script`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScriptSummary {
    /// Script written.
    pub path: PathBuf,
    /// Statements in the script, drops included.
    pub statements: usize,
    /// Counters of the dry run.
    pub ingest: IngestSummary,
}

/// Error type for command helpers.
#[derive(Error, Debug)]
pub enum CliError {
    /// Generic error message.
    #[error("{0}")]
    Message(String),
    /// IO error from file operations.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Discovery, planning or execution error.
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

impl From<&str> for CliError {
    fn from(value: &str) -> Self {
        CliError::Message(value.to_string())
    }
}

impl From<String> for CliError {
    fn from(value: String) -> Self {
        CliError::Message(value)
    }
}

fn require_dataset(dataset: &Path) -> Result<(), CliError> {
    if dataset.is_dir() {
        Ok(())
    } else {
        Err(CliError::Message(format!(
            "dataset {} is not a directory",
            dataset.display()
        )))
    }
}

/// Discovers the tables of a dataset.
pub fn run_schema(dataset: &Path, opts: &IngestOptions) -> Result<Vec<TableSource>, CliError> {
    require_dataset(dataset)?;
    Ok(discover(dataset, opts)?)
}

/// Builds the ingestion plan of a dataset.
pub fn run_plan(dataset: &Path, opts: &IngestOptions) -> Result<IngestionPlan, CliError> {
    require_dataset(dataset)?;
    Ok(plan_dataset(dataset, opts)?)
}

/// Writes the dataset's plan, drops first, as a `;`-terminated script.
pub fn run_script(cfg: &ScriptConfig, progress: &mut dyn ProgressSink) -> Result<ScriptSummary, CliError> {
    let plan = run_plan(&cfg.dataset, &cfg.options)?;
    if let Some(parent) = cfg.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(&cfg.out)?;
    let conn = ScriptConnection::new(BufWriter::new(file));
    let mut ingestor = Ingestor::new(conn, &cfg.options);
    let ingest = ingestor.execute(&plan, progress)?;
    let (conn, _) = ingestor.into_parts();
    let statements = conn.written();
    conn.into_inner()?;
    Ok(ScriptSummary {
        path: cfg.out.clone(),
        statements,
        ingest,
    })
}

/// Plans the dataset and executes it through the configured shell.
///
/// Creates the database's parent directory when missing; existing tables
/// are dropped by the plan's teardown.
pub fn run_load(cfg: &LoadConfig, progress: &mut dyn ProgressSink) -> Result<IngestSummary, CliError> {
    let plan = run_plan(&cfg.dataset, &cfg.options)?;
    if let Some(parent) = cfg.database.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let conn = CommandConnection::new(&cfg.shell, &cfg.database).with_args(cfg.shell_args.clone());
    let mut ingestor = Ingestor::new(conn, &cfg.options);
    Ok(ingestor.execute(&plan, progress)?)
}
