//! Binary entry point for the graphload CLI.
#![forbid(unsafe_code)]

mod cli {
    pub mod config;
    pub mod ui;
}

use std::error::Error;
use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use graphload::cli::{
    run_load, run_plan, run_schema, run_script, CliError, LoadConfig, ScriptConfig, DEFAULT_SHELL,
};
use graphload::IngestOptions;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::config::{CliConfig, IngestOverrides, Profile};
use cli::ui::{Theme, Ui};

#[derive(Parser, Debug)]
#[command(
    name = "graphload",
    version,
    about = "Load partitioned Parquet property graphs into a graph database",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "GRAPHLOAD_CONFIG",
        value_name = "PATH",
        help = "CLI config file (default: <config dir>/graphload/cli.toml)"
    )]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Profile to use from the config file")]
    profile: Option<String>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(long, global = true, value_enum, default_value_t = Theme::Auto)]
    theme: Theme,

    #[arg(long, short, global = true, help = "Plain output without spinners")]
    quiet: bool,

    #[arg(long, short, global = true, help = "Log debug events to stderr")]
    verbose: bool,

    #[command(flatten)]
    overrides: OverrideArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct OverrideArgs {
    #[arg(long, global = true, help = "Attempts per statement")]
    max_attempts: Option<u32>,

    #[arg(long, global = true, help = "Pause between attempts (ms)")]
    backoff_ms: Option<u64>,

    #[arg(long, global = true, help = "Primary-key column of node tables")]
    primary_key: Option<String>,

    #[arg(long, global = true, help = "Column naming node tables")]
    node_discriminator: Option<String>,

    #[arg(long, global = true, help = "Column naming relationship tables")]
    edge_discriminator: Option<String>,
}

impl From<&OverrideArgs> for IngestOverrides {
    fn from(args: &OverrideArgs) -> Self {
        IngestOverrides {
            max_attempts: args.max_attempts,
            backoff_ms: args.backoff_ms,
            primary_key: args.primary_key.clone(),
            node_discriminator: args.node_discriminator.clone(),
            edge_discriminator: args.edge_discriminator.clone(),
            ..IngestOverrides::default()
        }
    }
}

#[derive(Args, Debug)]
struct LoadCmd {
    #[arg(value_name = "DATASET")]
    dataset: Option<PathBuf>,

    #[arg(long = "db", value_name = "PATH", help = "Target database")]
    database: Option<PathBuf>,

    #[arg(long, value_name = "PROGRAM", help = "Database shell (default: kuzu)")]
    shell: Option<PathBuf>,

    #[arg(
        long = "shell-arg",
        value_name = "ARG",
        action = ArgAction::Append,
        allow_hyphen_values = true,
        help = "Argument passed to the shell before the database (repeatable)"
    )]
    shell_args: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Print the tables discovered in a dataset")]
    Schema {
        #[arg(value_name = "DATASET")]
        dataset: Option<PathBuf>,
    },

    #[command(about = "Print the ordered statements that would be executed")]
    Plan {
        #[arg(value_name = "DATASET")]
        dataset: Option<PathBuf>,
    },

    #[command(about = "Write the plan as a statement script")]
    Script {
        #[arg(value_name = "DATASET")]
        dataset: Option<PathBuf>,

        #[arg(long, value_name = "FILE", required = true)]
        out: PathBuf,
    },

    #[command(about = "Create and bulk load every table through a database shell")]
    Load(LoadCmd),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = CliConfig::load(cli.config.clone())?;
    let profile = config.select_profile(cli.profile.as_deref())?;
    let mut options = config.ingest_options(profile);
    IngestOverrides::from(&cli.overrides).apply(&mut options);
    debug!(
        config = ?config.path(),
        profile = profile.map(|p| p.name.as_str()),
        "cli.options"
    );

    let ui = Ui::new(cli.theme, cli.quiet);
    match cli.command {
        Command::Schema { dataset } => {
            let dataset = resolve_dataset(dataset, profile)?;
            let tables = run_schema(&dataset, &options).map_err(into_boxed_error)?;
            emit(&cli.format, &tables, || ui.schema(&tables))?;
        }
        Command::Plan { dataset } => {
            let dataset = resolve_dataset(dataset, profile)?;
            let plan = run_plan(&dataset, &options).map_err(into_boxed_error)?;
            emit(&cli.format, &plan, || ui.plan(&plan))?;
        }
        Command::Script { dataset, out } => {
            let cfg = ScriptConfig {
                dataset: resolve_dataset(dataset, profile)?,
                out,
                options,
            };
            let summary = run_script(&cfg, &mut graphload::ingest::NoProgress)
                .map_err(into_boxed_error)?;
            emit(&cli.format, &summary, || {
                ui.done(format_args!(
                    "wrote {} statements to {}",
                    summary.statements,
                    summary.path.display()
                ))
            })?;
        }
        Command::Load(cmd) => {
            let cfg = build_load_config(cmd, profile, options)?;
            let mut progress = ui.load_progress(format!("loading {}", cfg.dataset.display()));
            let summary = run_load(&cfg, &mut progress).map_err(into_boxed_error)?;
            let elapsed = progress.finish();
            emit(&cli.format, &summary, || ui.summary(&summary, elapsed))?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "graphload=debug" } else { "graphload=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

fn resolve_dataset(arg: Option<PathBuf>, profile: Option<&Profile>) -> Result<PathBuf, CliError> {
    arg.or_else(|| profile.and_then(|p| p.dataset.clone()))
        .ok_or_else(|| CliError::Message("a DATASET path is required (argument or profile)".into()))
}

fn build_load_config(
    cmd: LoadCmd,
    profile: Option<&Profile>,
    options: IngestOptions,
) -> Result<LoadConfig, CliError> {
    let dataset = resolve_dataset(cmd.dataset, profile)?;
    let database = cmd
        .database
        .or_else(|| profile.and_then(|p| p.database.clone()))
        .ok_or_else(|| CliError::Message("--db is required for load (or set it in a profile)".into()))?;
    let shell = cmd
        .shell
        .or_else(|| profile.and_then(|p| p.shell.clone()))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SHELL));
    let shell_args = if cmd.shell_args.is_empty() {
        profile.map(|p| p.shell_args.clone()).unwrap_or_default()
    } else {
        cmd.shell_args
    };
    Ok(LoadConfig {
        dataset,
        database,
        shell,
        shell_args,
        options,
    })
}

fn into_boxed_error(err: CliError) -> Box<dyn Error> {
    Box::new(err)
}

fn emit<T, F>(format: &OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: FnOnce(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}
