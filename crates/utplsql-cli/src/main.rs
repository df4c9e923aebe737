//! utPLSQL Runner CLI
//!
//! The `utplsql` command inspects run configurations without a database.
//!
//! ## Commands
//!
//! - `plan`: Print the mapped files and report sinks a run would use
//! - `check`: Validate a configuration by resolving both mapping roles
//! - `dry-run`: Execute the full run lifecycle against an in-memory session

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};

use utplsql_core::{RunConfig, RunCoordinator, RunPlan, SinkTarget};
use utplsql_session::fakes::{MemoryConnector, MemorySession};
use utplsql_session::{FrameworkVersion, MappingOptions};

#[derive(Parser)]
#[command(name = "utplsql")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "utPLSQL test-suite runner", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what a run would map and where each report would be written
    Plan {
        #[command(flatten)]
        source: ConfigSource,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Validate a configuration
    Check {
        #[command(flatten)]
        source: ConfigSource,
    },

    /// Run the whole lifecycle against an in-memory session
    DryRun {
        #[command(flatten)]
        source: ConfigSource,

        /// Framework version the simulated session reports
        #[arg(long, default_value = "3.1.10")]
        framework_version: String,
    },
}

#[derive(clap::Args)]
struct ConfigSource {
    /// Run configuration file (TOML)
    #[arg(short, long, env = "UTPLSQL_CONFIG")]
    config: Option<PathBuf>,

    /// Override the project root from the configuration
    #[arg(long)]
    project_root: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    utplsql_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Plan { source, format } => cmd_plan(&source, format),
        Commands::Check { source } => cmd_check(&source),
        Commands::DryRun {
            source,
            framework_version,
        } => cmd_dry_run(&source, &framework_version).await,
    }
}

fn load_config(source: &ConfigSource) -> Result<RunConfig> {
    let mut config = match &source.config {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => RunConfig::default(),
    };
    if let Some(root) = &source.project_root {
        config = config.with_project_root(root);
    }
    Ok(config)
}

/// Print the resolved run plan
fn cmd_plan(source: &ConfigSource, format: OutputFormat) -> Result<()> {
    let config = load_config(source)?;
    let plan = RunPlan::resolve(&config).context("Failed to resolve run plan")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Text => print!("{}", render_plan(&plan)),
    }
    Ok(())
}

/// Validate configuration and report the first error
fn cmd_check(source: &ConfigSource) -> Result<()> {
    let config = load_config(source)?;
    let plan = RunPlan::resolve(&config).context("Configuration check failed")?;
    println!(
        "Configuration OK: {} source file(s), {} test file(s), {} report(s)",
        plan.sources.file_paths.len(),
        plan.tests.file_paths.len(),
        plan.reporters.len()
    );
    Ok(())
}

/// Run the coordinator against a simulated session
async fn cmd_dry_run(source: &ConfigSource, framework_version: &str) -> Result<()> {
    let config = load_config(source)?;
    let version: FrameworkVersion = framework_version
        .parse()
        .with_context(|| format!("Invalid framework version {framework_version}"))?;

    let connector = MemoryConnector::new(MemorySession::new().with_version(version));
    let report = RunCoordinator::new(config).run(&connector).await;
    info!(
        run_id = %report.run_id,
        state = %report.final_state(),
        drained = report.drained.len(),
        "dry run finished"
    );

    let report = report.into_result().context("Dry run failed")?;
    if !report.drain_errors.is_empty() {
        let errors: Vec<String> = report.drain_errors.iter().map(ToString::to_string).collect();
        bail!(
            "Dry run finished but {} report(s) were not written:\n  {}",
            errors.len(),
            errors.join("\n  ")
        );
    }
    println!("Dry run completed");
    Ok(())
}

fn render_plan(plan: &RunPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Project root: {}", plan.project_root.display());
    let _ = writeln!(out, "Target dir:   {}", plan.target_dir.display());
    if !plan.paths.is_empty() {
        let _ = writeln!(out, "Paths:        {}", plan.paths.join(", "));
    }
    if !plan.tags.is_empty() {
        let _ = writeln!(out, "Tags:         {}", plan.tags.join(", "));
    }
    render_mapping(&mut out, "Sources", &plan.sources);
    render_mapping(&mut out, "Tests", &plan.tests);

    let _ = writeln!(out, "Reporters:");
    for report in &plan.reporters {
        let sinks: Vec<String> = report.sinks.iter().map(render_sink).collect();
        let marker = if report.core { "" } else { " (custom)" };
        let _ = writeln!(out, "  {}{} -> {}", report.name, marker, sinks.join(", "));
    }
    out
}

fn render_mapping(out: &mut String, title: &str, options: &MappingOptions) {
    let _ = writeln!(out, "{} ({} file(s)):", title, options.file_paths.len());
    if let Some(owner) = &options.object_owner {
        let _ = writeln!(out, "  owner: {}", owner);
    }
    if let Some(regex) = &options.regex_pattern {
        let _ = writeln!(out, "  regex: {}", regex);
    }
    for file in &options.file_paths {
        let _ = writeln!(out, "  {}", file);
    }
}

fn render_sink(target: &SinkTarget) -> String {
    match target {
        SinkTarget::Console => "Console".to_string(),
        SinkTarget::File { path } => path.display().to_string(),
    }
}
