// crates/query-lab-cli/src/main.rs
// ============================================================================
// Module: Query Lab CLI Entry Point
// Description: Command dispatcher for config validation and demo runs.
// Purpose: Run the query telemetry lab from the command line.
// Dependencies: clap, query-lab-config, query-lab-core, serde_json, thiserror, tokio
// ============================================================================

//! ## Overview
//! `query-lab config validate` checks a configuration file. `query-lab run`
//! seeds the demo database, runs the `orders-with-customers` scenario in its
//! N+1 and join variants, and prints the responses as JSON. Diagnostics go
//! to the configured sink, never to stdout.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use query_lab_cli::lab::Lab;
use query_lab_config::LabConfig;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "query-lab", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Seed the demo database and run both scenario variants.
    Run(RunCommand),
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a Query Lab configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Config file path (defaults to `QUERY_LAB_CONFIG` or `query-lab.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Config file path (defaults to `QUERY_LAB_CONFIG` or `query-lab.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Capture estimated execution plans for every command.
    #[arg(long, action = ArgAction::SetTrue)]
    plan: bool,
    /// Include the N most recent queries in the output.
    #[arg(long, value_name = "N")]
    recent: Option<usize>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Config {
            command,
        } => match command {
            ConfigCommand::Validate(command) => command_config_validate(&command),
        },
        Commands::Run(command) => command_run(&command).await,
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Loads and validates configuration.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = load_config(command.config.as_deref())?;
    write_stdout_line("config ok").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Seeds the demo database and prints both scenario responses.
async fn command_run(command: &RunCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let diagnostics = config
        .telemetry
        .diagnostics
        .open_sink()
        .map_err(|err| CliError::new(format!("failed to open diagnostics sink: {err}")))?;
    let lab = Lab::open(&config, diagnostics)
        .map_err(|err| CliError::new(format!("failed to open database: {err}")))?;
    lab.seed().await.map_err(|err| CliError::new(format!("failed to seed database: {err}")))?;
    let include_plan = command.plan || config.telemetry.capture_plans;
    let report = lab
        .run(include_plan, command.recent)
        .await
        .map_err(|err| CliError::new(format!("scenario failed: {err}")))?;
    let payload = serde_json::to_string_pretty(&report)
        .map_err(|err| CliError::new(format!("failed to encode report: {err}")))?;
    write_stdout_line(&payload).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads configuration, mapping failures to CLI errors.
fn load_config(path: Option<&std::path::Path>) -> CliResult<LabConfig> {
    LabConfig::load(path).map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
