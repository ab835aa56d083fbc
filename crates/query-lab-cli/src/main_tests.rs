// crates/query-lab-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Tests
// Description: Unit tests for argument parsing and config-driven commands.
// Purpose: Ensure flags map to commands and config failures surface as errors.
// Dependencies: clap, tempfile
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;

use clap::CommandFactory;
use clap::Parser;

use super::Cli;
use super::Commands;
use super::ConfigCommand;
use super::ConfigValidateCommand;
use super::command_config_validate;

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn run_parses_plan_and_recent() {
    let cli = Cli::try_parse_from(["query-lab", "run", "--plan", "--recent", "5"]).unwrap();
    let Commands::Run(command) = cli.command else {
        panic!("expected run command");
    };
    assert!(command.plan);
    assert_eq!(command.recent, Some(5));
    assert!(command.config.is_none());
}

#[test]
fn run_defaults_leave_plan_off() {
    let cli = Cli::try_parse_from(["query-lab", "run"]).unwrap();
    let Commands::Run(command) = cli.command else {
        panic!("expected run command");
    };
    assert!(!command.plan);
    assert_eq!(command.recent, None);
}

#[test]
fn config_validate_accepts_path() {
    let cli =
        Cli::try_parse_from(["query-lab", "config", "validate", "--config", "lab.toml"]).unwrap();
    let Commands::Config {
        command: ConfigCommand::Validate(command),
    } = cli.command
    else {
        panic!("expected config validate command");
    };
    assert_eq!(command.config.unwrap().to_string_lossy(), "lab.toml");
}

#[test]
fn recent_rejects_non_numbers() {
    assert!(Cli::try_parse_from(["query-lab", "run", "--recent", "many"]).is_err());
}

#[test]
fn config_validate_reports_invalid_files() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("query-lab.toml");
    fs::write(&path, "[telemetry]\nrecent_capacity = 0\n").unwrap();
    let error = command_config_validate(&ConfigValidateCommand {
        config: Some(path),
    })
    .unwrap_err();
    assert!(error.to_string().contains("recent_capacity"));
}
