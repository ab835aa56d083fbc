// crates/query-lab-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for query-lab-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::fs;
use std::path::PathBuf;

use query_lab_config::ConfigError;
use query_lab_config::LabConfig;
use tempfile::TempDir;

/// Result type used by config tests.
pub type TestResult = Result<(), String>;

/// Parses a TOML string into a `LabConfig` without validation.
pub fn config_from_toml(toml_str: &str) -> Result<LabConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns a minimal config with all defaults applied.
pub fn minimal_config() -> Result<LabConfig, toml::de::Error> {
    config_from_toml("")
}

/// Writes `content` to `query-lab.toml` in a fresh temp dir.
pub fn write_config(content: &[u8]) -> Result<(TempDir, PathBuf), String> {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("query-lab.toml");
    fs::write(&path, content).map_err(|err| err.to_string())?;
    Ok((dir, path))
}

/// Asserts that `result` failed with a message containing `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
