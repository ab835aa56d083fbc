// crates/query-lab-config/src/config.rs
// ============================================================================
// Module: Query Lab Configuration
// Description: Configuration loading and validation for Query Lab.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: query-lab-core, query-lab-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with size and path limits. An
//! explicit path (argument or `QUERY_LAB_CONFIG`) must exist; when neither is
//! given and `query-lab.toml` is absent, defaults apply.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use query_lab_core::DEFAULT_RECENT_CAPACITY;
use query_lab_core::DiagnosticSink;
use query_lab_core::FileDiagnosticSink;
use query_lab_core::NoopDiagnosticSink;
use query_lab_core::StderrDiagnosticSink;
use query_lab_sqlite::SqliteConnectionConfig;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "query-lab.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "QUERY_LAB_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Upper bound on the recent-queries ring capacity.
pub const MAX_RECENT_CAPACITY: usize = 100_000;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level Query Lab configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabConfig {
    /// Database connection settings.
    #[serde(default)]
    pub database: SqliteConnectionConfig,
    /// Telemetry settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Telemetry settings.
///
/// # Invariants
/// - `recent_capacity` is within `1..=MAX_RECENT_CAPACITY`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Capacity of the recent-queries ring buffer.
    #[serde(default = "default_recent_capacity")]
    pub recent_capacity: usize,
    /// Default for plan capture when a run does not choose.
    #[serde(default)]
    pub capture_plans: bool,
    /// Diagnostics output.
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            recent_capacity: DEFAULT_RECENT_CAPACITY,
            capture_plans: false,
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

/// Diagnostics sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticsSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Discard diagnostics.
    None,
}

/// Diagnostics output settings.
///
/// # Invariants
/// - `path` is set when `sink` is [`DiagnosticsSinkKind::File`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Sink kind.
    #[serde(default)]
    pub sink: DiagnosticsSinkKind,
    /// Output file for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Returns the default ring buffer capacity.
const fn default_recent_capacity() -> usize {
    DEFAULT_RECENT_CAPACITY
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl LabConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate().map_err(|err| ConfigError::Invalid(err.to_string()))?;
        self.telemetry.validate()
    }
}

impl TelemetryConfig {
    /// Validates telemetry settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a setting is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recent_capacity == 0 || self.recent_capacity > MAX_RECENT_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "telemetry.recent_capacity out of range: {} (1..={MAX_RECENT_CAPACITY})",
                self.recent_capacity
            )));
        }
        self.diagnostics.validate()
    }
}

impl DiagnosticsConfig {
    /// Validates diagnostics settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file sink has no usable path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (DiagnosticsSinkKind::File, None) => Err(ConfigError::Invalid(
                "telemetry.diagnostics.path is required when sink = \"file\"".to_string(),
            )),
            (_, Some(path)) => validate_path(path),
            (_, None) => Ok(()),
        }
    }

    /// Opens the configured diagnostics sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the diagnostics file cannot be opened.
    pub fn open_sink(&self) -> Result<Arc<dyn DiagnosticSink>, ConfigError> {
        match (self.sink, &self.path) {
            (DiagnosticsSinkKind::Stderr, _) => Ok(Arc::new(StderrDiagnosticSink)),
            (DiagnosticsSinkKind::None, _) => Ok(Arc::new(NoopDiagnosticSink)),
            (DiagnosticsSinkKind::File, Some(path)) => {
                let sink =
                    FileDiagnosticSink::new(path).map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(sink))
            }
            (DiagnosticsSinkKind::File, None) => Err(ConfigError::Invalid(
                "telemetry.diagnostics.path is required when sink = \"file\"".to_string(),
            )),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path; the flag reports whether it was requested.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates a path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid("path must be non-empty".to_string()));
    }
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("path component too long".to_string()));
        }
    }
    Ok(())
}
