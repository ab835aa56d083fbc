// crates/query-lab-sqlite/src/config.rs
// ============================================================================
// Module: SQLite Connection Config
// Description: Connection settings for primary and plan-capture connections.
// Purpose: Deserialize and validate database settings.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! URLs are handed to `SQLite` with URI open flags, so both plain paths and
//! `file:` URIs work. Shared-cache in-memory databases
//! (`file:name?mode=memory&cache=shared`) let the plan-capture connection see
//! the same schema as the primary connection.

use serde::Deserialize;

use crate::error::DataError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default database URL.
pub const DEFAULT_DATABASE_URL: &str = "file:query-lab.db";
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Upper bound on the busy timeout (ms).
const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;
/// Maximum accepted URL length.
const MAX_URL_LENGTH: usize = 4_096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Connection settings.
///
/// # Invariants
/// - `url` and `plan_capture_url` are non-empty when set.
/// - `busy_timeout_ms` is at most one minute.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteConnectionConfig {
    /// Database URL or path for the primary connection.
    #[serde(default = "default_url")]
    pub url: String,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Database URL for plan capture; defaults to `url`.
    #[serde(default)]
    pub plan_capture_url: Option<String>,
}

impl Default for SqliteConnectionConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            plan_capture_url: None,
        }
    }
}

impl SqliteConnectionConfig {
    /// Creates a config for the given URL with default settings.
    #[must_use]
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Returns the URL used by plan capture.
    #[must_use]
    pub fn plan_capture_url(&self) -> &str {
        self.plan_capture_url.as_deref().unwrap_or(&self.url)
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Invalid`] when a URL is empty or too long, or the
    /// busy timeout is out of range.
    pub fn validate(&self) -> Result<(), DataError> {
        validate_url("database.url", &self.url)?;
        if let Some(url) = &self.plan_capture_url {
            validate_url("database.plan_capture_url", url)?;
        }
        if self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(DataError::Invalid(format!(
                "busy_timeout_ms out of range: {} (max {MAX_BUSY_TIMEOUT_MS})",
                self.busy_timeout_ms
            )));
        }
        Ok(())
    }
}

/// Returns the default database URL.
fn default_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

/// Returns the default busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Validates one URL field.
fn validate_url(field: &str, url: &str) -> Result<(), DataError> {
    if url.trim().is_empty() {
        return Err(DataError::Invalid(format!("{field} must not be empty")));
    }
    if url.len() > MAX_URL_LENGTH {
        return Err(DataError::Invalid(format!("{field} exceeds {MAX_URL_LENGTH} bytes")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions use unwrap for clarity.")]

    use super::SqliteConnectionConfig;
    use crate::error::DataError;

    #[test]
    fn plan_capture_url_defaults_to_primary() {
        let config = SqliteConnectionConfig::for_url("file:a.db");
        assert_eq!(config.plan_capture_url(), "file:a.db");
        let config = SqliteConnectionConfig {
            plan_capture_url: Some("file:b.db".to_string()),
            ..config
        };
        assert_eq!(config.plan_capture_url(), "file:b.db");
    }

    #[test]
    fn validate_rejects_empty_url_and_long_timeout() {
        assert!(matches!(
            SqliteConnectionConfig::for_url("  ").validate(),
            Err(DataError::Invalid(_))
        ));
        let config = SqliteConnectionConfig {
            busy_timeout_ms: 120_000,
            ..SqliteConnectionConfig::default()
        };
        assert!(matches!(config.validate(), Err(DataError::Invalid(_))));
        SqliteConnectionConfig::default().validate().unwrap();
    }
}
