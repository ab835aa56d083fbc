// crates/query-lab-sqlite/src/error.rs
// ============================================================================
// Module: Data Access Errors
// Description: Error type for instrumented SQLite commands.
// Purpose: Surface primary command failures unchanged to scenario callers.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Primary command failures are mapped into [`DataError`] and returned to the
//! caller unchanged by the interceptor pipeline.

use thiserror::Error;

/// Errors raised by the data-access layer.
///
/// # Invariants
/// - Messages carry the engine's text; parameter values are never embedded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataError {
    /// `SQLite` engine error.
    #[error("sqlite db error: {0}")]
    Db(String),
    /// Connection state error (for example a poisoned connection lock).
    #[error("sqlite io error: {0}")]
    Io(String),
    /// Blocking worker failed to complete.
    #[error("sqlite worker join error: {0}")]
    Join(String),
    /// Invalid connection configuration.
    #[error("sqlite invalid config: {0}")]
    Invalid(String),
}

impl From<rusqlite::Error> for DataError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Db(error.to_string())
    }
}
