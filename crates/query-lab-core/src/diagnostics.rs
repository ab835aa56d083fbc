// crates/query-lab-core/src/diagnostics.rs
// ============================================================================
// Module: Telemetry Diagnostics
// Description: Structured diagnostic events for the query telemetry pipeline.
// Purpose: Emit JSON-line diagnostics without a logging framework.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Telemetry-path failures (plan capture errors, failed primary commands) are
//! never surfaced to callers; they are reported here instead. Sinks write one
//! JSON object per line so deployments can route them to any log pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::sync::PoisonError;

use serde::Serialize;

use crate::identifiers::RequestId;
use crate::query_log::unix_millis_now;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Severity of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticLevel {
    /// Lifecycle information.
    Info,
    /// Recoverable telemetry problem.
    Warn,
    /// Failed primary operation.
    Error,
}

/// Diagnostic event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: i64,
    /// Event severity.
    pub level: DiagnosticLevel,
    /// Request the event belongs to, when known.
    pub request_id: Option<RequestId>,
    /// Human-readable detail.
    pub message: String,
    /// Command text involved, when relevant.
    pub sql: Option<String>,
}

impl DiagnosticEvent {
    /// Creates a new event with a consistent timestamp.
    #[must_use]
    pub fn new(event: &'static str, level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            event,
            timestamp_ms: unix_millis_now(),
            level,
            request_id: None,
            message: message.into(),
            sql: None,
        }
    }

    /// Attaches the owning request id.
    #[must_use]
    pub fn with_request(mut self, request_id: Option<RequestId>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Attaches the command text.
    #[must_use]
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for telemetry diagnostics.
pub trait DiagnosticSink: Send + Sync {
    /// Record a diagnostic event.
    fn record(&self, event: &DiagnosticEvent);
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sink that logs JSON lines to stderr.
pub struct StderrDiagnosticSink;

impl DiagnosticSink for StderrDiagnosticSink {
    fn record(&self, event: &DiagnosticEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Sink that logs JSON lines to a file.
pub struct FileDiagnosticSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileDiagnosticSink {
    /// Opens the diagnostics file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl DiagnosticSink for FileDiagnosticSink {
    fn record(&self, event: &DiagnosticEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Sink that discards every event.
pub struct NoopDiagnosticSink;

impl DiagnosticSink for NoopDiagnosticSink {
    fn record(&self, _event: &DiagnosticEvent) {}
}

/// Sink that keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryDiagnosticSink {
    /// Captured events in arrival order.
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl MemoryDiagnosticSink {
    /// Creates an empty in-memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the captured events.
    #[must_use]
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns captured events with the given identifier.
    #[must_use]
    pub fn events_named(&self, event: &str) -> Vec<DiagnosticEvent> {
        self.events().into_iter().filter(|item| item.event == event).collect()
    }
}

impl DiagnosticSink for MemoryDiagnosticSink {
    fn record(&self, event: &DiagnosticEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event.clone());
    }
}
