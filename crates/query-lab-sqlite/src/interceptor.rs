// crates/query-lab-sqlite/src/interceptor.rs
// ============================================================================
// Module: Command Interceptor
// Description: Observer hooks invoked around every data-access command.
// Purpose: Record query telemetry and attach plans without affecting commands.
// Dependencies: async-trait, query-lab-core
// ============================================================================

//! ## Overview
//! The data-access layer calls a [`CommandInterceptor`] before dispatching a
//! command and after its result has been fully consumed. Hooks return `()`,
//! so an interceptor cannot fail or alter the command it observes.
//!
//! [`QueryTelemetryInterceptor`] always records the command in the query log
//! store. For requests that opted into plan capture it then asks a
//! [`PlanCapture`] for an estimated plan; failures go to the diagnostics sink
//! and the entry keeps an empty plan.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use query_lab_core::CommandKind;
use query_lab_core::DiagnosticEvent;
use query_lab_core::DiagnosticLevel;
use query_lab_core::DiagnosticSink;
use query_lab_core::NoopDiagnosticSink;
use query_lab_core::PlanCaptureSwitch;
use query_lab_core::QueryLogEntry;
use query_lab_core::QueryLogStore;
use query_lab_core::QueryParams;
use query_lab_core::RequestContext;

use crate::error::DataError;
use crate::plan::PlanCapture;

// ============================================================================
// SECTION: Hook Payloads
// ============================================================================

/// Command as dispatched to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandInfo {
    /// Command text.
    pub sql: String,
    /// Bound parameters.
    pub parameters: QueryParams,
    /// Command category.
    pub kind: CommandKind,
}

impl CommandInfo {
    /// Creates a command description.
    #[must_use]
    pub fn new(sql: impl Into<String>, parameters: QueryParams, kind: CommandKind) -> Self {
        Self {
            sql: sql.into(),
            parameters,
            kind,
        }
    }
}

/// Timing and result metadata for a completed command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandOutcome {
    /// Dispatch-to-completion duration in milliseconds.
    pub duration_ms: f64,
    /// Rows changed or read, when known.
    pub rows_affected: Option<u64>,
}

// ============================================================================
// SECTION: Interceptor Interface
// ============================================================================

/// Observer invoked around every command.
#[async_trait]
pub trait CommandInterceptor: Send + Sync {
    /// Called immediately before the command is dispatched.
    async fn before_dispatch(&self, _command: &CommandInfo) {}

    /// Called after the command's results were fully consumed.
    async fn after_complete(&self, command: &CommandInfo, outcome: &CommandOutcome);

    /// Called when the command failed.
    async fn on_failure(&self, _command: &CommandInfo, _error: &DataError) {}
}

/// Interceptor that observes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCommandInterceptor;

#[async_trait]
impl CommandInterceptor for NoopCommandInterceptor {
    async fn after_complete(&self, _command: &CommandInfo, _outcome: &CommandOutcome) {}
}

// ============================================================================
// SECTION: Telemetry Interceptor
// ============================================================================

/// Records commands in a query log store and attaches captured plans.
pub struct QueryTelemetryInterceptor {
    /// Store receiving every completed command.
    store: Arc<QueryLogStore>,
    /// Per-request plan capture flags.
    plans: Arc<PlanCaptureSwitch>,
    /// Plan source for opted-in requests.
    capture: Arc<dyn PlanCapture>,
    /// Sink for telemetry-path failures.
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl QueryTelemetryInterceptor {
    /// Creates an interceptor with no diagnostics output.
    #[must_use]
    pub fn new(
        store: Arc<QueryLogStore>,
        plans: Arc<PlanCaptureSwitch>,
        capture: Arc<dyn PlanCapture>,
    ) -> Self {
        Self {
            store,
            plans,
            capture,
            diagnostics: Arc::new(NoopDiagnosticSink),
        }
    }

    /// Replaces the diagnostics sink.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Captures and attaches a plan for the command just recorded.
    async fn attach_plan(&self, command: &CommandInfo) {
        let request_id = RequestContext::current();
        match self.capture.capture(&command.sql, &command.parameters).await {
            Ok(Some(plan)) => self.store.set_last_execution_plan(plan),
            Ok(None) => self.diagnostics.record(
                &DiagnosticEvent::new(
                    "plan_capture_empty",
                    DiagnosticLevel::Warn,
                    "plan capture returned no plan rows",
                )
                .with_request(request_id)
                .with_sql(command.sql.clone()),
            ),
            Err(err) => self.diagnostics.record(
                &DiagnosticEvent::new("plan_capture_failed", DiagnosticLevel::Warn, err.to_string())
                    .with_request(request_id)
                    .with_sql(command.sql.clone()),
            ),
        }
    }
}

#[async_trait]
impl CommandInterceptor for QueryTelemetryInterceptor {
    async fn after_complete(&self, command: &CommandInfo, outcome: &CommandOutcome) {
        let entry = QueryLogEntry::new(command.sql.clone(), outcome.duration_ms)
            .with_parameters(command.parameters.to_map())
            .with_rows_affected(outcome.rows_affected)
            .with_command_kind(command.kind);
        self.store.add_query(entry);

        let enabled = RequestContext::current().is_some_and(|id| self.plans.is_enabled(&id));
        if enabled {
            self.attach_plan(command).await;
        }
    }

    async fn on_failure(&self, command: &CommandInfo, error: &DataError) {
        self.diagnostics.record(
            &DiagnosticEvent::new("command_failed", DiagnosticLevel::Error, error.to_string())
                .with_request(RequestContext::current())
                .with_sql(command.sql.clone()),
        );
    }
}
