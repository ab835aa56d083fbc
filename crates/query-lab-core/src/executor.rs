// crates/query-lab-core/src/executor.rs
// ============================================================================
// Module: Scenario Executor
// Description: Runs one scenario variant inside a request scope.
// Purpose: Package a unit of work's result with its query log and metrics.
// Dependencies: serde, serde_json, crate::{context, query_log, plan_switch}
// ============================================================================

//! ## Overview
//! [`ScenarioExecutor::execute`] resolves the request id (reusing one that an
//! upstream boundary already published, otherwise minting a fresh one), opts
//! the request into plan capture when asked, runs the caller's unit of work
//! inside the request scope, and returns a [`ScenarioResponse`] envelope.
//!
//! Failures of the unit of work propagate unchanged. Whatever the outcome,
//! plan capture is disabled and the request is ended before control returns,
//! including when the future is dropped mid-flight.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;

use crate::context::RequestContext;
use crate::diagnostics::DiagnosticEvent;
use crate::diagnostics::DiagnosticLevel;
use crate::diagnostics::DiagnosticSink;
use crate::diagnostics::NoopDiagnosticSink;
use crate::identifiers::RequestId;
use crate::identifiers::RequestIdGenerator;
use crate::identifiers::ScenarioName;
use crate::identifiers::VariantName;
use crate::memory::MemoryProbe;
use crate::memory::ProcessMemoryProbe;
use crate::memory::memory_delta;
use crate::params::ParamValue;
use crate::plan_switch::PlanCaptureSwitch;
use crate::query_log::QueryLogEntry;
use crate::query_log::QueryLogStore;

// ============================================================================
// SECTION: Request / Response Types
// ============================================================================

/// Inputs identifying one scenario run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioRequest {
    /// Scenario name.
    pub scenario: ScenarioName,
    /// Variant name within the scenario.
    pub variant: VariantName,
    /// Optional human description echoed in the response.
    pub description: Option<String>,
    /// Whether to capture execution plans for this run.
    pub include_plan: bool,
}

impl ScenarioRequest {
    /// Creates a request without description or plan capture.
    #[must_use]
    pub fn new(scenario: impl Into<ScenarioName>, variant: impl Into<VariantName>) -> Self {
        Self {
            scenario: scenario.into(),
            variant: variant.into(),
            description: None,
            include_plan: false,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets plan capture for the run.
    #[must_use]
    pub const fn with_plan(mut self, include_plan: bool) -> Self {
        self.include_plan = include_plan;
        self
    }
}

/// Metrics snapshot for one scenario run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioMetrics {
    /// Wall-clock duration of the unit of work in milliseconds.
    pub duration_ms: f64,
    /// Commands recorded under the request.
    pub query_count: u64,
    /// Rows returned by the unit of work.
    pub rows_returned: u64,
    /// Non-negative memory delta in bytes.
    pub memory_bytes: u64,
}

/// Sanitized view of a logged command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryInfo {
    /// Command text.
    pub sql: String,
    /// Command duration in milliseconds.
    pub duration_ms: f64,
    /// Bound parameters by placeholder name.
    pub parameters: BTreeMap<String, ParamValue>,
    /// Estimated execution plan, when captured.
    pub execution_plan: Option<String>,
}

impl From<QueryLogEntry> for QueryInfo {
    fn from(entry: QueryLogEntry) -> Self {
        Self {
            sql: entry.sql,
            duration_ms: entry.duration_ms,
            parameters: entry.parameters,
            execution_plan: entry.execution_plan,
        }
    }
}

/// Envelope returned for every scenario run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResponse<T> {
    /// Request id the run was recorded under.
    pub request_id: RequestId,
    /// Scenario name.
    pub scenario: ScenarioName,
    /// Variant name.
    pub variant: VariantName,
    /// Optional description.
    pub description: Option<String>,
    /// Business result of the unit of work.
    pub result: T,
    /// Metrics snapshot.
    pub metrics: ScenarioMetrics,
    /// Commands issued during the run, in execution order.
    pub queries: Vec<QueryInfo>,
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Orchestrates scenario runs against a shared query log store.
pub struct ScenarioExecutor {
    /// Store receiving intercepted commands.
    store: Arc<QueryLogStore>,
    /// Per-request plan capture flags.
    plans: Arc<PlanCaptureSwitch>,
    /// Minter for request ids not supplied upstream.
    ids: RequestIdGenerator,
    /// Memory snapshot source.
    memory: Arc<dyn MemoryProbe>,
    /// Diagnostics sink for lifecycle events.
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl ScenarioExecutor {
    /// Creates an executor using the process memory probe and no diagnostics.
    #[must_use]
    pub fn new(store: Arc<QueryLogStore>, plans: Arc<PlanCaptureSwitch>) -> Self {
        Self {
            store,
            plans,
            ids: RequestIdGenerator::default(),
            memory: Arc::new(ProcessMemoryProbe),
            diagnostics: Arc::new(NoopDiagnosticSink),
        }
    }

    /// Replaces the memory probe.
    #[must_use]
    pub fn with_memory_probe(mut self, memory: Arc<dyn MemoryProbe>) -> Self {
        self.memory = memory;
        self
    }

    /// Replaces the diagnostics sink.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn store(&self) -> &Arc<QueryLogStore> {
        &self.store
    }

    /// Runs `work` as one scenario variant and returns the response envelope.
    ///
    /// # Errors
    ///
    /// Returns the unit of work's error unchanged.
    pub async fn execute<T, E, F, Fut>(
        &self,
        request: ScenarioRequest,
        work: F,
    ) -> Result<ScenarioResponse<T>, E>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let id = RequestContext::current().unwrap_or_else(|| self.ids.issue());
        RequestContext::scope(id.clone(), self.run(id, request, work)).await
    }

    /// Runs the unit of work inside an already published request scope.
    async fn run<T, E, F, Fut>(
        &self,
        id: RequestId,
        request: ScenarioRequest,
        work: F,
    ) -> Result<ScenarioResponse<T>, E>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let guard = RunGuard::start(&self.store, &self.plans, &id, request.include_plan);
        self.diagnostics.record(
            &DiagnosticEvent::new(
                "request_started",
                DiagnosticLevel::Info,
                format!("{}/{}", request.scenario, request.variant),
            )
            .with_request(Some(id.clone())),
        );

        let memory_before = self.memory.current_bytes();
        let started = Instant::now();
        let outcome = work().await;
        let duration_ms = started.elapsed().as_secs_f64() * 1_000.0;
        let memory_bytes = memory_delta(memory_before, self.memory.current_bytes());
        self.store.record_memory_delta(&id, memory_bytes);
        drop(guard);

        let (level, status) = match &outcome {
            Ok(_) => (DiagnosticLevel::Info, "ok"),
            Err(_) => (DiagnosticLevel::Error, "failed"),
        };
        self.diagnostics.record(
            &DiagnosticEvent::new(
                "request_finished",
                level,
                format!(
                    "{}/{} {status} in {duration_ms:.3} ms",
                    request.scenario, request.variant
                ),
            )
            .with_request(Some(id.clone())),
        );
        let result = outcome?;

        let queries: Vec<QueryInfo> =
            self.store.get_queries_for_request(&id).into_iter().map(QueryInfo::from).collect();
        let query_count = self.store.get_metrics_for_request(&id).map_or_else(
            || u64::try_from(queries.len()).unwrap_or(u64::MAX),
            |metrics| metrics.query_count,
        );
        let metrics = ScenarioMetrics {
            duration_ms,
            query_count,
            rows_returned: rows_returned(&result),
            memory_bytes,
        };
        Ok(ScenarioResponse {
            request_id: id,
            scenario: request.scenario,
            variant: request.variant,
            description: request.description,
            result,
            metrics,
            queries,
        })
    }
}

// ============================================================================
// SECTION: Run Guard
// ============================================================================

/// Scopes plan capture and request lifetime to one run.
struct RunGuard<'a> {
    /// Store whose request is ended on drop.
    store: &'a QueryLogStore,
    /// Switch reset on drop.
    plans: &'a PlanCaptureSwitch,
    /// Request being run.
    id: RequestId,
}

impl<'a> RunGuard<'a> {
    /// Sets plan capture and starts the request.
    fn start(
        store: &'a QueryLogStore,
        plans: &'a PlanCaptureSwitch,
        id: &RequestId,
        include_plan: bool,
    ) -> Self {
        plans.set(id, include_plan);
        store.start_request(id);
        Self {
            store,
            plans,
            id: id.clone(),
        }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.plans.set(&self.id, false);
        self.store.end_request(&self.id);
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Infers rows returned from the result's shape: sequence length, else 1.
#[must_use]
pub fn rows_returned<T: Serialize>(result: &T) -> u64 {
    match serde_json::to_value(result) {
        Ok(Value::Array(items)) => u64::try_from(items.len()).unwrap_or(u64::MAX),
        _ => 1,
    }
}
