// crates/query-lab-core/src/lib.rs
// ============================================================================
// Module: Query Lab Core Library
// Description: Public API surface for the per-request query telemetry core.
// Purpose: Expose request context, query log store, and scenario executor.
// Dependencies: crate::{context, query_log, executor}
// ============================================================================

//! ## Overview
//! Query Lab core correlates every database command issued on behalf of one
//! logical request, records timing, row, and parameter metadata for each, and
//! exposes per-request logs and metrics. It is backend-agnostic: a data-access
//! layer feeds it through [`QueryLogStore::add_query`] from inside a
//! [`RequestContext`] scope, and [`ScenarioExecutor`] packages the results.
//!
//! All state is process-memory only and is lost on restart.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod context;
pub mod diagnostics;
pub mod executor;
pub mod identifiers;
pub mod memory;
pub mod params;
pub mod plan_switch;
pub mod query_log;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use context::RequestContext;
pub use diagnostics::DiagnosticEvent;
pub use diagnostics::DiagnosticLevel;
pub use diagnostics::DiagnosticSink;
pub use diagnostics::FileDiagnosticSink;
pub use diagnostics::MemoryDiagnosticSink;
pub use diagnostics::NoopDiagnosticSink;
pub use diagnostics::StderrDiagnosticSink;
pub use executor::QueryInfo;
pub use executor::ScenarioExecutor;
pub use executor::ScenarioMetrics;
pub use executor::ScenarioRequest;
pub use executor::ScenarioResponse;
pub use identifiers::RequestId;
pub use identifiers::RequestIdGenerator;
pub use identifiers::ScenarioName;
pub use identifiers::VariantName;
pub use memory::MemoryProbe;
pub use memory::ProcessMemoryProbe;
pub use params::ParamValue;
pub use params::QueryParams;
pub use plan_switch::PlanCaptureSwitch;
pub use query_log::CommandKind;
pub use query_log::DEFAULT_RECENT_CAPACITY;
pub use query_log::QueryLogEntry;
pub use query_log::QueryLogStore;
pub use query_log::RequestMetrics;
