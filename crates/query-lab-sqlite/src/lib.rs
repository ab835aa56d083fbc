// crates/query-lab-sqlite/src/lib.rs
// ============================================================================
// Module: Query Lab SQLite Library
// Description: Instrumented SQLite data-access layer.
// Purpose: Feed every executed command into the query telemetry core.
// Dependencies: query-lab-core, rusqlite, async-trait, tokio
// ============================================================================

//! ## Overview
//! [`InstrumentedConnection`] runs commands against `SQLite` and reports each
//! one to a [`CommandInterceptor`]. [`QueryTelemetryInterceptor`] records the
//! commands in a [`query_lab_core::QueryLogStore`] and, for requests that opted
//! in, attaches an estimated plan produced by [`SqlitePlanCapture`] on an
//! independent connection.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod connection;
pub mod error;
pub mod interceptor;
pub mod literal;
pub mod plan;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::SqliteConnectionConfig;
pub use connection::InstrumentedConnection;
pub use error::DataError;
pub use interceptor::CommandInfo;
pub use interceptor::CommandInterceptor;
pub use interceptor::CommandOutcome;
pub use interceptor::NoopCommandInterceptor;
pub use interceptor::QueryTelemetryInterceptor;
pub use literal::inline_parameters;
pub use literal::sql_literal;
pub use plan::PlanCapture;
pub use plan::PlanCaptureError;
pub use plan::SqlitePlanCapture;
pub use plan::render_plan_tree;
