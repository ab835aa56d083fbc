// crates/query-lab-sqlite/src/plan.rs
// ============================================================================
// Module: Execution Plan Capture
// Description: Best-effort estimated plans on an independent connection.
// Purpose: Describe how SQLite intends to run a just-executed command.
// Dependencies: async-trait, rusqlite, thiserror, tokio
// ============================================================================

//! ## Overview
//! [`SqlitePlanCapture`] never touches the primary connection. Each attempt
//! opens a fresh connection to the configured database, switches it to plan
//! mode (`PRAGMA query_only = ON`), runs `EXPLAIN QUERY PLAN` over the command
//! with its parameters inlined as literals, and switches plan mode back off
//! before the connection is released, even when plan retrieval fails.
//!
//! Only estimated plans are produced. `EXPLAIN QUERY PLAN` never executes
//! the statement, so runtime statistics are not available.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use query_lab_core::QueryParams;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use thiserror::Error;

use crate::config::SqliteConnectionConfig;
use crate::literal::inline_parameters;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header line of a rendered plan.
const PLAN_HEADER: &str = "QUERY PLAN";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Plan capture failures. Reported as diagnostics, never to callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanCaptureError {
    /// The plan connection could not be opened.
    #[error("plan capture connect error: {0}")]
    Connect(String),
    /// The engine rejected plan mode or the plan statement.
    #[error("plan capture db error: {0}")]
    Db(String),
    /// Blocking worker failed to complete.
    #[error("plan capture join error: {0}")]
    Join(String),
}

// ============================================================================
// SECTION: Plan Capture Interface
// ============================================================================

/// Produces an estimated plan for a command.
#[async_trait]
pub trait PlanCapture: Send + Sync {
    /// Returns the plan text, or `None` when the engine produced no plan rows.
    ///
    /// # Errors
    ///
    /// Returns [`PlanCaptureError`] when the plan could not be obtained.
    async fn capture(
        &self,
        sql: &str,
        params: &QueryParams,
    ) -> Result<Option<String>, PlanCaptureError>;
}

// ============================================================================
// SECTION: SQLite Plan Capture
// ============================================================================

/// Plan capture over a short-lived secondary `SQLite` connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlitePlanCapture {
    /// Database URL opened for each attempt.
    url: String,
    /// Busy timeout applied to the plan connection.
    busy_timeout: Duration,
}

impl SqlitePlanCapture {
    /// Creates a plan capture for the given database URL.
    #[must_use]
    pub fn new(url: impl Into<String>, busy_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            busy_timeout,
        }
    }

    /// Creates a plan capture from connection settings.
    #[must_use]
    pub fn from_config(config: &SqliteConnectionConfig) -> Self {
        Self::new(config.plan_capture_url(), Duration::from_millis(config.busy_timeout_ms))
    }

    /// Returns the database URL used for plan capture.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PlanCapture for SqlitePlanCapture {
    async fn capture(
        &self,
        sql: &str,
        params: &QueryParams,
    ) -> Result<Option<String>, PlanCaptureError> {
        let inlined = inline_parameters(sql, params);
        let url = self.url.clone();
        let busy_timeout = self.busy_timeout;
        tokio::task::spawn_blocking(move || explain(&url, busy_timeout, &inlined))
            .await
            .map_err(|err| PlanCaptureError::Join(err.to_string()))?
    }
}

/// Runs `EXPLAIN QUERY PLAN` on a fresh connection.
fn explain(
    url: &str,
    busy_timeout: Duration,
    sql: &str,
) -> Result<Option<String>, PlanCaptureError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let connection = Connection::open_with_flags(url, flags)
        .map_err(|err| PlanCaptureError::Connect(err.to_string()))?;
    connection.busy_timeout(busy_timeout).map_err(|err| PlanCaptureError::Db(err.to_string()))?;
    let plan_mode = PlanMode::enable(&connection)?;
    let rows = plan_rows(plan_mode.connection, sql)?;
    drop(plan_mode);
    Ok(render_plan_tree(&rows))
}

/// Reads raw plan rows as `(id, parent, detail)`.
fn plan_rows(connection: &Connection, sql: &str) -> Result<Vec<(i64, i64, String)>, PlanCaptureError> {
    let mut statement = connection
        .prepare(&format!("EXPLAIN QUERY PLAN {sql}"))
        .map_err(|err| PlanCaptureError::Db(err.to_string()))?;
    let rows = statement
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(3)?)))
        .map_err(|err| PlanCaptureError::Db(err.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(|err| PlanCaptureError::Db(err.to_string()))
}

// ============================================================================
// SECTION: Plan Mode Toggle
// ============================================================================

/// Holds a connection in plan mode; leaving scope switches plan mode off.
struct PlanMode<'a> {
    /// Connection in plan mode.
    connection: &'a Connection,
}

impl<'a> PlanMode<'a> {
    /// Switches the connection into plan mode.
    fn enable(connection: &'a Connection) -> Result<Self, PlanCaptureError> {
        connection
            .execute_batch("PRAGMA query_only = ON;")
            .map_err(|err| PlanCaptureError::Db(err.to_string()))?;
        Ok(Self {
            connection,
        })
    }
}

impl Drop for PlanMode<'_> {
    fn drop(&mut self) {
        let _ = self.connection.execute_batch("PRAGMA query_only = OFF;");
    }
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders `(id, parent, detail)` plan rows as an indented tree.
///
/// Returns `None` when there are no rows.
#[must_use]
pub fn render_plan_tree(rows: &[(i64, i64, String)]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }
    let mut children: BTreeMap<i64, Vec<(i64, &str)>> = BTreeMap::new();
    for (id, parent, detail) in rows {
        children.entry(*parent).or_default().push((*id, detail.as_str()));
    }
    let mut out = String::from(PLAN_HEADER);
    render_children(&children, 0, "", &mut out);
    Some(out)
}

/// Appends the subtree under `parent` to `out`.
fn render_children(
    children: &BTreeMap<i64, Vec<(i64, &str)>>,
    parent: i64,
    prefix: &str,
    out: &mut String,
) {
    let Some(nodes) = children.get(&parent) else {
        return;
    };
    for (index, (id, detail)) in nodes.iter().enumerate() {
        let last = index + 1 == nodes.len();
        out.push('\n');
        out.push_str(prefix);
        out.push_str(if last { "`--" } else { "|--" });
        out.push_str(detail);
        if *id != parent {
            let nested = format!("{prefix}{}", if last { "   " } else { "|  " });
            render_children(children, *id, &nested, out);
        }
    }
}
