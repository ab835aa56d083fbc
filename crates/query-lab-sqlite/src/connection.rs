// crates/query-lab-sqlite/src/connection.rs
// ============================================================================
// Module: Instrumented Connection
// Description: SQLite connection whose commands are reported to an interceptor.
// Purpose: Provide the data-access layer that feeds query telemetry.
// Dependencies: rusqlite, tokio, query-lab-core
// ============================================================================

//! ## Overview
//! Commands run on a blocking worker so awaiting a command is a real
//! suspension point. Interceptor hooks run on the calling task, where the
//! request context is published, never on the worker.
//!
//! Parameters are bound by name; each name carries its sigil as written in
//! the command text (`@id`, `:id`, or `$id`).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use query_lab_core::CommandKind;
use query_lab_core::ParamValue;
use query_lab_core::QueryParams;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::Row;
use rusqlite::ToSql;
use rusqlite::types::Value;

use crate::config::SqliteConnectionConfig;
use crate::error::DataError;
use crate::interceptor::CommandInfo;
use crate::interceptor::CommandInterceptor;
use crate::interceptor::CommandOutcome;

// ============================================================================
// SECTION: Connection
// ============================================================================

/// `SQLite` connection reporting every command to an interceptor.
#[derive(Clone)]
pub struct InstrumentedConnection {
    /// Underlying connection, used from blocking workers.
    connection: Arc<Mutex<Connection>>,
    /// Observer for every command.
    interceptor: Arc<dyn CommandInterceptor>,
}

impl InstrumentedConnection {
    /// Opens the primary connection described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] when the config is invalid or the database
    /// cannot be opened.
    pub fn open(
        config: &SqliteConnectionConfig,
        interceptor: Arc<dyn CommandInterceptor>,
    ) -> Result<Self, DataError> {
        config.validate()?;
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let connection = Connection::open_with_flags(&config.url, flags)?;
        connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        connection.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self::from_connection(connection, interceptor))
    }

    /// Wraps an already opened connection.
    #[must_use]
    pub fn from_connection(
        connection: Connection,
        interceptor: Arc<dyn CommandInterceptor>,
    ) -> Self {
        Self {
            connection: Arc::new(Mutex::new(connection)),
            interceptor,
        }
    }

    /// Runs schema or seed statements. Not reported to the interceptor.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] when any statement fails.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), DataError> {
        let sql = sql.to_string();
        self.run_blocking(move |connection| Ok(connection.execute_batch(&sql)?)).await
    }

    /// Executes a non-query command and returns the number of changed rows.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] when the command fails.
    pub async fn execute(&self, sql: &str, params: &QueryParams) -> Result<u64, DataError> {
        let command = CommandInfo::new(sql, params.clone(), CommandKind::NonQuery);
        let statement_sql = sql.to_string();
        let bound = params.clone();
        self.dispatch(command, move |connection| {
            let mut statement = connection.prepare_cached(&statement_sql)?;
            let changed = with_bound(&bound, |args| statement.execute(args))?;
            let changed = u64::try_from(changed).unwrap_or(u64::MAX);
            Ok((changed, Some(changed)))
        })
        .await
    }

    /// Runs a reader command and maps every row.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] when the command or a row mapping fails.
    pub async fn query<T, F>(
        &self,
        sql: &str,
        params: &QueryParams,
        mut map: F,
    ) -> Result<Vec<T>, DataError>
    where
        T: Send + 'static,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T> + Send + 'static,
    {
        let command = CommandInfo::new(sql, params.clone(), CommandKind::Reader);
        let statement_sql = sql.to_string();
        let bound = params.clone();
        self.dispatch(command, move |connection| {
            let mut statement = connection.prepare_cached(&statement_sql)?;
            let rows = with_bound(&bound, |args| {
                statement.query_map(args, |row| map(row))?.collect::<rusqlite::Result<Vec<T>>>()
            })?;
            let count = u64::try_from(rows.len()).unwrap_or(u64::MAX);
            Ok((rows, Some(count)))
        })
        .await
    }

    /// Runs a command expected to return exactly one row.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] when the command fails or returns no rows.
    pub async fn query_row<T, F>(
        &self,
        sql: &str,
        params: &QueryParams,
        map: F,
    ) -> Result<T, DataError>
    where
        T: Send + 'static,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T> + Send + 'static,
    {
        let command = CommandInfo::new(sql, params.clone(), CommandKind::Scalar);
        let statement_sql = sql.to_string();
        let bound = params.clone();
        self.dispatch(command, move |connection| {
            let mut statement = connection.prepare_cached(&statement_sql)?;
            let value = with_bound(&bound, |args| statement.query_row(args, map))?;
            Ok((value, None))
        })
        .await
    }

    /// Runs one intercepted command.
    async fn dispatch<T, F>(&self, command: CommandInfo, op: F) -> Result<T, DataError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<(T, Option<u64>), DataError> + Send + 'static,
    {
        self.interceptor.before_dispatch(&command).await;
        let started = Instant::now();
        let result = self.run_blocking(op).await;
        let duration_ms = started.elapsed().as_secs_f64() * 1_000.0;
        match result {
            Ok((value, rows_affected)) => {
                let outcome = CommandOutcome {
                    duration_ms,
                    rows_affected,
                };
                self.interceptor.after_complete(&command, &outcome).await;
                Ok(value)
            }
            Err(err) => {
                self.interceptor.on_failure(&command, &err).await;
                Err(err)
            }
        }
    }

    /// Runs `op` against the connection on a blocking worker.
    async fn run_blocking<T, F>(&self, op: F) -> Result<T, DataError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, DataError> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let guard = connection
                .lock()
                .map_err(|_| DataError::Io("sqlite connection lock poisoned".to_string()))?;
            op(&guard)
        })
        .await
        .map_err(|err| DataError::Join(err.to_string()))?
    }
}

// ============================================================================
// SECTION: Parameter Binding
// ============================================================================

/// Converts a parameter value to its storage form.
fn to_sql_value(value: &ParamValue) -> Value {
    match value {
        ParamValue::Null => Value::Null,
        ParamValue::Bool(value) => Value::Integer(i64::from(*value)),
        ParamValue::Integer(value) => Value::Integer(*value),
        ParamValue::Real(value) => Value::Real(*value),
        ParamValue::Text(value) => Value::Text(value.clone()),
        ParamValue::Timestamp(value) => Value::Text(ParamValue::format_timestamp(*value)),
        ParamValue::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Calls `f` with the parameters as named bind arguments.
fn with_bound<R>(
    params: &QueryParams,
    f: impl FnOnce(&[(&str, &dyn ToSql)]) -> rusqlite::Result<R>,
) -> rusqlite::Result<R> {
    let values: Vec<(&str, Value)> =
        params.iter().map(|(name, value)| (name, to_sql_value(value))).collect();
    let args: Vec<(&str, &dyn ToSql)> =
        values.iter().map(|(name, value)| (*name, value as &dyn ToSql)).collect();
    f(&args)
}
