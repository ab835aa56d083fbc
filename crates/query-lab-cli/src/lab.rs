// crates/query-lab-cli/src/lab.rs
// ============================================================================
// Module: Demo Lab
// Description: Seeded orders/customers workload run through the executor.
// Purpose: Show N+1 versus join query telemetry side by side.
// Dependencies: query-lab-config, query-lab-core, query-lab-sqlite, serde
// ============================================================================

//! ## Overview
//! Both variants return the same rows. The N+1 variant issues one lookup per
//! order; the join variant issues a single command. Comparing their
//! `queryCount` and plans is the point of the lab.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use query_lab_config::LabConfig;
use query_lab_core::DiagnosticSink;
use query_lab_core::PlanCaptureSwitch;
use query_lab_core::QueryLogEntry;
use query_lab_core::QueryLogStore;
use query_lab_core::QueryParams;
use query_lab_core::ScenarioExecutor;
use query_lab_core::ScenarioRequest;
use query_lab_core::ScenarioResponse;
use query_lab_sqlite::DataError;
use query_lab_sqlite::InstrumentedConnection;
use query_lab_sqlite::QueryTelemetryInterceptor;
use query_lab_sqlite::SqlitePlanCapture;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Scenario name for the demo workload.
pub const SCENARIO: &str = "orders-with-customers";
/// Variant issuing one customer lookup per order.
pub const VARIANT_N_PLUS_ONE: &str = "n-plus-one";
/// Variant issuing a single join.
pub const VARIANT_JOIN: &str = "join";

/// Schema and rows for the demo workload.
const SEED_SQL: &str = "
DROP TABLE IF EXISTS orders;
DROP TABLE IF EXISTS customers;
CREATE TABLE customers (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);
CREATE TABLE orders (
    id INTEGER PRIMARY KEY,
    customer_id INTEGER NOT NULL REFERENCES customers(id),
    total REAL NOT NULL
);
INSERT INTO customers (id, name) VALUES (1, 'Ada'), (2, 'Grace'), (3, 'Edsger');
INSERT INTO orders (id, customer_id, total) VALUES
    (1, 1, 42.5), (2, 2, 17.0), (3, 1, 8.25), (4, 3, 99.9), (5, 2, 5.0);
";

// ============================================================================
// SECTION: Types
// ============================================================================

/// One order with its customer's name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithCustomer {
    /// Order id.
    pub order_id: i64,
    /// Customer name.
    pub customer: String,
    /// Order total.
    pub total: f64,
}

/// Output of one `run` invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Scenario responses in execution order.
    pub scenarios: Vec<ScenarioResponse<Vec<OrderWithCustomer>>>,
    /// Most recent queries across all requests, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_queries: Option<Vec<QueryLogEntry>>,
}

/// Assembled telemetry pipeline over one database.
pub struct Lab {
    /// Query log store shared by interceptor and executor.
    store: Arc<QueryLogStore>,
    /// Scenario executor.
    executor: ScenarioExecutor,
    /// Instrumented primary connection.
    connection: InstrumentedConnection,
}

// ============================================================================
// SECTION: Lab
// ============================================================================

impl Lab {
    /// Opens the configured database and wires the telemetry pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] when the database cannot be opened.
    pub fn open(config: &LabConfig, diagnostics: Arc<dyn DiagnosticSink>) -> Result<Self, DataError> {
        let store = Arc::new(QueryLogStore::with_capacity(config.telemetry.recent_capacity));
        let plans = Arc::new(PlanCaptureSwitch::new());
        let interceptor = QueryTelemetryInterceptor::new(
            Arc::clone(&store),
            Arc::clone(&plans),
            Arc::new(SqlitePlanCapture::from_config(&config.database)),
        )
        .with_diagnostics(Arc::clone(&diagnostics));
        let connection = InstrumentedConnection::open(&config.database, Arc::new(interceptor))?;
        let executor =
            ScenarioExecutor::new(Arc::clone(&store), plans).with_diagnostics(diagnostics);
        Ok(Self {
            store,
            executor,
            connection,
        })
    }

    /// Returns the query log store.
    #[must_use]
    pub const fn store(&self) -> &Arc<QueryLogStore> {
        &self.store
    }

    /// Recreates and seeds the demo tables.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] when a seed statement fails.
    pub async fn seed(&self) -> Result<(), DataError> {
        self.connection.execute_batch(SEED_SQL).await
    }

    /// Runs both variants and optionally collects the most recent queries.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] when a variant's primary command fails.
    pub async fn run(&self, include_plan: bool, recent: Option<usize>) -> Result<RunReport, DataError> {
        let mut scenarios = Vec::with_capacity(2);
        let connection = self.connection.clone();
        scenarios.push(
            self.executor
                .execute(
                    ScenarioRequest::new(SCENARIO, VARIANT_N_PLUS_ONE)
                        .with_description("one customer lookup per order")
                        .with_plan(include_plan),
                    || async move { orders_n_plus_one(&connection).await },
                )
                .await?,
        );
        let connection = self.connection.clone();
        scenarios.push(
            self.executor
                .execute(
                    ScenarioRequest::new(SCENARIO, VARIANT_JOIN)
                        .with_description("single join across orders and customers")
                        .with_plan(include_plan),
                    || async move { orders_join(&connection).await },
                )
                .await?,
        );
        Ok(RunReport {
            scenarios,
            recent_queries: recent.map(|count| self.store.get_recent_queries(count)),
        })
    }
}

// ============================================================================
// SECTION: Variants
// ============================================================================

/// Loads orders, then each order's customer with its own command.
///
/// # Errors
///
/// Returns [`DataError`] when any command fails.
pub async fn orders_n_plus_one(
    connection: &InstrumentedConnection,
) -> Result<Vec<OrderWithCustomer>, DataError> {
    let orders = connection
        .query(
            "SELECT id, customer_id, total FROM orders ORDER BY id",
            &QueryParams::new(),
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, f64>(2)?)),
        )
        .await?;
    let mut rows = Vec::with_capacity(orders.len());
    for (order_id, customer_id, total) in orders {
        let customer = connection
            .query_row(
                "SELECT name FROM customers WHERE id = @customerId",
                &QueryParams::new().with("@customerId", customer_id),
                |row| row.get::<_, String>(0),
            )
            .await?;
        rows.push(OrderWithCustomer {
            order_id,
            customer,
            total,
        });
    }
    Ok(rows)
}

/// Loads orders with customer names in one command.
///
/// # Errors
///
/// Returns [`DataError`] when the command fails.
pub async fn orders_join(
    connection: &InstrumentedConnection,
) -> Result<Vec<OrderWithCustomer>, DataError> {
    connection
        .query(
            "SELECT o.id, c.name, o.total FROM orders o JOIN customers c ON c.id = o.customer_id \
             WHERE o.total >= @minTotal ORDER BY o.id",
            &QueryParams::new().with("@minTotal", 0.0),
            |row| {
                Ok(OrderWithCustomer {
                    order_id: row.get(0)?,
                    customer: row.get(1)?,
                    total: row.get(2)?,
                })
            },
        )
        .await
}
