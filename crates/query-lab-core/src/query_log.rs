// crates/query-lab-core/src/query_log.rs
// ============================================================================
// Module: Query Log Store
// Description: Per-request query logs, request metrics, and a recent-queries ring.
// Purpose: Own all intercepted command records and hand out read-only snapshots.
// Dependencies: dashmap, serde, crate::context
// ============================================================================

//! ## Overview
//! [`QueryLogStore`] is the only shared mutable state of the telemetry
//! pipeline. It keeps:
//! - an ordered log of entries per [`RequestId`],
//! - one [`RequestMetrics`] aggregate per request,
//! - a bounded FIFO of the most recent entries across all requests.
//!
//! Per-request logs and metrics live in sharded concurrent maps; the ring
//! buffer has its own lock. No lock covers the whole store. Each operation is
//! atomic on its own; the query count and log length of a request may differ
//! while commands are still being recorded and agree once the request's work
//! has completed.
//!
//! Entries are shared between the request log and the ring buffer, so a plan
//! attached after insertion is visible from both. Readers always receive
//! owned copies.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use dashmap::DashMap;
use serde::Serialize;

use crate::context::RequestContext;
use crate::identifiers::RequestId;
use crate::params::ParamValue;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default capacity of the recent-queries ring buffer.
pub const DEFAULT_RECENT_CAPACITY: usize = 1_000;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Kind of command that produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Command returning a row stream.
    Reader,
    /// Command returning an affected-row count.
    NonQuery,
    /// Command returning a single row.
    Scalar,
}

/// One intercepted command execution.
///
/// # Invariants
/// - `execution_plan` is the only field set after the entry is recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryLogEntry {
    /// Owning request, assigned when the entry is recorded under one.
    pub request_id: Option<RequestId>,
    /// Raw command text.
    pub sql: String,
    /// Command duration in milliseconds.
    pub duration_ms: f64,
    /// Bound parameters by placeholder name.
    pub parameters: BTreeMap<String, ParamValue>,
    /// Rows affected, when the command reports it.
    pub rows_affected: Option<u64>,
    /// Unix epoch milliseconds when the command completed.
    pub timestamp_ms: i64,
    /// Command kind tag.
    pub command_kind: Option<CommandKind>,
    /// Estimated execution plan, when captured.
    pub execution_plan: Option<String>,
}

impl QueryLogEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(sql: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            request_id: None,
            sql: sql.into(),
            duration_ms,
            parameters: BTreeMap::new(),
            rows_affected: None,
            timestamp_ms: unix_millis_now(),
            command_kind: None,
            execution_plan: None,
        }
    }

    /// Sets the recorded parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: BTreeMap<String, ParamValue>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Sets the rows-affected count.
    #[must_use]
    pub const fn with_rows_affected(mut self, rows: Option<u64>) -> Self {
        self.rows_affected = rows;
        self
    }

    /// Sets the command kind tag.
    #[must_use]
    pub const fn with_command_kind(mut self, kind: CommandKind) -> Self {
        self.command_kind = Some(kind);
        self
    }
}

/// Aggregate metrics for one request.
///
/// # Invariants
/// - `query_count` and `total_query_duration_ms` only grow.
/// - `end_ms` and `total_duration_ms` are set together by `end_request`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetrics {
    /// Number of commands recorded under the request.
    pub query_count: u64,
    /// Cumulative command duration in milliseconds.
    pub total_query_duration_ms: f64,
    /// Unix epoch milliseconds when the request started.
    pub start_ms: i64,
    /// Unix epoch milliseconds when the request ended.
    pub end_ms: Option<i64>,
    /// Wall-clock request duration in milliseconds.
    pub total_duration_ms: Option<i64>,
    /// Memory delta observed across the request, in bytes.
    pub memory_delta_bytes: u64,
}

impl RequestMetrics {
    /// Creates zeroed metrics starting at `start_ms`.
    #[must_use]
    pub const fn started_at(start_ms: i64) -> Self {
        Self {
            query_count: 0,
            total_query_duration_ms: 0.0,
            start_ms,
            end_ms: None,
            total_duration_ms: None,
            memory_delta_bytes: 0,
        }
    }
}

/// Entry as held by the store; the plan slot is filled in after insertion.
#[derive(Debug)]
struct StoredEntry {
    /// Immutable command record (its plan field is ignored).
    entry: QueryLogEntry,
    /// Plan attached after insertion.
    plan: Mutex<Option<String>>,
}

impl StoredEntry {
    /// Wraps an entry, moving any pre-set plan into the mutable slot.
    fn new(mut entry: QueryLogEntry) -> Self {
        let plan = entry.execution_plan.take();
        Self {
            entry,
            plan: Mutex::new(plan),
        }
    }

    /// Returns an owned copy including the current plan.
    fn snapshot(&self) -> QueryLogEntry {
        let mut entry = self.entry.clone();
        entry.execution_plan = lock(&self.plan).clone();
        entry
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// In-memory, process-lifetime store for intercepted commands.
#[derive(Debug)]
pub struct QueryLogStore {
    /// Ordered entries per request.
    logs: DashMap<RequestId, Vec<Arc<StoredEntry>>>,
    /// Aggregate metrics per request.
    metrics: DashMap<RequestId, RequestMetrics>,
    /// Most recent entries across all requests, oldest first.
    recent: Mutex<VecDeque<Arc<StoredEntry>>>,
    /// Ring buffer capacity.
    capacity: usize,
}

impl Default for QueryLogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryLogStore {
    /// Creates a store with the default ring capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RECENT_CAPACITY)
    }

    /// Creates a store with an explicit ring capacity (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            logs: DashMap::new(),
            metrics: DashMap::new(),
            recent: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Returns the ring buffer capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Starts (or restarts) metrics for a request.
    pub fn start_request(&self, id: &RequestId) {
        self.metrics.insert(id.clone(), RequestMetrics::started_at(unix_millis_now()));
    }

    /// Stamps the end time and total duration of a known request.
    pub fn end_request(&self, id: &RequestId) {
        if let Some(mut metrics) = self.metrics.get_mut(id) {
            let end_ms = unix_millis_now().max(metrics.start_ms);
            metrics.end_ms = Some(end_ms);
            metrics.total_duration_ms = Some(end_ms - metrics.start_ms);
        }
    }

    /// Records the memory delta observed for a known request.
    pub fn record_memory_delta(&self, id: &RequestId, bytes: u64) {
        if let Some(mut metrics) = self.metrics.get_mut(id) {
            metrics.memory_delta_bytes = bytes;
        }
    }

    /// Records an entry under the current request, if any, and in the ring.
    pub fn add_query(&self, mut entry: QueryLogEntry) {
        let current = RequestContext::current();
        entry.request_id.clone_from(&current);
        let duration_ms = entry.duration_ms;
        let stored = Arc::new(StoredEntry::new(entry));
        if let Some(id) = current {
            self.logs.entry(id.clone()).or_default().push(Arc::clone(&stored));
            if let Some(mut metrics) = self.metrics.get_mut(&id) {
                metrics.query_count += 1;
                metrics.total_query_duration_ms += duration_ms;
            }
        }
        let mut recent = lock(&self.recent);
        recent.push_back(stored);
        while recent.len() > self.capacity {
            recent.pop_front();
        }
    }

    /// Attaches a plan to the last entry of the current request's log.
    ///
    /// Two commands of the same request completing concurrently may attach
    /// their plans to each other's entries; requests issue commands one at a
    /// time.
    pub fn set_last_execution_plan(&self, plan: impl Into<String>) {
        let Some(id) = RequestContext::current() else {
            return;
        };
        let last = self.logs.get(&id).and_then(|log| log.last().cloned());
        if let Some(entry) = last {
            *lock(&entry.plan) = Some(plan.into());
        }
    }

    /// Returns a copy of a request's log in recording order.
    #[must_use]
    pub fn get_queries_for_request(&self, id: &RequestId) -> Vec<QueryLogEntry> {
        self.logs
            .get(id)
            .map(|log| log.value().iter().map(|entry| entry.snapshot()).collect())
            .unwrap_or_default()
    }

    /// Returns the newest `count` entries across all requests, oldest first.
    #[must_use]
    pub fn get_recent_queries(&self, count: usize) -> Vec<QueryLogEntry> {
        let held: Vec<Arc<StoredEntry>> = {
            let recent = lock(&self.recent);
            let skip = recent.len().saturating_sub(count);
            recent.iter().skip(skip).cloned().collect()
        };
        held.iter().map(|entry| entry.snapshot()).collect()
    }

    /// Returns a copy of a request's metrics.
    #[must_use]
    pub fn get_metrics_for_request(&self, id: &RequestId) -> Option<RequestMetrics> {
        self.metrics.get(id).map(|metrics| metrics.value().clone())
    }

    /// Returns the ids of all requests with metrics, sorted.
    #[must_use]
    pub fn request_ids(&self) -> Vec<RequestId> {
        let mut ids: Vec<RequestId> = self.metrics.iter().map(|item| item.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Returns the number of entries currently held by the ring buffer.
    #[must_use]
    pub fn recent_len(&self) -> usize {
        lock(&self.recent).len()
    }

    /// Removes all logs, metrics, and recent entries.
    pub fn clear(&self) {
        self.logs.clear();
        self.metrics.clear();
        lock(&self.recent).clear();
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the current unix time in milliseconds.
#[must_use]
pub fn unix_millis_now() -> i64 {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    i64::try_from(millis).unwrap_or(i64::MAX)
}

/// Locks telemetry state, recovering the value if a writer panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
