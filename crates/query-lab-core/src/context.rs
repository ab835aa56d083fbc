// crates/query-lab-core/src/context.rs
// ============================================================================
// Module: Request Context Tracker
// Description: Task-scoped visibility of the current request id.
// Purpose: Attribute database commands to requests without parameter threading.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! The current [`RequestId`] is held in a tokio task-local cell. A future run
//! through [`RequestContext::scope`] sees the id at every `.await`
//! continuation, whichever worker thread resumes it. Concurrently running,
//! unrelated tasks each see their own value (or none).
//!
//! Plain `tokio::spawn` does not inherit task-locals. Forked work that should
//! stay attributed to the request goes through [`RequestContext::spawn`],
//! which copies the caller's id into the child task.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;

use tokio::task::JoinHandle;

use crate::identifiers::RequestId;

// ============================================================================
// SECTION: Task-Local Cell
// ============================================================================

tokio::task_local! {
    /// Request id visible to the current task chain.
    static CURRENT_REQUEST_ID: RequestId;
}

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Accessors for the ambient request id.
pub struct RequestContext;

impl RequestContext {
    /// Returns the request id of the current task chain, if any.
    #[must_use]
    pub fn current() -> Option<RequestId> {
        CURRENT_REQUEST_ID.try_with(Clone::clone).ok()
    }

    /// Runs `future` with `id` published as the current request id.
    pub async fn scope<F>(id: RequestId, future: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_REQUEST_ID.scope(id, future).await
    }

    /// Runs a synchronous closure with `id` published as the current request id.
    pub fn sync_scope<F, R>(id: RequestId, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        CURRENT_REQUEST_ID.sync_scope(id, f)
    }

    /// Spawns a task that inherits the caller's request id.
    ///
    /// Outside any request scope the child runs without an id.
    pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        match Self::current() {
            Some(id) => tokio::spawn(CURRENT_REQUEST_ID.scope(id, future)),
            None => tokio::spawn(future),
        }
    }
}

#[cfg(test)]
mod tests;
