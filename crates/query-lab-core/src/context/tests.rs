// crates/query-lab-core/src/context/tests.rs
// ============================================================================
// Module: Request Context Tests
// Description: Unit tests for task-scoped request id propagation.
// Purpose: Validate visibility across awaits and isolation across tasks.
// Dependencies: query-lab-core, tokio
// ============================================================================

//! ## Overview
//! Exercises the request context across suspension points, forked tasks, and
//! concurrently running unrelated requests.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use std::time::Duration;

use super::RequestContext;
use crate::identifiers::RequestId;

#[test]
fn current_is_none_outside_scope() {
    assert!(RequestContext::current().is_none());
}

#[test]
fn sync_scope_publishes_id() {
    let seen = RequestContext::sync_scope(RequestId::from("sync"), RequestContext::current);
    assert_eq!(seen, Some(RequestId::from("sync")));
    assert!(RequestContext::current().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn id_survives_suspension_points() {
    let id = RequestId::from("r-await");
    let seen = RequestContext::scope(id.clone(), async {
        let mut seen = Vec::new();
        for _ in 0 .. 5 {
            tokio::time::sleep(Duration::from_millis(1)).await;
            tokio::task::yield_now().await;
            seen.push(RequestContext::current());
        }
        seen
    })
    .await;
    assert!(seen.iter().all(|value| value.as_ref() == Some(&id)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_do_not_leak() {
    let mut handles = Vec::new();
    for index in 0 .. 16 {
        handles.push(tokio::spawn(async move {
            let id = RequestId::new(format!("r-{index}"));
            RequestContext::scope(id.clone(), async move {
                for _ in 0 .. 10 {
                    tokio::task::yield_now().await;
                    assert_eq!(RequestContext::current(), Some(id.clone()));
                }
            })
            .await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn spawn_copies_id_into_child() {
    let child = RequestContext::scope(RequestId::from("parent"), async {
        RequestContext::spawn(async { RequestContext::current() }).await.unwrap()
    })
    .await;
    assert_eq!(child, Some(RequestId::from("parent")));
}

#[tokio::test(flavor = "multi_thread")]
async fn plain_spawn_does_not_inherit() {
    let child = RequestContext::scope(RequestId::from("parent"), async {
        tokio::spawn(async { RequestContext::current() }).await.unwrap()
    })
    .await;
    assert!(child.is_none());
}
