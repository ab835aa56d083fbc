// crates/query-lab-cli/tests/demo_lab.rs
// ============================================================================
// Module: Demo Lab Tests
// Description: End-to-end runs of the orders-with-customers scenario.
// Purpose: Ensure both variants agree on rows and differ in query telemetry.
// Dependencies: query-lab-cli, query-lab-config, query-lab-core, tempfile, tokio
// ============================================================================

//! ## Overview
//! Runs the lab against a temp-file database the way `query-lab run` does.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;

use query_lab_cli::lab::Lab;
use query_lab_cli::lab::VARIANT_JOIN;
use query_lab_cli::lab::VARIANT_N_PLUS_ONE;
use query_lab_config::LabConfig;
use query_lab_core::MemoryDiagnosticSink;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

async fn seeded_lab(recent_capacity: usize) -> (TempDir, Lab, Arc<MemoryDiagnosticSink>) {
    let dir = TempDir::new().unwrap();
    let url = dir.path().join("demo.db").to_string_lossy().into_owned();
    let config = LabConfig::from_toml_str(&format!(
        "[database]\nurl = \"{url}\"\n\n[telemetry]\nrecent_capacity = {recent_capacity}\n"
    ))
    .unwrap();
    let sink = Arc::new(MemoryDiagnosticSink::new());
    let lab = Lab::open(&config, sink.clone()).unwrap();
    lab.seed().await.unwrap();
    (dir, lab, sink)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn variants_agree_on_rows_but_not_on_query_count() {
    let (_dir, lab, _) = seeded_lab(1_000).await;
    let report = lab.run(false, None).await.unwrap();
    assert_eq!(report.scenarios.len(), 2);

    let n_plus_one = &report.scenarios[0];
    let join = &report.scenarios[1];
    assert_eq!(n_plus_one.variant.as_str(), VARIANT_N_PLUS_ONE);
    assert_eq!(join.variant.as_str(), VARIANT_JOIN);
    assert_eq!(n_plus_one.result, join.result);
    assert_eq!(n_plus_one.metrics.rows_returned, 5);
    assert_eq!(n_plus_one.metrics.query_count, 6);
    assert_eq!(join.metrics.query_count, 1);
    assert_ne!(n_plus_one.request_id, join.request_id);
    assert!(report.recent_queries.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn plan_flag_attaches_plans_to_every_command() {
    let (_dir, lab, sink) = seeded_lab(1_000).await;
    let report = lab.run(true, None).await.unwrap();
    for scenario in &report.scenarios {
        for query in &scenario.queries {
            let plan = query.execution_plan.as_deref().unwrap();
            assert!(plan.starts_with("QUERY PLAN"));
        }
    }
    assert!(sink.events_named("plan_capture_failed").is_empty());
    assert_eq!(sink.events_named("request_finished").len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn recent_queries_respect_the_configured_ring() {
    let (_dir, lab, _) = seeded_lab(4).await;
    let report = lab.run(false, Some(10)).await.unwrap();
    let recent = report.recent_queries.unwrap();
    assert_eq!(recent.len(), 4);
    assert!(recent.last().unwrap().sql.contains("JOIN"));

    let json = serde_json::to_value(&lab.run(false, None).await.unwrap()).unwrap();
    assert!(json.get("recentQueries").is_none());
    assert_eq!(json["scenarios"][1]["metrics"]["queryCount"], 1);
}
