// crates/query-lab-cli/src/lib.rs
// ============================================================================
// Module: Query Lab CLI Library
// Description: Demo workload shared by the CLI binary and its tests.
// Purpose: Wire config, store, interceptor, and executor into a runnable lab.
// Dependencies: query-lab-config, query-lab-core, query-lab-sqlite
// ============================================================================

//! ## Overview
//! [`lab::Lab`] assembles the telemetry pipeline from a
//! [`query_lab_config::LabConfig`] and runs the `orders-with-customers`
//! scenario in its `n-plus-one` and `join` variants.

pub mod lab;
