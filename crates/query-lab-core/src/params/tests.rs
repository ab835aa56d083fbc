// crates/query-lab-core/src/params/tests.rs
// ============================================================================
// Module: Query Parameter Tests
// Description: Unit tests for parameter normalization and serialization.
// Purpose: Validate sigil handling and JSON shapes recorded in logs.
// Dependencies: query-lab-core, serde_json, time
// ============================================================================

//! ## Overview
//! Covers name normalization, rebinding, and the JSON rendering of each value
//! kind as it appears in query log snapshots.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use serde_json::json;
use time::OffsetDateTime;

use super::ParamValue;
use super::QueryParams;

#[test]
fn bare_names_get_default_sigil() {
    let params = QueryParams::new().with("id", 1).with(":name", "x").with("$flag", true);
    let names: Vec<&str> = params.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["@id", ":name", "$flag"]);
}

#[test]
fn rebinding_replaces_value_in_place() {
    let mut params = QueryParams::new().with("@a", 1).with("@b", 2);
    params.bind("a", 3);
    assert_eq!(params.len(), 2);
    assert_eq!(params.get("@a"), Some(&ParamValue::Integer(3)));
    assert_eq!(params.iter().next().map(|(name, _)| name), Some("@a"));
}

#[test]
fn values_serialize_to_plain_json() {
    let stamp = OffsetDateTime::from_unix_timestamp(0).unwrap();
    let params = QueryParams::new()
        .with("@n", ParamValue::Null)
        .with("@b", false)
        .with("@i", 42_i64)
        .with("@r", 1.5)
        .with("@t", "o'k")
        .with("@ts", stamp)
        .with("@blob", vec![0x0a_u8, 0xff]);
    let value = serde_json::to_value(params.to_map()).unwrap();
    assert_eq!(
        value,
        json!({
            "@n": null,
            "@b": false,
            "@i": 42,
            "@r": 1.5,
            "@t": "o'k",
            "@ts": "1970-01-01T00:00:00Z",
            "@blob": "0aff",
        })
    );
}

#[test]
fn option_maps_none_to_null() {
    let value: ParamValue = Option::<i64>::None.into();
    assert_eq!(value, ParamValue::Null);
    let value: ParamValue = Some("x").into();
    assert_eq!(value, ParamValue::Text("x".to_string()));
}
