// crates/query-lab-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example query-lab.toml.
// Purpose: Keep documentation and tests on one validated document.
// Dependencies: none
// ============================================================================

//! ## Overview
//! The example document parses and validates; tests load it through
//! [`crate::LabConfig::from_toml_str`].

/// Returns a complete example `query-lab.toml` using every section.
#[must_use]
pub const fn config_toml_example() -> &'static str {
    r#"# Query Lab configuration

[database]
# Passed to SQLite with URI open flags; plain paths work too.
url = "file:query-lab.db"
busy_timeout_ms = 5000
# Plan capture opens its own connection; defaults to `url`.
plan_capture_url = "file:query-lab.db"

[telemetry]
recent_capacity = 1000
capture_plans = false

[telemetry.diagnostics]
sink = "stderr"
"#
}
