//! Limit and fail-closed validation tests for query-lab-config.
// crates/query-lab-config/tests/limits_validation.rs
// =============================================================================
// Module: Limits Validation Tests
// Description: Validate range checks, size limits, and parse failures.
// Purpose: Ensure invalid configuration fails closed.
// =============================================================================

use query_lab_config::LabConfig;

mod common;

use common::TestResult;

#[test]
fn recent_capacity_zero_rejected() -> TestResult {
    common::assert_invalid(
        LabConfig::from_toml_str("[telemetry]\nrecent_capacity = 0\n"),
        "telemetry.recent_capacity out of range",
    )
}

#[test]
fn recent_capacity_above_max_rejected() -> TestResult {
    common::assert_invalid(
        LabConfig::from_toml_str("[telemetry]\nrecent_capacity = 100001\n"),
        "telemetry.recent_capacity out of range",
    )
}

#[test]
fn recent_capacity_at_max_accepted() -> TestResult {
    LabConfig::from_toml_str("[telemetry]\nrecent_capacity = 100000\n")
        .map(|_| ())
        .map_err(|err| err.to_string())
}

#[test]
fn file_sink_requires_path() -> TestResult {
    common::assert_invalid(
        LabConfig::from_toml_str("[telemetry.diagnostics]\nsink = \"file\"\n"),
        "telemetry.diagnostics.path is required",
    )
}

#[test]
fn empty_database_url_rejected() -> TestResult {
    common::assert_invalid(
        LabConfig::from_toml_str("[database]\nurl = \"\"\n"),
        "database.url must not be empty",
    )
}

#[test]
fn busy_timeout_above_max_rejected() -> TestResult {
    common::assert_invalid(
        LabConfig::from_toml_str("[database]\nbusy_timeout_ms = 600000\n"),
        "busy_timeout_ms out of range",
    )
}

#[test]
fn unknown_sections_rejected() -> TestResult {
    common::assert_invalid(LabConfig::from_toml_str("[server]\nbind = \"x\"\n"), "config parse error")
}

#[test]
fn misspelled_database_keys_rejected() -> TestResult {
    common::assert_invalid(
        LabConfig::from_toml_str("[database]\nbusy_timout_ms = 100\n"),
        "config parse error",
    )
}

#[test]
fn unknown_sink_rejected() -> TestResult {
    common::assert_invalid(
        LabConfig::from_toml_str("[telemetry.diagnostics]\nsink = \"syslog\"\n"),
        "config parse error",
    )
}

#[test]
fn oversized_file_rejected() -> TestResult {
    let mut content = b"# padding\n".to_vec();
    content.resize(1024 * 1024 + 1, b'#');
    let (_dir, path) = common::write_config(&content)?;
    common::assert_invalid(LabConfig::load(Some(path.as_path())), "exceeds size limit")
}

#[test]
fn non_utf8_file_rejected() -> TestResult {
    let (_dir, path) = common::write_config(&[0x5b, 0xff, 0xfe, 0x5d])?;
    common::assert_invalid(LabConfig::load(Some(path.as_path())), "must be utf-8")
}

#[test]
fn overlong_path_component_rejected() -> TestResult {
    let path = std::path::PathBuf::from(format!("./{}.toml", "a".repeat(300)));
    common::assert_invalid(LabConfig::load(Some(path.as_path())), "path component too long")
}
