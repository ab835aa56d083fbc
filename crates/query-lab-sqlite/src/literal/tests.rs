// crates/query-lab-sqlite/src/literal/tests.rs
// ============================================================================
// Module: SQL Literal Tests
// Description: Unit tests for literal rendering and placeholder inlining.
// Purpose: Validate quoting rules and exact-token substitution.
// Dependencies: query-lab-sqlite, proptest, time
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use proptest::prelude::*;
use query_lab_core::ParamValue;
use query_lab_core::QueryParams;
use time::macros::datetime;

use super::inline_parameters;
use super::sql_literal;

// ============================================================================
// SECTION: Literal Rules
// ============================================================================

#[test]
fn text_is_single_quoted_with_doubled_quotes() {
    assert_eq!(sql_literal(&ParamValue::from("O'Brien")), "'O''Brien'");
    assert_eq!(sql_literal(&ParamValue::from("")), "''");
}

#[test]
fn scalars_follow_sqlite_literal_rules() {
    assert_eq!(sql_literal(&ParamValue::Null), "NULL");
    assert_eq!(sql_literal(&ParamValue::from(true)), "1");
    assert_eq!(sql_literal(&ParamValue::from(false)), "0");
    assert_eq!(sql_literal(&ParamValue::from(-42_i64)), "-42");
    assert_eq!(sql_literal(&ParamValue::from(1.5)), "1.5");
    assert_eq!(sql_literal(&ParamValue::from(3.0)), "3.0");
    assert_eq!(sql_literal(&ParamValue::from(f64::NAN)), "NULL");
    assert_eq!(sql_literal(&ParamValue::from(f64::INFINITY)), "NULL");
    assert_eq!(sql_literal(&ParamValue::from(vec![0xde_u8, 0xad])), "X'dead'");
    assert_eq!(sql_literal(&ParamValue::from(None::<i64>)), "NULL");
}

#[test]
fn timestamps_are_quoted_rfc3339() {
    let value = ParamValue::from(datetime!(2024-03-01 12:30:00 UTC));
    assert_eq!(sql_literal(&value), "'2024-03-01T12:30:00Z'");
}

// ============================================================================
// SECTION: Inlining
// ============================================================================

#[test]
fn similar_names_are_substituted_independently() {
    let params = QueryParams::new().with("@id", 7_i64).with("@identifier", "abc");
    let sql = "SELECT * FROM t WHERE id = @id AND identifier = @identifier";
    assert_eq!(
        inline_parameters(sql, &params),
        "SELECT * FROM t WHERE id = 7 AND identifier = 'abc'"
    );

    let only_short = QueryParams::new().with("@id", 7_i64);
    assert_eq!(
        inline_parameters(sql, &only_short),
        "SELECT * FROM t WHERE id = 7 AND identifier = @identifier"
    );
}

#[test]
fn all_sigils_are_recognized() {
    let params = QueryParams::new().with(":a", 1_i64).with("$b", 2_i64).with("@c", 3_i64);
    assert_eq!(inline_parameters("SELECT :a, $b, @c", &params), "SELECT 1, 2, 3");
}

#[test]
fn quoted_text_and_comments_are_untouched() {
    let params = QueryParams::new().with("@id", 1_i64);
    let sql = "SELECT '@id', \"@id\", [@id] -- @id\n, @id /* @id */";
    assert_eq!(inline_parameters(sql, &params), "SELECT '@id', \"@id\", [@id] -- @id\n, 1 /* @id */");
}

#[test]
fn doubled_quotes_inside_literals_do_not_end_the_literal() {
    let params = QueryParams::new().with("@x", 5_i64);
    let sql = "SELECT 'it''s @x', @x";
    assert_eq!(inline_parameters(sql, &params), "SELECT 'it''s @x', 5");
}

#[test]
fn lone_sigils_and_unclosed_literals_are_copied() {
    let params = QueryParams::new().with("@x", 5_i64);
    assert_eq!(inline_parameters("SELECT @ + @x", &params), "SELECT @ + 5");
    assert_eq!(inline_parameters("SELECT '@x", &params), "SELECT '@x");
}

#[test]
fn injected_text_stays_inside_its_literal() {
    let params = QueryParams::new().with("@name", "x'; DROP TABLE t; --");
    assert_eq!(
        inline_parameters("SELECT * FROM t WHERE name = @name", &params),
        "SELECT * FROM t WHERE name = 'x''; DROP TABLE t; --'"
    );
}

#[test]
fn negative_numbers_after_minus_do_not_open_a_comment() {
    let params = QueryParams::new().with("@delta", -3_i64).with("@r", -1.5);
    let sql = "SELECT 10 -@delta, 2 -@r FROM t WHERE x = 1";
    let inlined = inline_parameters(sql, &params);
    assert!(!inlined.contains("--"));
    assert_eq!(inlined, "SELECT 10 - -3, 2 - -1.5 FROM t WHERE x = 1");
    assert_eq!(inline_parameters("SELECT 10 - @delta", &params), "SELECT 10 - -3");
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #[test]
    fn suffixed_tokens_are_never_touched(
        base in "[a-z]{1,8}",
        suffix in "[a-z0-9_]{1,8}",
        value in any::<i64>(),
    ) {
        let short = format!("@{base}");
        let long = format!("@{base}{suffix}");
        let params = QueryParams::new().with(&short, value);
        let sql = format!("SELECT {long}, {short}");
        prop_assert_eq!(inline_parameters(&sql, &params), format!("SELECT {long}, {value}"));
    }
}
