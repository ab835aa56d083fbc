// crates/query-lab-sqlite/src/literal.rs
// ============================================================================
// Module: SQL Literal Inlining
// Description: Renders bound parameter values as SQL literals.
// Purpose: Replay a command under plan-only evaluation without bind calls.
// Dependencies: query-lab-core
// ============================================================================

//! ## Overview
//! Plan capture replays command text that cannot be bound, so each
//! placeholder is replaced by a literal of its runtime value. A placeholder
//! is replaced only when its whole token names a bound parameter: `@id` never
//! matches inside `@identifier`. String literals, quoted identifiers, and
//! comments are copied verbatim.

use query_lab_core::ParamValue;
use query_lab_core::QueryParams;
use query_lab_core::params::PARAMETER_SIGILS;

// ============================================================================
// SECTION: Literals
// ============================================================================

/// Renders a parameter value as a `SQLite` literal.
#[must_use]
pub fn sql_literal(value: &ParamValue) -> String {
    match value {
        ParamValue::Null => "NULL".to_string(),
        ParamValue::Bool(value) => if *value { "1" } else { "0" }.to_string(),
        ParamValue::Integer(value) => value.to_string(),
        ParamValue::Real(value) if !value.is_finite() => "NULL".to_string(),
        ParamValue::Real(value) => real_literal(*value),
        ParamValue::Text(value) => quote_text(value),
        ParamValue::Timestamp(value) => quote_text(&ParamValue::format_timestamp(*value)),
        ParamValue::Blob(bytes) => format!("X'{}'", ParamValue::format_hex(bytes)),
    }
}

/// Formats a finite real so it always parses back as a real.
fn real_literal(value: f64) -> String {
    let text = value.to_string();
    if text.contains(['.', 'e', 'E']) { text } else { format!("{text}.0") }
}

/// Single-quotes text, doubling embedded quotes.
fn quote_text(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

// ============================================================================
// SECTION: Inlining
// ============================================================================

/// Replaces bound placeholders in `sql` with literals.
///
/// Placeholders without a bound value are left as written.
#[must_use]
pub fn inline_parameters(sql: &str, params: &QueryParams) -> String {
    if params.is_empty() {
        return sql.to_string();
    }
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.char_indices().peekable();
    while let Some((start, ch)) = chars.next() {
        match ch {
            '\'' | '"' | '`' => {
                let end = skip_until(sql, start + ch.len_utf8(), ch);
                out.push_str(&sql[start .. end]);
                advance_to(&mut chars, end);
            }
            '[' => {
                let end = skip_until(sql, start + 1, ']');
                out.push_str(&sql[start .. end]);
                advance_to(&mut chars, end);
            }
            '-' if sql[start ..].starts_with("--") => {
                let end = sql[start ..].find('\n').map_or(sql.len(), |offset| start + offset);
                out.push_str(&sql[start .. end]);
                advance_to(&mut chars, end);
            }
            '/' if sql[start ..].starts_with("/*") => {
                let end =
                    sql[start + 2 ..].find("*/").map_or(sql.len(), |offset| start + 2 + offset + 2);
                out.push_str(&sql[start .. end]);
                advance_to(&mut chars, end);
            }
            sigil if PARAMETER_SIGILS.contains(&sigil) => {
                let name_start = start + sigil.len_utf8();
                let name_end = sql[name_start ..]
                    .char_indices()
                    .find(|(_, c)| !is_identifier_char(*c))
                    .map_or(sql.len(), |(offset, _)| name_start + offset);
                let token = &sql[start .. name_end];
                match params.get(token) {
                    Some(value) if name_end > name_start => {
                        push_literal(&mut out, &sql_literal(value));
                    }
                    _ => out.push_str(token),
                }
                advance_to(&mut chars, name_end);
            }
            other => out.push(other),
        }
    }
    out
}

/// Appends a literal, keeping a leading `-` from fusing into a `--` comment.
fn push_literal(out: &mut String, literal: &str) {
    if literal.starts_with('-') && out.ends_with('-') {
        out.push(' ');
    }
    out.push_str(literal);
}

/// Returns the byte offset just past the closing `delimiter`, or the end.
fn skip_until(sql: &str, from: usize, delimiter: char) -> usize {
    sql[from ..].find(delimiter).map_or(sql.len(), |offset| from + offset + delimiter.len_utf8())
}

/// Consumes characters until the iterator reaches byte offset `end`.
fn advance_to(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>, end: usize) {
    while chars.peek().is_some_and(|(index, _)| *index < end) {
        chars.next();
    }
}

/// Returns true for characters that continue a placeholder name.
fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests;
