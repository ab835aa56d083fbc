// crates/query-lab-core/src/params.rs
// ============================================================================
// Module: Query Parameters
// Description: Typed parameter values bound to database commands.
// Purpose: Carry runtime parameter values into logs and plan capture.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! [`ParamValue`] is the closed set of runtime values a command can bind.
//! [`QueryParams`] keeps parameters in bind order. Names carry their
//! placeholder sigil (`@id`); a bare name is normalized to `@name` so that log
//! entries and plan-capture inlining always see the token as written in SQL.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use serde::Serializer;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Placeholder sigils recognized in command text.
pub const PARAMETER_SIGILS: [char; 3] = ['@', ':', '$'];

/// Sigil prepended to bare parameter names.
pub const DEFAULT_PARAMETER_SIGIL: char = '@';

// ============================================================================
// SECTION: Values
// ============================================================================

/// Runtime value bound to a command parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// SQL null.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Integer(i64),
    /// Floating point value.
    Real(f64),
    /// Text value.
    Text(String),
    /// Point in time with offset.
    Timestamp(OffsetDateTime),
    /// Raw bytes.
    Blob(Vec<u8>),
}

impl ParamValue {
    /// Formats a timestamp as RFC 3339, falling back to unix seconds.
    #[must_use]
    pub fn format_timestamp(value: OffsetDateTime) -> String {
        value.format(&Rfc3339).unwrap_or_else(|_| value.unix_timestamp().to_string())
    }

    /// Formats bytes as lowercase hex.
    #[must_use]
    pub fn format_hex(bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len() * 2);
        for byte in bytes {
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

impl Serialize for ParamValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Integer(value) => serializer.serialize_i64(*value),
            Self::Real(value) => serializer.serialize_f64(*value),
            Self::Text(value) => serializer.serialize_str(value),
            Self::Timestamp(value) => serializer.serialize_str(&Self::format_timestamp(*value)),
            Self::Blob(bytes) => serializer.serialize_str(&Self::format_hex(bytes)),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<OffsetDateTime> for ParamValue {
    fn from(value: OffsetDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Vec<u8>> for ParamValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

impl<T> From<Option<T>> for ParamValue
where
    T: Into<Self>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

// ============================================================================
// SECTION: Parameter Collections
// ============================================================================

/// Ordered collection of named command parameters.
///
/// # Invariants
/// - Every name starts with one of [`PARAMETER_SIGILS`].
/// - Names are unique; re-binding a name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    /// Parameters in bind order.
    entries: Vec<(String, ParamValue)>,
}

impl QueryParams {
    /// Creates an empty parameter collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Binds a parameter, returning the updated collection.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.bind(name, value);
        self
    }

    /// Binds a parameter in place.
    pub fn bind(&mut self, name: &str, value: impl Into<ParamValue>) {
        let name = normalize_name(name);
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Returns the value bound to the full placeholder token, if any.
    #[must_use]
    pub fn get(&self, token: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(name, _)| name == token).map(|(_, value)| value)
    }

    /// Iterates parameters in bind order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of bound parameters.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no parameters are bound.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the name to value mapping recorded in query logs.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, ParamValue> {
        self.entries.iter().cloned().collect()
    }
}

/// Prefixes a bare parameter name with the default sigil.
fn normalize_name(name: &str) -> String {
    if name.starts_with(PARAMETER_SIGILS) {
        name.to_string()
    } else {
        format!("{DEFAULT_PARAMETER_SIGIL}{name}")
    }
}

#[cfg(test)]
mod tests;
