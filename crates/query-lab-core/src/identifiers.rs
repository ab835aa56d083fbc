// crates/query-lab-core/src/identifiers.rs
// ============================================================================
// Module: Query Lab Identifiers
// Description: Opaque identifiers for requests, scenarios, and variants.
// Purpose: Provide strongly typed, serializable IDs plus a request id minter.
// Dependencies: rand, serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque strings that serialize transparently. A
//! [`RequestId`] groups every database command issued on behalf of one
//! scenario execution. Request ids are minted by [`RequestIdGenerator`] from a
//! boot-scoped random seed plus a monotonic counter, so they are unique for
//! the lifetime of the process and never reused.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use rand::RngCore;
use rand::rngs::OsRng;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Correlation token for one logical request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Creates a new request identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Scenario name echoed in scenario responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioName(String);

impl ScenarioName {
    /// Creates a new scenario name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScenarioName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ScenarioName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ScenarioName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Variant name (for example `n-plus-one` or `join`) within a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantName(String);

impl VariantName {
    /// Creates a new variant name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for VariantName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for VariantName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Request Id Generator
// ============================================================================

/// Default prefix for minted request ids.
pub const DEFAULT_REQUEST_ID_PREFIX: &str = "req";

/// Boot-scoped request id generator.
///
/// # Invariants
/// - Issued identifiers are unique within the process lifetime.
#[derive(Debug)]
pub struct RequestIdGenerator {
    /// Prefix included in every generated id.
    prefix: &'static str,
    /// Boot-scoped random identifier for entropy.
    boot_id: u64,
    /// Monotonic counter for ids issued in this process.
    counter: AtomicU64,
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_ID_PREFIX)
    }
}

impl RequestIdGenerator {
    /// Creates a new generator with the given prefix.
    #[must_use]
    pub fn new(prefix: &'static str) -> Self {
        let mut bytes = [0u8; 8];
        OsRng.fill_bytes(&mut bytes);
        Self {
            prefix,
            boot_id: u64::from_be_bytes(bytes),
            counter: AtomicU64::new(1),
        }
    }

    /// Issues a new request id.
    #[must_use]
    pub fn issue(&self) -> RequestId {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        RequestId::new(format!("{}-{:016x}-{:016x}", self.prefix, self.boot_id, seq))
    }
}
