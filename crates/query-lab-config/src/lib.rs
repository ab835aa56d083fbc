// crates/query-lab-config/src/lib.rs
// ============================================================================
// Module: Query Lab Config Library
// Description: Config model, loading, and validation.
// Purpose: Single source of truth for query-lab.toml semantics.
// Dependencies: query-lab-core, query-lab-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `query-lab-config` loads `query-lab.toml` with strict size and path limits
//! and validates it fail-closed. A canonical example document is provided for
//! docs and tests.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
