// crates/query-lab-core/src/memory.rs
// ============================================================================
// Module: Memory Probe
// Description: Coarse process memory snapshots for scenario runs.
// Purpose: Measure a before/after memory delta around a unit of work.
// Dependencies: std
// ============================================================================

//! ## Overview
//! [`ProcessMemoryProbe`] reads the resident set size from
//! `/proc/self/status`. Platforms without procfs report zero, which yields a
//! zero delta rather than an error.

use std::fs;

/// Path of the procfs status file for the current process.
const PROC_STATUS_PATH: &str = "/proc/self/status";

/// Source of process memory snapshots.
pub trait MemoryProbe: Send + Sync {
    /// Returns current process memory usage in bytes.
    fn current_bytes(&self) -> u64;
}

/// Resident set size probe backed by procfs.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessMemoryProbe;

impl MemoryProbe for ProcessMemoryProbe {
    fn current_bytes(&self) -> u64 {
        fs::read_to_string(PROC_STATUS_PATH)
            .ok()
            .and_then(|status| parse_vm_rss_bytes(&status))
            .unwrap_or(0)
    }
}

/// Extracts `VmRSS` (reported in kB) from a procfs status document.
#[must_use]
pub fn parse_vm_rss_bytes(status: &str) -> Option<u64> {
    let line = status.lines().find(|line| line.starts_with("VmRSS:"))?;
    let kilobytes: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    kilobytes.checked_mul(1024)
}

/// Returns the non-negative difference between two snapshots.
#[must_use]
pub const fn memory_delta(before: u64, after: u64) -> u64 {
    after.saturating_sub(before)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions use unwrap for clarity.")]

    use super::memory_delta;
    use super::parse_vm_rss_bytes;

    #[test]
    fn parses_vm_rss_in_kilobytes() {
        let status = "Name:\tlab\nVmPeak:\t  9000 kB\nVmRSS:\t  1234 kB\nThreads:\t4\n";
        assert_eq!(parse_vm_rss_bytes(status).unwrap(), 1234 * 1024);
    }

    #[test]
    fn missing_vm_rss_yields_none() {
        assert!(parse_vm_rss_bytes("Name:\tlab\n").is_none());
        assert!(parse_vm_rss_bytes("VmRSS:\tgarbage kB\n").is_none());
    }

    #[test]
    fn delta_is_floored_at_zero() {
        assert_eq!(memory_delta(10, 4), 0);
        assert_eq!(memory_delta(4, 10), 6);
    }
}
